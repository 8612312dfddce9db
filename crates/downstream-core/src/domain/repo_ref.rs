//! Repository identifiers in `owner/name[@branch]` form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// A repository to trigger, optionally pinned to a branch.
///
/// `branch == None` means "the repository's default branch".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
    pub branch: Option<String>,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            branch: None,
        }
    }

    /// Pin this reference to `branch`. An empty branch clears the pin.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        self.branch = if branch.is_empty() { None } else { Some(branch) };
        self
    }

    /// Parse `owner/name` or `owner/name@branch`.
    ///
    /// Tokens without exactly one `/` (or with an empty owner or name) are a
    /// configuration error.
    pub fn parse(token: &str) -> Result<Self, ConfigError> {
        let (owner, name, branch) = split_repo_branch(token);
        if owner.is_empty() || name.is_empty() {
            return Err(ConfigError::InvalidRepository(token.to_string()));
        }
        Ok(Self::new(owner, name).with_branch(branch))
    }

    /// `owner/name` without the branch suffix.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch {
            Some(branch) => write!(f, "{}/{}@{}", self.owner, self.name, branch),
            None => write!(f, "{}/{}", self.owner, self.name),
        }
    }
}

impl FromStr for RepositoryRef {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split a token into `(owner, name, branch)` without validating it.
///
/// A token with anything other than a single `@` keeps its whole text as the
/// repository part; a repository part without exactly one `/` yields empty
/// owner and name.
pub fn split_repo_branch(token: &str) -> (&str, &str, &str) {
    let (repo, branch) = match token.split('@').collect::<Vec<_>>().as_slice() {
        [repo, branch] => (*repo, *branch),
        _ => (token, ""),
    };

    match repo.split('/').collect::<Vec<_>>().as_slice() {
        [owner, name] => (*owner, *name, branch),
        _ => ("", "", branch),
    }
}
