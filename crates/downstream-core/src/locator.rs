//! Turns search results into repository references.

use crate::domain::{ConfigError, RepositoryRef, SearchPage};

/// Builds [`RepositoryRef`]s from search pages, applying an optional branch
/// override to every entry.
///
/// Entries keep the order the search returned them in. Duplicates across
/// pages are kept as-is.
#[derive(Debug, Clone, Default)]
pub struct RepositoryLocator {
    branch_override: Option<String>,
}

impl RepositoryLocator {
    pub fn new(branch_override: Option<String>) -> Self {
        Self {
            branch_override: branch_override.filter(|b| !b.is_empty()),
        }
    }

    pub fn build(&self, page: &SearchPage) -> Result<Vec<RepositoryRef>, ConfigError> {
        page.items
            .iter()
            .map(|full_name| {
                let repo = RepositoryRef::parse(full_name)?;
                Ok(match &self.branch_override {
                    Some(branch) => repo.with_branch(branch.as_str()),
                    None => repo,
                })
            })
            .collect()
    }

    /// Flatten several pages, preserving page order.
    pub fn build_all(&self, pages: &[SearchPage]) -> Result<Vec<RepositoryRef>, ConfigError> {
        let mut repos = Vec::new();
        for page in pages {
            repos.extend(self.build(page)?);
        }
        Ok(repos)
    }
}
