//! Parameters passed to every triggered build.
//!
//! Three layers are merged in a fixed order, each able to overwrite keys
//! from the layers before it:
//!
//! 1. literal `KEY=VALUE` tokens
//! 2. `KEY=VALUE` files named by the remaining tokens
//! 3. environment variables named in `params_from_env`

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ConfigError;

/// Read access to environment variables.
///
/// The process environment in production; a map in tests.
pub trait EnvLookup: Send + Sync {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// [`EnvLookup`] over the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Key/value parameters for triggered builds. Keys are unique and kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerParams(BTreeMap<String, String>);

impl TriggerParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the literal, file, and environment layers.
    pub fn build(
        tokens: &[String],
        env_keys: &[String],
        env: &dyn EnvLookup,
    ) -> Result<Self, ConfigError> {
        let mut literals = Vec::new();
        let mut files = Vec::new();
        for token in tokens {
            match token.split_once('=') {
                Some((key, value)) => literals.push((key.to_string(), value.to_string())),
                None if Path::new(token).exists() => files.push(token.as_str()),
                None => return Err(ConfigError::InvalidParam(token.clone())),
            }
        }

        let mut params = Self::new();
        for (key, value) in literals {
            params.insert(key, value);
        }
        for path in files {
            params.extend(read_param_file(Path::new(path))?);
        }
        for key in env_keys {
            let value = env
                .lookup(key)
                .ok_or_else(|| ConfigError::MissingEnvParam(key.clone()))?;
            params.insert(key.clone(), value);
        }

        debug!(count = params.len(), "trigger params assembled");
        Ok(params)
    }

    /// Insert a parameter, replacing any previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Extend<(String, String)> for TriggerParams {
    fn extend<I: IntoIterator<Item = (String, String)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<(String, String)> for TriggerParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parse a dotenv-style `KEY=VALUE` file.
fn read_param_file(path: &Path) -> Result<Vec<(String, String)>, ConfigError> {
    let file_error = |reason: String| ConfigError::ParamFile {
        path: path.display().to_string(),
        reason,
    };

    let entries = dotenvy::from_path_iter(path).map_err(|e| file_error(e.to_string()))?;
    entries
        .map(|entry| entry.map_err(|e| file_error(e.to_string())))
        .collect()
}
