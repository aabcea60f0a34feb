//! Network configuration: JSON file plus environment overrides.
//!
//! Environment variables win over file values:
//!
//! - `FLO_NETWORK_NAME`: network name.
//! - `FLO_NETWORK_DEBUG`: `1`, `true`, `yes` or `on` enables per-signal debug logging.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::instrument;

/// Env var overriding [`NetworkConfig::name`].
pub const ENV_NETWORK_NAME: &str = "FLO_NETWORK_NAME";
/// Env var overriding [`NetworkConfig::debug`].
pub const ENV_NETWORK_DEBUG: &str = "FLO_NETWORK_DEBUG";

/// Default network name.
pub const DEFAULT_NETWORK_NAME: &str = "network";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
  pub name: String,
  /// When set, every connection the network creates logs each signal at
  /// debug level.
  pub debug: bool,
}

impl Default for NetworkConfig {
  fn default() -> Self {
    Self {
      name: DEFAULT_NETWORK_NAME.to_string(),
      debug: false,
    }
  }
}

impl NetworkConfig {
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }

  /// Loads a config from a JSON file. Missing fields take their defaults.
  #[instrument(level = "trace", skip(path))]
  pub fn load(path: &Path) -> Result<Self, std::io::Error> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes)
      .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
  }

  /// Applies overrides from `lookup` (an env-var reader).
  pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(name) = lookup(ENV_NETWORK_NAME).filter(|n| !n.is_empty()) {
      self.name = name;
    }
    if let Some(flag) = lookup(ENV_NETWORK_DEBUG) {
      self.debug = parse_flag(&flag);
    }
    self
  }

  /// Defaults with overrides from the process environment.
  pub fn from_env() -> Self {
    Self::default().with_env_overrides(|key| std::env::var(key).ok())
  }
}

fn parse_flag(value: &str) -> bool {
  matches!(
    value.trim().to_ascii_lowercase().as_str(),
    "1" | "true" | "yes" | "on"
  )
}
