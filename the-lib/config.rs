//! Engine configuration.
//!
//! The built-in defaults live in `paredit.toml` next to this file and are
//! embedded into the binary. User overrides are plain TOML with the same
//! keys; anything left out falls back to the embedded value.
//!
//! ```toml
//! pair-forms = ["let", "loop", "my-let"]
//! ```

use std::sync::OnceLock;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

static DEFAULT_CONFIG: OnceLock<Config> = OnceLock::new();

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
  #[error("failed to parse paredit config: {0}")]
  Parse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
  /// Heads of round lists whose vectors are dragged in pairs.
  pub pair_forms: Vec<String>,
}

/// Shape of the embedded file. Kept apart from [`Config`] so parsing the
/// defaults never asks for the defaults.
#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Embedded {
  pair_forms: Vec<String>,
}

fn load_embedded_config(contents: &str) -> Config {
  match toml::from_str::<Embedded>(contents) {
    Ok(embedded) => {
      Config {
        pair_forms: embedded.pair_forms,
      }
    },
    Err(err) => {
      warn!("Failed to parse embedded paredit config: {err}");
      Config {
        pair_forms: Vec::new(),
      }
    },
  }
}

pub fn default_config() -> &'static Config {
  DEFAULT_CONFIG.get_or_init(|| load_embedded_config(include_str!("paredit.toml")))
}

impl Default for Config {
  fn default() -> Self {
    default_config().clone()
  }
}

impl Config {
  pub fn from_toml(contents: &str) -> Result<Self> {
    Ok(toml::from_str(contents)?)
  }

  pub fn is_pair_form(&self, head: &str) -> bool {
    self.pair_forms.iter().any(|form| form == head)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn embedded_defaults_parse() {
    let config = Config::default();
    assert!(config.is_pair_form("let"));
    assert!(config.is_pair_form("binding"));
    assert!(!config.is_pair_form("defn"));
  }

  #[test]
  fn overrides_replace_pair_forms() {
    let config = Config::from_toml("pair-forms = [\"my-let\"]").unwrap();
    assert!(config.is_pair_form("my-let"));
    assert!(!config.is_pair_form("let"));
  }

  #[test]
  fn missing_keys_use_defaults() {
    let config = Config::from_toml("").unwrap();
    assert_eq!(config, Config::default());
  }

  #[test]
  fn bad_toml_is_an_error() {
    assert!(matches!(
      Config::from_toml("pair-forms = 3"),
      Err(ConfigError::Parse(_))
    ));
    assert!(Config::from_toml("unknown = true").is_err());
  }

  #[test]
  fn broken_embedded_config_falls_back() {
    assert!(load_embedded_config("pair-forms = ").pair_forms.is_empty());
  }
}
