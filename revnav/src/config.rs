//! User configuration for revnav.
//!
//! Read from `$XDG_CONFIG_HOME/revnav/config.toml` (or `~/.config/revnav/config.toml`)
//! unless `--config` names another file. Every key is optional:
//!
//! ```toml
//! theme = "catppuccin-mocha"
//! base_url = "/gerrit"
//! history_db = ".revnav/history.db"
//!
//! [log]
//! directory = "/tmp/revnav"
//! filter = "revnav=debug,revnav_core=debug"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Theme name, see [`crate::theme::Theme::from_name`].
    pub theme: String,
    /// Path prefix the review server is served under. Empty for none.
    pub base_url: String,
    pub history_db: PathBuf,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory for `revnav.log`. Logging is off when unset.
    pub directory: Option<PathBuf>,
    /// `EnvFilter` directives, overridden by `REVNAV_LOG`.
    pub filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "catppuccin-mocha".to_owned(),
            base_url: String::new(),
            history_db: PathBuf::from(".revnav").join("history.db"),
            log: LogConfig::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: None,
            filter: "info".to_owned(),
        }
    }
}

/// Returns the path to the default config file.
///
/// Prefers `$XDG_CONFIG_HOME/revnav/config.toml`; falls back to
/// `~/.config/revnav/config.toml` when the env var is absent.
pub fn default_config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("revnav").join("config.toml")
}

impl Config {
    /// Loads the config at `path`, or the default location when `None`.
    ///
    /// A missing file at the default location yields the defaults. A missing file
    /// that was named explicitly is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is not valid TOML.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_config_path(), false),
        };
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        toml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "base_url = \"/gerrit\"\n[log]\nfilter = \"debug\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.base_url, "/gerrit");
        assert_eq!(config.theme, "catppuccin-mocha");
        assert_eq!(config.log.filter, "debug");
        assert_eq!(config.log.directory, None);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn invalid_toml_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "theme = [").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().starts_with("config parse error in"));
    }
}
