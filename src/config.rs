//! Configuration file for serial-panel.
//!
//! Loaded from `<config dir>/serial-panel/config.toml` (or `--config`):
//!
//! ```toml
//! # Trace log destination (panel mode). Default: <cache dir>/serial-panel/serial-panel.log
//! log_file = "/tmp/serial-panel.log"
//!
//! [session]
//! read_timeout_ms = 100
//! disconnect_on_error = true
//!
//! [panel]
//! log_capacity = 50
//! preferred_port = "/dev/ttyACM0"
//! ```
//!
//! Every key is optional. The baud rate is not configurable.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::logbook::DEFAULT_CAPACITY;
use crate::session::SessionOptions;

const APP_DIR: &str = "serial-panel";
const CONFIG_FILE: &str = "config.toml";
const LOG_FILE: &str = "serial-panel.log";

/// Lower bound for the reader's poll interval.
const MIN_READ_TIMEOUT_MS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_file: Option<PathBuf>,
    pub session: SessionConfig,
    pub panel: PanelConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub read_timeout_ms: u64,
    pub disconnect_on_error: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 100,
            disconnect_on_error: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub log_capacity: usize,
    /// Pre-selected in the port picker when present.
    pub preferred_port: Option<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            log_capacity: DEFAULT_CAPACITY,
            preferred_port: None,
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location.
    ///
    /// A missing file at the default location yields defaults; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `<config dir>/serial-panel/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Configured log file, else `<cache dir>/serial-panel/serial-panel.log`.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.log_file
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join(APP_DIR).join(LOG_FILE)))
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            read_timeout: Duration::from_millis(
                self.session.read_timeout_ms.max(MIN_READ_TIMEOUT_MS),
            ),
            disconnect_on_error: self.session.disconnect_on_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_gives_defaults() {
        let file = write_config("");
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.panel.log_capacity, 50);
        assert!(config.session.disconnect_on_error);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let file = write_config(
            r#"
            [session]
            disconnect_on_error = false

            [panel]
            preferred_port = "/dev/ttyACM0"
            "#,
        );
        let config = Config::load(Some(file.path())).unwrap();
        assert!(!config.session.disconnect_on_error);
        assert_eq!(config.session.read_timeout_ms, 100);
        assert_eq!(config.panel.preferred_port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.panel.log_capacity, 50);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let file = write_config("[session\nread_timeout_ms = ");
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_explicit_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn read_timeout_has_a_floor() {
        let mut config = Config::default();
        config.session.read_timeout_ms = 0;
        assert_eq!(
            config.session_options().read_timeout,
            Duration::from_millis(MIN_READ_TIMEOUT_MS)
        );
    }

    #[test]
    fn explicit_log_file_wins() {
        let config = Config {
            log_file: Some(PathBuf::from("/tmp/panel.log")),
            ..Default::default()
        };
        assert_eq!(config.log_file(), Some(PathBuf::from("/tmp/panel.log")));
    }
}
