//! Runtime configuration.
//!
//! Loaded from `config.toml` in the user's config directory (or an explicit
//! path). Missing files and missing keys fall back to defaults; a file that
//! exists but does not parse is an error.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SocratesError};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SocratesConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// A `PLAYING` report this far from the scheduler position counts as a
    /// user scrub.
    #[serde(default = "default_seek_threshold_secs")]
    pub seek_threshold_secs: f64,
    #[serde(default = "default_true")]
    pub show_questions: bool,
    #[serde(default = "default_true")]
    pub audio_cue: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for SocratesConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            seek_threshold_secs: default_seek_threshold_secs(),
            show_questions: true,
            audio_cue: true,
            log_level: default_log_level(),
        }
    }
}

impl SocratesConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_seek_threshold_secs() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("socrates").join("config.toml"))
}

pub fn load_config(path: &Path) -> Result<SocratesConfig> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(SocratesConfig::default());
        }
        Err(err) => return Err(err.into()),
    };

    let config: SocratesConfig = toml::from_str(&raw).map_err(|err| SocratesError::Config {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    debug!(path = %path.display(), ?config, "Loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, SocratesConfig::default());
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "settle_delay_ms = 0\nshow_questions = false").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.settle_delay_ms, 0);
        assert!(!config.show_questions);
        assert_eq!(config.seek_threshold_secs, 1.0);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tick_interval_ms = \"fast\"").unwrap();

        assert!(matches!(
            load_config(file.path()),
            Err(SocratesError::Config { .. })
        ));
    }
}
