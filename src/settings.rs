//! Operator settings loaded from `~/.ruster/settings.yaml`

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{
    CONFIRM_POLL_DELAY, DEFAULT_CONTROL_URL, DEFAULT_LOG_LIMIT, METRICS_MIN_SPACING,
    REQUEST_TIMEOUT, RESTART_TIMEOUT, START_TIMEOUT, STATUS_POLL_INTERVAL, STATUS_TIMEOUT,
    STOP_TIMEOUT,
};
use crate::models::AuthType;
use crate::monitor::MonitorTimings;

const SETTINGS_DIR: &str = ".ruster";
const SETTINGS_FILE: &str = "settings.yaml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the control surface
    pub control_url: String,
    pub poll_interval_ms: u64,
    pub status_timeout_ms: u64,
    pub start_timeout_ms: u64,
    pub stop_timeout_ms: u64,
    pub restart_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub confirm_delay_ms: u64,
    pub metrics_min_spacing_ms: u64,
    pub log_limit: usize,
    /// Credentials for control calls
    pub auth: AuthType,
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            control_url: String::from(DEFAULT_CONTROL_URL),
            poll_interval_ms: millis(STATUS_POLL_INTERVAL),
            status_timeout_ms: millis(STATUS_TIMEOUT),
            start_timeout_ms: millis(START_TIMEOUT),
            stop_timeout_ms: millis(STOP_TIMEOUT),
            restart_timeout_ms: millis(RESTART_TIMEOUT),
            request_timeout_ms: millis(REQUEST_TIMEOUT),
            confirm_delay_ms: millis(CONFIRM_POLL_DELAY),
            metrics_min_spacing_ms: millis(METRICS_MIN_SPACING),
            log_limit: DEFAULT_LOG_LIMIT,
            auth: AuthType::None,
        }
    }
}

impl Settings {
    /// `<home>/.ruster`, or `./.ruster` without a home directory
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(SETTINGS_DIR)
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join(SETTINGS_FILE)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Missing file yields defaults; a malformed one is an error
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        tracing::info!(path = %path.display(), "Settings loaded");
        Ok(settings)
    }

    pub fn timings(&self) -> MonitorTimings {
        MonitorTimings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            status_timeout: Duration::from_millis(self.status_timeout_ms),
            start_timeout: Duration::from_millis(self.start_timeout_ms),
            stop_timeout: Duration::from_millis(self.stop_timeout_ms),
            restart_timeout: Duration::from_millis(self.restart_timeout_ms),
            configuration_timeout: self.request_timeout(),
            confirm_delay: Duration::from_millis(self.confirm_delay_ms),
            metrics_min_spacing: Duration::from_millis(self.metrics_min_spacing_ms),
            log_limit: self.log_limit,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from(&dir.path().join(SETTINGS_FILE)).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.timings(), MonitorTimings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(
            &path,
            "control_url: http://10.0.0.5:7878\npoll_interval_ms: 2000\nauth:\n  type: bearer\n  token: abc\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.control_url, "http://10.0.0.5:7878");
        assert_eq!(settings.timings().poll_interval, Duration::from_secs(2));
        assert_eq!(settings.stop_timeout_ms, 15_000);
        assert_eq!(settings.auth, AuthType::Bearer { token: "abc".into() });
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "poll_interval_ms: [not a number\n").unwrap();
        assert!(Settings::load_from(&path).is_err());
    }
}
