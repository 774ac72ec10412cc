use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use dashboard_client::ApiSettings;
use dashboard_logging::{dash_info, dash_warn};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "crawl-dash.ron";
/// Overrides `api_base_url` from the file; `--base-url` wins over it.
pub const BASE_URL_ENV: &str = "CRAWL_DASH_BASE_URL";

/// Settings read from `crawl-dash.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub api_base_url: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub read_retries: u32,
    pub retry_backoff_ms: u64,
    pub max_body_bytes: u64,
    pub poll_interval_ms: u64,
    pub page_size: usize,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8081".to_string(),
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            read_retries: 2,
            retry_backoff_ms: 250,
            max_body_bytes: 5 * 1024 * 1024,
            poll_interval_ms: 5_000,
            page_size: 5,
        }
    }
}

impl DashConfig {
    /// Reads the config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                dash_info!("No config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read config {path:?}"));
            }
        };

        let config: DashConfig =
            ron::from_str(&content).with_context(|| format!("failed to parse config {path:?}"))?;
        dash_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Applies the environment and command-line base URL, in that order.
    pub fn override_base_url(&mut self, from_env: Option<String>, from_cli: Option<String>) {
        let chosen = from_cli
            .filter(|url| !url.trim().is_empty())
            .or_else(|| from_env.filter(|url| !url.trim().is_empty()));
        if let Some(url) = chosen {
            self.api_base_url = url;
        }
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api_base_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            read_retries: self.read_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            max_bytes: self.max_body_bytes,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        if self.poll_interval_ms == 0 {
            dash_warn!("poll_interval_ms of 0 ignored, using 5000");
            return Duration::from_millis(Self::default().poll_interval_ms);
        }
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashConfig::load(&dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config, DashConfig::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(
            &path,
            "(api_base_url: \"http://crawler:9000\", page_size: 10, read_retries: 0)",
        )
        .unwrap();

        let config = DashConfig::load(&path).unwrap();

        assert_eq!(config.api_base_url, "http://crawler:9000");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.read_retries, 0);
        assert_eq!(config.poll_interval_ms, 5_000);
        assert_eq!(config.request_timeout_ms, 30_000);
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "(page_size: \"ten\"").unwrap();

        let err = DashConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn cli_base_url_beats_environment() {
        let mut config = DashConfig::default();
        config.override_base_url(
            Some("http://from-env:1".to_string()),
            Some("http://from-cli:2".to_string()),
        );
        assert_eq!(config.api_base_url, "http://from-cli:2");

        let mut config = DashConfig::default();
        config.override_base_url(Some("http://from-env:1".to_string()), None);
        assert_eq!(config.api_base_url, "http://from-env:1");

        let mut config = DashConfig::default();
        config.override_base_url(Some(String::new()), None);
        assert_eq!(config.api_base_url, "http://localhost:8081");
    }

    #[test]
    fn converts_to_api_settings() {
        let config = DashConfig {
            connect_timeout_ms: 1_500,
            retry_backoff_ms: 10,
            ..DashConfig::default()
        };
        let settings = config.api_settings();
        assert_eq!(settings.connect_timeout, Duration::from_millis(1_500));
        assert_eq!(settings.retry_backoff, Duration::from_millis(10));
        assert_eq!(settings.max_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn zero_poll_interval_falls_back() {
        let config = DashConfig {
            poll_interval_ms: 0,
            ..DashConfig::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
    }
}
