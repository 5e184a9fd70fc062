//! Runtime settings shared by the library and the `globe` CLI.
//!
//! Defaults point at the public REST Countries v2 API and a `globe-rs`
//! directory under the platform data dir (e.g. `~/.local/share/globe-rs`).
//! The CLI overrides each field from flags or `GLOBE_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://restcountries.com/v2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// API base without trailing slash.
    pub base_url: String,
    /// Where the identity store keeps its JSON blobs.
    pub data_dir: PathBuf,
    /// Total request timeout.
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            data_dir: default_data_dir(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Platform data directory joined with `globe-rs`; falls back to `./.globe-rs`
/// when the platform has no notion of one.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("globe-rs"))
        .unwrap_or_else(|| PathBuf::from(".globe-rs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slash() {
        let cfg = Config::default().with_base_url("http://127.0.0.1:8080/v2/");
        assert_eq!(cfg.base_url, "http://127.0.0.1:8080/v2");
    }

    #[test]
    fn defaults_point_at_public_api() {
        let cfg = Config::default();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert!(cfg.data_dir.ends_with("globe-rs") || cfg.data_dir.ends_with(".globe-rs"));
    }
}
