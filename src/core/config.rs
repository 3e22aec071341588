

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::Result;
use crate::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_FUZZINESS, DEFAULT_PAGE_SIZE, DEFAULT_PWS_HOST,
    DEFAULT_PWS_PATH,
};


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheExpirationSettings {
    pub in_progress_status_expiration: u64,
    pub completed_status_expiration: u64,
    pub error_status_expiration: u64,
    pub error_message_expiration: u64,

    pub poll_interval_ms: u64,
}

impl CacheExpirationSettings {
    pub fn in_progress_ttl(&self) -> Duration {
        Duration::from_secs(self.in_progress_status_expiration)
    }

    pub fn completed_ttl(&self) -> Duration {
        Duration::from_secs(self.completed_status_expiration)
    }

    pub fn error_ttl(&self) -> Duration {
        Duration::from_secs(self.error_status_expiration)
    }

    pub fn error_message_ttl(&self) -> Duration {
        Duration::from_secs(self.error_message_expiration)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for CacheExpirationSettings {
    fn default() -> Self {
        Self {
            in_progress_status_expiration: 60,
            completed_status_expiration: 300,
            error_status_expiration: 60,
            error_message_expiration: 300,
            poll_interval_ms: 1000,
        }
    }
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DirectoryConfig {
    pub pws_host: String,
    pub pws_default_path: String,
    /// PEM bundle holding the client certificate and its private key.
    pub client_cert_path: Option<String>,
    pub timeout_secs: u64,
    pub page_size: u32,
    pub fuzziness: f64,
    pub cache_capacity: usize,
    pub cache_namespace: String,
    pub cache: CacheExpirationSettings,
}

impl DirectoryConfig {
    pub fn new(pws_host: &str) -> Self {
        Self {
            pws_host: pws_host.trim_end_matches('/').to_string(),
            pws_default_path: DEFAULT_PWS_PATH.to_string(),
            client_cert_path: None,
            timeout_secs: 30,
            page_size: DEFAULT_PAGE_SIZE,
            fuzziness: DEFAULT_FUZZINESS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_namespace: "directory".to_string(),
            cache: CacheExpirationSettings::default(),
        }
    }

    pub fn pws_url(&self) -> String {
        format!("{}{}", self.pws_host, self.pws_default_path)
    }

    /// Layers `directory-search.toml` (if present) and `DIRECTORY_*` environment
    /// variables over the defaults. Nested keys use `__`, e.g.
    /// `DIRECTORY_CACHE__POLL_INTERVAL_MS`.
    pub fn load() -> Result<Self> {
        Self::load_from("directory-search")
    }

    pub fn load_from(file_stem: &str) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())?;
        let config = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(
                config::Environment::with_prefix("DIRECTORY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PWS_HOST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DirectoryConfig::default();
        assert_eq!(config.page_size, 250);
        assert_eq!(config.fuzziness, 0.25);
        assert_eq!(config.cache.poll_interval(), Duration::from_secs(1));
        assert!(config.cache.completed_ttl() > config.cache.in_progress_ttl());
    }

    #[test]
    fn test_pws_url_strips_trailing_slash() {
        let config = DirectoryConfig::new("https://pws.example.edu/");
        assert_eq!(config.pws_url(), "https://pws.example.edu/identity/v2");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = DirectoryConfig::load_from("does-not-exist").unwrap();
        assert_eq!(config.pws_default_path, DEFAULT_PWS_PATH);
        assert_eq!(config.cache, CacheExpirationSettings::default());
    }
}
