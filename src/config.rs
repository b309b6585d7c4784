//! Environment-driven configuration.

use crate::models::Provider;
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Compiled-in default secret for the canonical provider, if one was set at build time.
pub const BUILD_DEFAULT_API_KEY: Option<&str> = option_env!("SOCIALDASH_DEFAULT_API_KEY");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollOverrides {
    pub initial_delay: Option<Duration>,
    pub interval: Option<Duration>,
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub settings_path: Option<PathBuf>,
    pub default_api_key: Option<String>,
    pub legacy_api_key: Option<String>,
    pub base_urls: HashMap<Provider, String>,
    pub poll: PollOverrides,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings_path: None,
            default_api_key: BUILD_DEFAULT_API_KEY.map(str::to_string),
            legacy_api_key: None,
            base_urls: HashMap::new(),
            poll: PollOverrides::default(),
            http_timeout: Duration::from_secs(60),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; `from_env` uses the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut base_urls = HashMap::new();
        for provider in Provider::ALL {
            let key = format!("{}_BASE_URL", provider.slug().to_ascii_uppercase());
            if let Some(url) = var(&key) {
                base_urls.insert(provider, url.trim_end_matches('/').to_string());
            }
        }

        let poll = PollOverrides {
            initial_delay: parse_number::<u64>(var("POLL_INITIAL_DELAY_SECS"), "POLL_INITIAL_DELAY_SECS")?
                .map(Duration::from_secs),
            interval: parse_number::<u64>(var("POLL_INTERVAL_SECS"), "POLL_INTERVAL_SECS")?
                .map(Duration::from_secs),
            max_attempts: parse_number::<u32>(var("POLL_MAX_ATTEMPTS"), "POLL_MAX_ATTEMPTS")?,
        };
        if poll.max_attempts == Some(0) {
            return Err(Error::Config("POLL_MAX_ATTEMPTS must be at least 1".to_string()));
        }

        let http_timeout = parse_number::<u64>(var("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        Ok(Self {
            settings_path: var("SOCIALDASH_SETTINGS_PATH").map(PathBuf::from),
            default_api_key: var("SOCIALDASH_DEFAULT_API_KEY")
                .or_else(|| BUILD_DEFAULT_API_KEY.map(str::to_string)),
            legacy_api_key: var("LEGACY_API_KEY"),
            base_urls,
            poll,
            http_timeout,
        })
    }

    pub fn base_url(&self, provider: Provider) -> Option<&str> {
        self.base_urls.get(&provider).map(String::as_str)
    }
}

fn parse_number<T: std::str::FromStr>(value: Option<String>, key: &str) -> Result<Option<T>> {
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| Error::Config(format!("{} must be a non-negative integer, got '{}'", key, v)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_reads_base_urls_and_poll_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("VIDEO_QUEUE_BASE_URL", "http://localhost:9000/"),
            ("POLL_INTERVAL_SECS", "2"),
            ("POLL_MAX_ATTEMPTS", "7"),
            ("LEGACY_API_KEY", "legacy-secret-key"),
        ]))
        .unwrap();

        assert_eq!(
            config.base_url(Provider::VideoQueue),
            Some("http://localhost:9000")
        );
        assert_eq!(config.base_url(Provider::ImageStudio), None);
        assert_eq!(config.poll.interval, Some(Duration::from_secs(2)));
        assert_eq!(config.poll.max_attempts, Some(7));
        assert_eq!(config.poll.initial_delay, None);
        assert_eq!(config.legacy_api_key.as_deref(), Some("legacy-secret-key"));
    }

    #[test]
    fn test_blank_values_are_treated_as_unset() {
        let config = Config::from_lookup(lookup_from(&[("LEGACY_API_KEY", "   ")])).unwrap();
        assert!(config.legacy_api_key.is_none());
    }

    #[test]
    fn test_invalid_numbers_are_config_errors() {
        let err = Config::from_lookup(lookup_from(&[("POLL_MAX_ATTEMPTS", "lots")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_lookup(lookup_from(&[("POLL_MAX_ATTEMPTS", "0")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
