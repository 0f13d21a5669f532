use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

const DEFAULT_REGION: &str = "IN";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DETAIL_DEADLINE_SECS: u64 = 15;

/// Process configuration, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub bot_token: String,
    pub tmdb_api_key: String,
    pub watch_region: String,
    pub request_timeout: Duration,
    pub detail_deadline: Duration,
    pub health_addr: Option<SocketAddr>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"***")
            .field("tmdb_api_key", &"***")
            .field("watch_region", &self.watch_region)
            .field("request_timeout", &self.request_timeout)
            .field("detail_deadline", &self.detail_deadline)
            .field("health_addr", &self.health_addr)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        info!("All required environment variables are set");
        Ok(config)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("Missing required environment variable: {}", key))
        };
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bot_token = required("BOT_TOKEN")?;
        let tmdb_api_key = required("TMDB_API_KEY")?;

        let watch_region = optional("WATCH_REGION")
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
            .to_ascii_uppercase();
        if watch_region.len() != 2 || !watch_region.chars().all(|c| c.is_ascii_alphabetic()) {
            bail!("WATCH_REGION must be a two-letter country code, got '{}'", watch_region);
        }

        let secs = |key: &str, default: u64| -> Result<Duration> {
            let value = match optional(key) {
                Some(raw) => raw
                    .parse::<u64>()
                    .with_context(|| format!("{} must be a whole number of seconds", key))?,
                None => default,
            };
            if value == 0 {
                bail!("{} must be greater than zero", key);
            }
            Ok(Duration::from_secs(value))
        };
        let request_timeout = secs("TMDB_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let detail_deadline = secs("DETAIL_DEADLINE_SECS", DEFAULT_DETAIL_DEADLINE_SECS)?;

        let health_addr = optional("HEALTH_ADDR")
            .map(|raw| {
                raw.parse::<SocketAddr>()
                    .with_context(|| format!("HEALTH_ADDR is not a socket address: {}", raw))
            })
            .transpose()?;

        Ok(Self {
            bot_token,
            tmdb_api_key,
            watch_region,
            request_timeout,
            detail_deadline,
            health_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let config = Config::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("TMDB_API_KEY", "k")]))
            .expect("config should load");
        assert_eq!(config.watch_region, "IN");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.detail_deadline, Duration::from_secs(15));
        assert!(config.health_addr.is_none());
    }

    #[test]
    fn missing_secret_is_fatal() {
        let err = Config::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("TMDB_API_KEY", "  ")]))
            .unwrap_err();
        assert!(err.to_string().contains("TMDB_API_KEY"));
        let err = Config::from_lookup(lookup(&[("TMDB_API_KEY", "k")])).unwrap_err();
        assert!(err.to_string().contains("BOT_TOKEN"));
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("BOT_TOKEN", "t"),
            ("TMDB_API_KEY", "k"),
            ("WATCH_REGION", "us"),
            ("TMDB_TIMEOUT_SECS", "3"),
            ("DETAIL_DEADLINE_SECS", "7"),
            ("HEALTH_ADDR", "127.0.0.1:8080"),
        ]))
        .expect("config should load");
        assert_eq!(config.watch_region, "US");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.detail_deadline, Duration::from_secs(7));
        assert_eq!(config.health_addr, Some("127.0.0.1:8080".parse().unwrap()));
    }

    #[test]
    fn rejects_bad_values() {
        let base = [("BOT_TOKEN", "t"), ("TMDB_API_KEY", "k")];
        for extra in [
            ("WATCH_REGION", "IND"),
            ("TMDB_TIMEOUT_SECS", "ten"),
            ("DETAIL_DEADLINE_SECS", "0"),
            ("HEALTH_ADDR", "localhost"),
        ] {
            let mut pairs = base.to_vec();
            pairs.push(extra);
            assert!(Config::from_lookup(lookup(&pairs)).is_err(), "{:?}", extra);
        }
    }

    #[test]
    fn debug_hides_secrets() {
        let config = Config::from_lookup(lookup(&[("BOT_TOKEN", "secret-token"), ("TMDB_API_KEY", "secret-key")]))
            .expect("config should load");
        let shown = format!("{:?}", config);
        assert!(!shown.contains("secret"));
    }
}
