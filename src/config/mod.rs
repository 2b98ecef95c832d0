//! Configuration for the 0x price actions
//!
//! Two layers:
//! - Runtime settings: credential-style key/value lookups (API key, API URL,
//!   taker address) supplied by the agent runtime or the process environment.
//! - `Config`: file-backed (JSON) tuning knobs such as the retry policy and
//!   where to persist memory records.

pub mod chains;

use alloy::primitives::Address;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub use chains::{Chain, ChainId};

/// 0x API key setting (required for any price action)
pub const ZERO_EX_API_KEY: &str = "ZERO_EX_API_KEY";
/// Optional override of the 0x API base URL
pub const ZERO_EX_API_URL: &str = "ZERO_EX_API_URL";
/// Optional taker address forwarded with price requests
pub const ZERO_EX_TAKER: &str = "ZERO_EX_TAKER";

/// Default 0x API base URL
pub const DEFAULT_API_URL: &str = "https://api.0x.org/";

/// Memory log written by the CLI unless the config sets it to `null`
pub const DEFAULT_MEMORY_LOG_PATH: &str = "memories.jsonl";

/// Key/value settings lookup provided by the agent runtime
pub trait Settings: Send + Sync {
    fn get_setting(&self, key: &str) -> Option<String>;
}

/// Settings backed by process environment variables
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSettings;

impl Settings for EnvSettings {
    fn get_setting(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Settings backed by an in-memory map
#[derive(Debug, Clone, Default)]
pub struct MapSettings {
    values: HashMap<String, String>,
}

impl MapSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl Settings for MapSettings {
    fn get_setting(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Credentials and endpoint needed to reach the 0x API
#[derive(Debug, Clone)]
pub struct ZeroExCredentials {
    pub api_key: SecretString,
    pub api_url: Url,
    pub taker: Option<Address>,
}

impl ZeroExCredentials {
    /// Build credentials from runtime settings
    ///
    /// The API URL falls back to `config.zero_ex.api_url` when the
    /// `ZERO_EX_API_URL` setting is absent.
    pub fn from_settings(settings: &dyn Settings, config: &Config) -> crate::Result<Self> {
        let api_key = settings.get_setting(ZERO_EX_API_KEY).ok_or_else(|| {
            crate::Error::Config(format!("{} is not configured", ZERO_EX_API_KEY))
        })?;

        let raw_url = settings
            .get_setting(ZERO_EX_API_URL)
            .unwrap_or_else(|| config.zero_ex.api_url.clone());
        let api_url = Url::parse(&raw_url)
            .map(with_trailing_slash)
            .map_err(|e| crate::Error::Config(format!("Invalid 0x API URL '{}': {}", raw_url, e)))?;

        let taker = match settings.get_setting(ZERO_EX_TAKER) {
            Some(raw) => Some(Address::from_str(&raw).map_err(|e| {
                crate::Error::Config(format!("Invalid {} '{}': {}", ZERO_EX_TAKER, raw, e))
            })?),
            None => None,
        };

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_url,
            taker,
        })
    }
}

/// 0x endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZeroExConfig {
    /// Base URL of the 0x API
    pub api_url: String,
}

impl Default for ZeroExConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

/// Retry settings for the standalone price helper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of fetch attempts
    pub max_attempts: u32,
    /// Seconds to wait after a failed fetch
    pub delay_secs: u64,
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            delay_secs: 5,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 0x endpoint settings
    #[serde(default)]
    pub zero_ex: ZeroExConfig,
    /// Retry policy for the standalone helper
    #[serde(default)]
    pub retry: RetryConfig,
    /// Chain used when the caller does not name one
    #[serde(default = "default_chain")]
    pub default_chain: Chain,
    /// Path to the JSONL memory log (in-memory store when `null`)
    #[serde(default = "default_memory_log_path")]
    pub memory_log_path: Option<String>,
    /// Uniswap-format token list URL (built-in catalog when unset)
    #[serde(default)]
    pub token_list_url: Option<String>,
}

fn default_chain() -> Chain {
    Chain::Base
}

fn default_memory_log_path() -> Option<String> {
    Some(DEFAULT_MEMORY_LOG_PATH.to_string())
}

/// Treat the URL path as a directory so relative joins keep its last segment
pub fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zero_ex: ZeroExConfig::default(),
            retry: RetryConfig::default(),
            default_chain: default_chain(),
            memory_log_path: default_memory_log_path(),
            token_list_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn config_deserialize_defaults() {
        let parsed: Config = serde_json::from_value(serde_json::json!({})).expect("parse config");
        assert_eq!(parsed.retry.max_attempts, 6);
        assert_eq!(parsed.retry.delay(), Duration::from_secs(5));
        assert_eq!(parsed.default_chain, Chain::Base);
        assert_eq!(parsed.zero_ex.api_url, DEFAULT_API_URL);
        assert_eq!(parsed.memory_log_path.as_deref(), Some(DEFAULT_MEMORY_LOG_PATH));
    }

    #[test]
    fn config_defaults_agree_with_empty_file() {
        let parsed: Config = serde_json::from_value(serde_json::json!({})).expect("parse config");
        let default = Config::default();
        assert_eq!(parsed.memory_log_path, default.memory_log_path);
        assert_eq!(parsed.default_chain, default.default_chain);
        assert_eq!(parsed.zero_ex.api_url, default.zero_ex.api_url);
        assert_eq!(parsed.token_list_url, default.token_list_url);
    }

    #[test]
    fn config_null_memory_log_selects_in_memory_store() {
        let parsed: Config =
            serde_json::from_value(serde_json::json!({ "memory_log_path": null })).expect("parse config");
        assert!(parsed.memory_log_path.is_none());
    }

    #[test]
    fn credentials_keep_api_url_path_prefix() {
        let settings = MapSettings::new()
            .with(ZERO_EX_API_KEY, "secret")
            .with(ZERO_EX_API_URL, "http://proxy.local/0x");

        let creds = ZeroExCredentials::from_settings(&settings, &Config::default()).unwrap();
        assert_eq!(creds.api_url.as_str(), "http://proxy.local/0x/");
        assert_eq!(
            creds.api_url.join("swap/permit2/price").unwrap().as_str(),
            "http://proxy.local/0x/swap/permit2/price"
        );
    }

    #[test]
    fn config_deserialize_explicit() {
        let value = serde_json::json!({
            "zero_ex": { "api_url": "http://localhost:8080/" },
            "retry": { "max_attempts": 3, "delay_secs": 1 },
            "default_chain": "arbitrum",
            "memory_log_path": "m.jsonl",
            "token_list_url": "https://tokens.example/list.json"
        });
        let parsed: Config = serde_json::from_value(value).expect("parse config");
        assert_eq!(parsed.retry.max_attempts, 3);
        assert_eq!(parsed.default_chain, Chain::Arbitrum);
        assert_eq!(parsed.memory_log_path.as_deref(), Some("m.jsonl"));
        assert!(parsed.token_list_url.is_some());
    }

    #[test]
    fn credentials_require_api_key() {
        let settings = MapSettings::new();
        let err = ZeroExCredentials::from_settings(&settings, &Config::default()).unwrap_err();
        assert!(err.to_string().contains(ZERO_EX_API_KEY));
    }

    #[test]
    fn credentials_from_settings() {
        let settings = MapSettings::new()
            .with(ZERO_EX_API_KEY, "secret")
            .with(ZERO_EX_API_URL, "http://127.0.0.1:9999/")
            .with(ZERO_EX_TAKER, "0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

        let creds = ZeroExCredentials::from_settings(&settings, &Config::default()).unwrap();
        assert_eq!(creds.api_key.expose_secret(), "secret");
        assert_eq!(creds.api_url.as_str(), "http://127.0.0.1:9999/");
        assert!(creds.taker.is_some());
    }

    #[test]
    fn credentials_reject_bad_taker() {
        let settings = MapSettings::new()
            .with(ZERO_EX_API_KEY, "secret")
            .with(ZERO_EX_TAKER, "not-an-address");
        assert!(ZeroExCredentials::from_settings(&settings, &Config::default()).is_err());
    }
}
