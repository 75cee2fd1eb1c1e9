//! Configuration management for the market proxy.
//!
//! The service reads a single configuration file at `~/.market-proxy/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (MARKET_PROXY_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `MARKET_PROXY_BIND` → network.bind
//! - `MARKET_PROXY_PORT` → server.port
//! - `MARKET_PROXY_LOG_LEVEL` → observability.log_level
//! - `MARKET_PROXY_LOG_FORMAT` → observability.log_format
//! - `MARKET_PROXY_SCREENER_URL` → providers.screener.base_url
//! - `MARKET_PROXY_TICKER_URL` → providers.ticker.base_url

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".market-proxy"),
        |dirs| dirs.home_dir().join(".market-proxy"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Network / Server
// ============================================================================

/// Network configuration.
///
/// Default is `127.0.0.1` (local only). Set to `0.0.0.0` to allow remote access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request timeout applied to every route, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// ============================================================================
// Observability
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets to pin at `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

// ============================================================================
// Upstream Providers
// ============================================================================

/// Market scanner (screener) provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerProviderConfig {
    /// When false the screener endpoints report the provider as not installed
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_screener_url")]
    pub base_url: String,

    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,

    /// Markets scanned when a query does not name any
    #[serde(default = "default_markets")]
    pub default_markets: Vec<String>,
}

impl Default for ScreenerProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_screener_url(),
            timeout_secs: default_provider_timeout_secs(),
            default_markets: default_markets(),
        }
    }
}

/// Quote-summary (ticker) provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerProviderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_ticker_url")]
    pub base_url: String,

    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TickerProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_ticker_url(),
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

/// Upstream provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub screener: ScreenerProviderConfig,

    #[serde(default)]
    pub ticker: TickerProviderConfig,
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("MARKET_PROXY_BIND") {
            self.network.bind = bind;
        }
        if let Some(port) = lookup("MARKET_PROXY_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid MARKET_PROXY_PORT"),
            }
        }
        if let Some(level) = lookup("MARKET_PROXY_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("MARKET_PROXY_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Some(url) = lookup("MARKET_PROXY_SCREENER_URL") {
            self.providers.screener.base_url = url;
        }
        if let Some(url) = lookup("MARKET_PROXY_TICKER_URL") {
            self.providers.ticker.base_url = url;
        }
    }

    /// Socket address string the HTTP server binds to.
    ///
    /// IPv6 binds are bracketed (`[::1]:4480`).
    pub fn listen_address(&self) -> String {
        match self.network.bind.parse::<std::net::IpAddr>() {
            Ok(ip) => std::net::SocketAddr::new(ip, self.server.port).to_string(),
            Err(_) => format!("{}:{}", self.network.bind, self.server.port),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    4480
}
fn default_request_timeout_secs() -> u64 {
    60
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}
fn default_true() -> bool {
    true
}
fn default_screener_url() -> String {
    "https://scanner.tradingview.com".into()
}
fn default_ticker_url() -> String {
    "https://query2.finance.yahoo.com".into()
}
fn default_provider_timeout_secs() -> u64 {
    30
}
fn default_markets() -> Vec<String> {
    vec!["america".into()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.network.bind, "127.0.0.1");
        assert_eq!(config.server.port, 4480);
        assert_eq!(config.observability.log_level, "info");
        assert!(config.providers.screener.enabled);
        assert_eq!(config.providers.screener.default_markets, vec!["america"]);
        assert_eq!(config.listen_address(), "127.0.0.1:4480");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"server": {{"port": 9000}}, "providers": {{"ticker": {{"enabled": false}}}}}}"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.request_timeout_secs, 60);
        assert!(!config.providers.ticker.enabled);
        assert_eq!(
            config.providers.ticker.base_url,
            "https://query2.finance.yahoo.com"
        );
        assert!(config.providers.screener.enabled);
    }

    #[test]
    fn test_observability_short_keys() {
        let config: Config =
            serde_json::from_str(r#"{"observability": {"level": "debug", "format": "json"}}"#)
                .unwrap();
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_format, "json");
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MARKET_PROXY_BIND", "0.0.0.0"),
            ("MARKET_PROXY_PORT", "8080"),
            ("MARKET_PROXY_SCREENER_URL", "http://localhost:1234"),
        ]);

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.listen_address(), "0.0.0.0:8080");
        assert_eq!(config.providers.screener.base_url, "http://localhost:1234");
        assert_eq!(
            config.providers.ticker.base_url,
            "https://query2.finance.yahoo.com"
        );
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "MARKET_PROXY_PORT").then(|| "http".to_string()));
        assert_eq!(config.server.port, 4480);
    }

    #[test]
    fn test_listen_address_brackets_ipv6() {
        let mut config = Config::default();
        config.network.bind = "::1".into();
        assert_eq!(config.listen_address(), "[::1]:4480");
    }
}
