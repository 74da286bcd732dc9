use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Alpaca paper-trading endpoint.
pub const DEFAULT_TRADING_URL: &str = "https://paper-api.alpaca.markets";

/// Alpaca market-data endpoint.
pub const DEFAULT_DATA_URL: &str = "https://data.alpaca.markets";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub brokerage: BrokerageConfig,
    pub workflow: WorkflowConfig,
    pub trading: TradingPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Socket address string for binding the listener.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/newsflow".to_string(),
            max_connections: 10,
        }
    }
}

/// Connection settings for the brokerage REST API.
///
/// Passed explicitly into the brokerage client at composition time; nothing
/// reads brokerage credentials from the process environment directly.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerageConfig {
    /// Base URL of the trading endpoint (orders, positions, contracts).
    pub trading_url: String,
    /// Base URL of the market-data endpoint (quotes, trades, snapshots).
    pub data_url: String,
    pub api_key: String,
    pub api_secret: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub requests_per_minute: u32,
}

impl Default for BrokerageConfig {
    fn default() -> Self {
        Self {
            trading_url: DEFAULT_TRADING_URL.to_string(),
            data_url: DEFAULT_DATA_URL.to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            timeout_secs: 15,
            requests_per_minute: 200,
        }
    }
}

impl BrokerageConfig {
    /// Creates a config pointing both endpoints at the same base URL.
    #[must_use]
    pub fn single_host(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            trading_url: base_url.clone(),
            data_url: base_url,
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            ..Self::default()
        }
    }

    /// True when both key and secret are present.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.api_secret.trim().is_empty()
    }
}

impl std::fmt::Debug for BrokerageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerageConfig")
            .field("trading_url", &self.trading_url)
            .field("data_url", &self.data_url)
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("requests_per_minute", &self.requests_per_minute)
            .finish()
    }
}

/// Settings for the external LLM workflow that analyses posts.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Endpoint that starts a workflow run for a submitted post.
    pub trigger_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            trigger_url: "http://localhost:5678/webhook/process-tweet".to_string(),
            api_key: String::new(),
            timeout_secs: 15,
        }
    }
}

impl std::fmt::Debug for WorkflowConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowConfig")
            .field("trigger_url", &self.trigger_url)
            .field("api_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Sizing and expiry policy applied to incoming trade intents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingPolicy {
    /// Dollar amount scaled by intent confidence.
    pub base_dollar_amount: Decimal,
    /// When set, every trade uses this amount and confidence is ignored.
    pub fixed_notional: Option<Decimal>,
    /// Target expiry offset for short-horizon option reads.
    pub short_horizon_days: i64,
    /// Target expiry offset for long-horizon option reads.
    pub long_horizon_days: i64,
    /// Timelines longer than this many days are long-horizon.
    pub long_horizon_threshold_days: i64,
    /// Width of the contract search window past the target expiry.
    pub contract_window_days: i64,
    /// Multiplier on the ask used as the protective extended-hours limit.
    pub extended_hours_markup: Decimal,
}

impl Default for TradingPolicy {
    fn default() -> Self {
        Self {
            base_dollar_amount: Decimal::from(1000),
            fixed_notional: None,
            short_horizon_days: 30,
            long_horizon_days: 180,
            long_horizon_threshold_days: 30,
            contract_window_days: 90,
            extended_hours_markup: Decimal::new(102, 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.addr(), "0.0.0.0:8080");
        assert_eq!(config.brokerage.trading_url, DEFAULT_TRADING_URL);
        assert_eq!(config.brokerage.timeout_secs, 15);
        assert_eq!(config.trading.base_dollar_amount, dec!(1000));
        assert_eq!(config.trading.extended_hours_markup, dec!(1.02));
        assert!(config.trading.fixed_notional.is_none());
    }

    #[test]
    fn test_brokerage_debug_redacts_secrets() {
        let config = BrokerageConfig::single_host("http://localhost", "key-id", "super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("key-id"));
        assert!(debug.contains("http://localhost"));
    }

    #[test]
    fn test_has_credentials() {
        assert!(!BrokerageConfig::default().has_credentials());
        assert!(BrokerageConfig::single_host("http://x", "k", "s").has_credentials());
        assert!(!BrokerageConfig::single_host("http://x", "k", "  ").has_credentials());
    }
}
