//! Alpaca REST API client with rate limiting.
//!
//! Two base URLs are in play: the trading endpoint (orders, positions,
//! contract listings) and the market-data endpoint (quotes, trades,
//! snapshots). Both are taken from [`BrokerageConfig`] at construction.
//!
//! # Example
//!
//! ```ignore
//! use newsflow_alpaca::{AlpacaClient, Brokerage};
//! use newsflow_core::BrokerageConfig;
//!
//! let config = BrokerageConfig::single_host("https://paper-api.alpaca.markets", key, secret);
//! let client = AlpacaClient::new(&config)?;
//! let quote = client.latest_quote("AAPL").await?;
//! ```

use crate::error::{AlpacaError, Result};
use crate::types::{
    ContractPage, ContractQuery, OptionSnapshot, Order, OrderQuery, OrderRequest, Position, Quote,
    Trade,
};
use governor::{Quota, RateLimiter};
use newsflow_core::BrokerageConfig;
use nonzero_ext::nonzero;
use reqwest::{Client, Method, RequestBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Constants
// =============================================================================

const API_KEY_HEADER: &str = "APCA-API-KEY-ID";
const API_SECRET_HEADER: &str = "APCA-API-SECRET-KEY";

// =============================================================================
// API Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct LatestQuoteResponse {
    quote: Option<Quote>,
}

#[derive(Debug, Deserialize)]
struct LatestTradeResponse {
    trade: Option<Trade>,
}

#[derive(Debug, Deserialize)]
struct SnapshotsResponse {
    #[serde(default)]
    snapshots: HashMap<String, OptionSnapshot>,
}

/// Structured error body returned by Alpaca on failure.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[allow(dead_code)]
    code: Option<i64>,
    message: String,
}

// =============================================================================
// AlpacaClient
// =============================================================================

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Alpaca REST API client.
///
/// All requests are rate-limited, authenticated with key headers, and
/// bounded by the configured timeout.
pub struct AlpacaClient {
    trading_url: String,
    data_url: String,
    api_key: String,
    api_secret: String,
    http: Client,
    rate_limiter: Arc<DirectLimiter>,
}

impl std::fmt::Debug for AlpacaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlpacaClient")
            .field("trading_url", &self.trading_url)
            .field("data_url", &self.data_url)
            .finish_non_exhaustive()
    }
}

impl AlpacaClient {
    /// Creates a new client from brokerage configuration.
    ///
    /// # Errors
    /// Returns [`AlpacaError::Configuration`] when the key or secret is
    /// missing, or the HTTP client cannot be built.
    pub fn new(config: &BrokerageConfig) -> Result<Self> {
        if !config.has_credentials() {
            return Err(AlpacaError::Configuration(
                "brokerage api_key and api_secret are required".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| AlpacaError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or(nonzero!(200u32));
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        Ok(Self {
            trading_url: config.trading_url.trim_end_matches('/').to_string(),
            data_url: config.data_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            http,
            rate_limiter,
        })
    }

    /// Returns the trading endpoint base URL.
    #[must_use]
    pub fn trading_url(&self) -> &str {
        &self.trading_url
    }

    /// Returns the market-data endpoint base URL.
    #[must_use]
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Validates a symbol before it is placed into a URL path.
    ///
    /// Accepts ASCII alphanumerics plus `.`, `-` and `_`, e.g. `AAPL`,
    /// `BRK.B`, `AAPL250117C00150000`.
    fn validate_symbol(symbol: &str) -> Result<&str> {
        if symbol.is_empty() {
            return Err(AlpacaError::InvalidRequest("symbol cannot be empty".to_string()));
        }

        if symbol.contains("..")
            || !symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
        {
            return Err(AlpacaError::InvalidRequest(format!(
                "invalid symbol: {symbol}"
            )));
        }

        if symbol.len() > 32 {
            return Err(AlpacaError::InvalidRequest(format!(
                "invalid symbol: exceeds maximum length of 32: {}",
                symbol.len()
            )));
        }

        Ok(symbol)
    }

    /// Builds an authenticated request after waiting for the rate limiter.
    async fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.rate_limiter.until_ready().await;

        tracing::debug!("{} {}", method, url);

        self.http
            .request(method, url)
            .header("Accept", "application/json")
            .header(API_KEY_HEADER, &self.api_key)
            .header(API_SECRET_HEADER, &self.api_secret)
    }

    async fn get<T, Q>(&self, url: &str, query: &Q) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self.request(Method::GET, url).await.query(query).send().await?;
        Self::handle_response(response).await
    }

    async fn post<T, B>(&self, url: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: Serialize,
    {
        let response = self.request(Method::POST, url).await.json(body).send().await?;
        Self::handle_response(response).await
    }

    async fn delete<T, Q>(&self, url: &str, query: &Q) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self
            .request(Method::DELETE, url)
            .await
            .query(query)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Converts a response into a typed body or an error.
    ///
    /// Non-success responses carrying `{"message": ..}` become
    /// [`AlpacaError::Api`]; anything else becomes [`AlpacaError::Unexpected`].
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(AlpacaError::rate_limit(retry_after));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(body) => AlpacaError::api(status.as_u16(), body.message),
                Err(_) => AlpacaError::unexpected(status.as_u16(), text),
            });
        }

        let body = response.json::<T>().await?;
        Ok(body)
    }

    // =========================================================================
    // Market Data Endpoints
    // =========================================================================

    /// Gets the latest quote for a stock.
    ///
    /// # Errors
    /// Returns error if the API call fails.
    pub async fn get_latest_quote(&self, symbol: &str) -> Result<Quote> {
        let symbol = Self::validate_symbol(symbol)?;
        let url = format!("{}/v2/stocks/{}/quotes/latest", self.data_url, symbol);

        let response: LatestQuoteResponse = self.get(&url, &[] as &[(&str, &str)]).await?;
        Ok(response.quote.unwrap_or_default())
    }

    /// Gets the latest trade for a stock.
    ///
    /// # Errors
    /// Returns error if the API call fails.
    pub async fn get_latest_trade(&self, symbol: &str) -> Result<Trade> {
        let symbol = Self::validate_symbol(symbol)?;
        let url = format!("{}/v2/stocks/{}/trades/latest", self.data_url, symbol);

        let response: LatestTradeResponse = self.get(&url, &[] as &[(&str, &str)]).await?;
        Ok(response.trade.unwrap_or_default())
    }

    /// Gets the snapshot for one options contract.
    ///
    /// A symbol absent from the response yields an empty snapshot.
    ///
    /// # Errors
    /// Returns error if the API call fails.
    pub async fn get_option_snapshot(&self, symbol: &str) -> Result<OptionSnapshot> {
        let symbol = Self::validate_symbol(symbol)?;
        let url = format!("{}/v1beta1/options/snapshots", self.data_url);

        let mut response: SnapshotsResponse = self.get(&url, &[("symbols", symbol)]).await?;
        Ok(response.snapshots.remove(symbol).unwrap_or_default())
    }

    // =========================================================================
    // Trading Endpoints
    // =========================================================================

    /// Gets one page of options contracts matching the query.
    ///
    /// # Errors
    /// Returns error if the API call fails.
    pub async fn get_option_contracts(
        &self,
        query: &ContractQuery,
        page_token: Option<&str>,
    ) -> Result<ContractPage> {
        let url = format!("{}/v2/options/contracts", self.trading_url);

        let mut params = vec![
            ("underlying_symbols", query.underlying_symbol.clone()),
            ("status", "active".to_string()),
            ("type", query.contract_type.as_str().to_string()),
            ("expiration_date_gte", query.expiration_from.to_string()),
            ("expiration_date_lte", query.expiration_to.to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("page_token", token.to_string()));
        }

        self.get(&url, &params).await
    }

    /// Submits an order.
    ///
    /// # Errors
    /// Returns [`AlpacaError::Api`] when the order is rejected.
    pub async fn create_order(&self, order: &OrderRequest) -> Result<Order> {
        let url = format!("{}/v2/orders", self.trading_url);

        tracing::info!(
            symbol = %order.symbol,
            side = ?order.side,
            order_type = ?order.order_type,
            qty = ?order.qty,
            notional = ?order.notional,
            "Submitting order"
        );

        self.post(&url, order).await
    }

    /// Lists orders.
    ///
    /// # Errors
    /// Returns error if the API call fails.
    pub async fn get_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        let url = format!("{}/v2/orders", self.trading_url);

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(status) = &query.status {
            params.push(("status", status.clone()));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }

        self.get(&url, &params).await
    }

    /// Lists open positions.
    ///
    /// # Errors
    /// Returns error if the API call fails.
    pub async fn get_positions(&self) -> Result<Vec<Position>> {
        let url = format!("{}/v2/positions", self.trading_url);
        self.get(&url, &[] as &[(&str, &str)]).await
    }

    /// Closes all or part of a position. Returns the closing order.
    ///
    /// # Errors
    /// Returns [`AlpacaError::InvalidRequest`] when the percentage is outside
    /// `(0, 100]`, or an error if the API call fails.
    pub async fn delete_position(&self, symbol: &str, percentage: Option<Decimal>) -> Result<Order> {
        let symbol = Self::validate_symbol(symbol)?;
        let url = format!("{}/v2/positions/{}", self.trading_url, symbol);

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(pct) = percentage {
            if pct <= Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                return Err(AlpacaError::InvalidRequest(format!(
                    "percentage must be in (0, 100]: {pct}"
                )));
            }
            params.push(("percentage", pct.normalize().to_string()));
        }

        self.delete(&url, &params).await
    }
}
