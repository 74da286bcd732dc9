use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use newsflow_alpaca::{Order, OrderQuery, Position};
use newsflow_core::market_clock::{self, SESSION_CLOSE, SESSION_OPEN};
use newsflow_data::{
    AuthorRecord, ExecutedTradeRecord, ExecutedTradeStatistics, QueuedTradeRecord, QueuedTradeStatistics,
    TweetProcessRecord,
};
use newsflow_execution::{ExecutionReport, ExecutionRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

// =============================================================================
// Health and market status
// =============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: state.clock.now(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarketStatusResponse {
    pub is_open: bool,
    pub trading_date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    /// Regular session bounds, Eastern time.
    pub session_open: String,
    pub session_close: String,
}

pub async fn market_status(State(state): State<Arc<AppState>>) -> Json<MarketStatusResponse> {
    let now = state.clock.now();
    Json(MarketStatusResponse {
        is_open: market_clock::is_open(now),
        trading_date: market_clock::trading_date(now),
        timestamp: now,
        session_open: format!("{:02}:{:02}", SESSION_OPEN.0, SESSION_OPEN.1),
        session_close: format!("{:02}:{:02}", SESSION_CLOSE.0, SESSION_CLOSE.1),
    })
}

// =============================================================================
// Tweet processes
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

/// Lists analysis runs, newest first.
///
/// # Errors
/// Returns 500 if the query fails.
pub async fn list_tweet_processes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<TweetProcessRecord>>> {
    let records = state
        .repos
        .tweet_processes
        .get_recent(clamp_limit(query.limit))
        .await?;
    Ok(Json(records))
}

/// # Errors
/// Returns 404 for an unknown ID, or 500 if the query fails.
pub async fn get_tweet_process(
    State(state): State<Arc<AppState>>,
    Path(tweet_process_id): Path<String>,
) -> ApiResult<Json<TweetProcessRecord>> {
    state
        .repos
        .tweet_processes
        .get(&tweet_process_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("tweet process {tweet_process_id} not found")))
}

// =============================================================================
// Authors
// =============================================================================

/// Lists the authors subscribed on a platform, for the ingestion listener.
///
/// # Errors
/// Returns 400 for a malformed platform name, or 500 if the query fails.
pub async fn list_authors(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
) -> ApiResult<Json<Vec<AuthorRecord>>> {
    let platform = platform.trim().to_lowercase();
    let well_formed = !platform.is_empty()
        && platform.len() <= 32
        && platform
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !well_formed {
        return Err(ApiError::BadRequest(format!(
            "invalid platform {platform:?}"
        )));
    }

    Ok(Json(state.repos.authors.list_by_platform(&platform).await?))
}

// =============================================================================
// Trades
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct TradeListQuery {
    pub limit: Option<i64>,
    pub tweet_process_id: Option<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum TradeList {
    Queued(Vec<QueuedTradeRecord>),
    Executed(Vec<ExecutedTradeRecord>),
}

/// Lists queued or executed trades, newest first.
///
/// # Errors
/// Returns 400 for an unknown kind, or 500 if the query fails.
pub async fn list_trades(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Query(query): Query<TradeListQuery>,
) -> ApiResult<Json<TradeList>> {
    let limit = clamp_limit(query.limit);
    let tweet_process_id = query.tweet_process_id.as_deref();

    let list = match kind.as_str() {
        "queued" => TradeList::Queued(
            state
                .repos
                .queued_trades
                .get_recent(limit, tweet_process_id)
                .await?,
        ),
        "executed" => TradeList::Executed(
            state
                .repos
                .executed_trades
                .get_recent(limit, tweet_process_id)
                .await?,
        ),
        other => {
            return Err(ApiError::BadRequest(format!(
                "unknown trade kind {other:?}, expected queued or executed"
            )))
        }
    };
    Ok(Json(list))
}

#[derive(Serialize)]
pub struct TradeStatsResponse {
    pub queued: QueuedTradeStatistics,
    pub executed: ExecutedTradeStatistics,
}

/// # Errors
/// Returns 500 if either query fails.
pub async fn trade_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<TradeStatsResponse>> {
    let (queued, executed) = tokio::try_join!(
        state.repos.queued_trades.get_statistics(),
        state.repos.executed_trades.get_statistics(),
    )?;
    Ok(Json(TradeStatsResponse { queued, executed }))
}

// =============================================================================
// Orders and positions
// =============================================================================

/// Places one order immediately.
///
/// # Errors
/// Returns the execution error's status: 400 for validation and sizing
/// failures, 404 when no contract matches, 502 for lookups, or the
/// brokerage's own status on rejection.
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecutionRequest>,
) -> ApiResult<(StatusCode, Json<ExecutionReport>)> {
    let report = state.executor.execute(&request).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// # Errors
/// Returns a brokerage error if the listing fails.
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OrderQuery>,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.broker.list_orders(&query).await?))
}

/// # Errors
/// Returns a brokerage error if the listing fails.
pub async fn list_positions(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Position>>> {
    Ok(Json(state.broker.list_positions().await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ClosePositionQuery {
    pub percentage: Option<Decimal>,
}

/// Closes all of a position, or a percentage of it.
///
/// # Errors
/// Returns 400 for a percentage outside (0, 100], or the brokerage's error.
pub async fn close_position(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<ClosePositionQuery>,
) -> ApiResult<Json<Order>> {
    if let Some(pct) = query.percentage {
        if pct <= Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
            return Err(ApiError::BadRequest(format!(
                "percentage must be in (0, 100], got {pct}"
            )));
        }
    }
    let order = state
        .broker
        .close_position(&symbol.to_uppercase(), query.percentage)
        .await?;
    Ok(Json(order))
}
