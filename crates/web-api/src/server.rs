use crate::{handlers, state::AppState, webhook};
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/market/status", get(handlers::market_status))
            .route(
                "/api/process-tweet/trigger-workflow",
                post(webhook::trigger_workflow),
            )
            .route("/api/process-tweet/webhook", post(webhook::workflow_webhook))
            .route("/api/authors/:platform", get(handlers::list_authors))
            .route("/api/tweet-processes", get(handlers::list_tweet_processes))
            .route("/api/tweet-processes/:id", get(handlers::get_tweet_process))
            .route("/api/trades/stats", get(handlers::trade_stats))
            .route("/api/trades/:kind", get(handlers::list_trades))
            .route(
                "/api/orders",
                get(handlers::list_orders).post(handlers::create_order),
            )
            .route("/api/positions", get(handlers::list_positions))
            .route("/api/positions/:symbol", delete(handlers::close_position))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Starts the web server listening on the specified address.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve requests.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Web API listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}
