use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use newsflow_core::{FixedClock, TradingPolicy, WorkflowConfig};
use newsflow_data::{Repositories, TweetProcessRecord};
use newsflow_execution::testkit::{
    closed_clock, open_clock, position, InMemoryTradeStore, MockBrokerage,
};
use newsflow_web_api::{ApiServer, AppState, WorkflowTrigger};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestApp {
    router: Router,
    broker: Arc<MockBrokerage>,
    store: Arc<InMemoryTradeStore>,
}

fn app_with(
    broker: MockBrokerage,
    store: InMemoryTradeStore,
    clock: FixedClock,
    trigger_url: &str,
) -> TestApp {
    // Listing routes are not exercised here; the pool never connects.
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/newsflow_test")
        .unwrap();
    let trigger = WorkflowTrigger::new(&WorkflowConfig {
        trigger_url: trigger_url.to_string(),
        api_key: "wf-key".to_string(),
        timeout_secs: 5,
    })
    .unwrap();

    let broker = Arc::new(broker);
    let store = Arc::new(store);
    let state = AppState::new(
        Repositories::new(pool),
        store.clone(),
        broker.clone(),
        Arc::new(clock),
        TradingPolicy::default(),
        trigger,
    );
    TestApp {
        router: ApiServer::new(state).router(),
        broker,
        store,
    }
}

fn app(clock: FixedClock) -> TestApp {
    let store = InMemoryTradeStore::new()
        .with_process(TweetProcessRecord::submitted("tp-1", "author-1", "post", clock.0));
    app_with(MockBrokerage::new(), store, clock, "http://127.0.0.1:9/unused")
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_text(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "text/plain")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_and_market_status() {
    let app = app(open_clock());

    let (status, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app.router, get("/api/market/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_open"], true);
    assert_eq!(body["trading_date"], "2024-11-06");
    assert_eq!(body["session_open"], "09:30");

    let closed = app_with(
        MockBrokerage::new(),
        InMemoryTradeStore::new(),
        closed_clock(),
        "http://127.0.0.1:9/unused",
    );
    let (_, body) = send(&closed.router, get("/api/market/status")).await;
    assert_eq!(body["is_open"], false);
}

#[tokio::test]
async fn test_webhook_completes_once() {
    let app = app(open_clock());
    let payload = r#"{"tweet_process_id": "tp-1", "status": "ok", "market_effect": "no"}"#;

    let (status, body) = send(&app.router, post_text("/api/process-tweet/webhook", payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["market_effect"], false);

    let row = app.store.process("tp-1").unwrap();
    assert_eq!(row.status, "completed");
    assert!(row.trades.is_none());

    let (status, body) = send(&app.router, post_text("/api/process-tweet/webhook", payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_webhook_error_statuses() {
    let app = app(open_clock());

    let unknown = r#"{"tweet_process_id": "nope", "status": "ok", "market_effect": "no"}"#;
    let (status, _) = send(&app.router, post_text("/api/process-tweet/webhook", unknown)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app.router, post_text("/api/process-tweet/webhook", "{{oops")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_payload");
}

#[tokio::test]
async fn test_webhook_execution_failure_still_returns_ok() {
    let clock = open_clock();
    let store = InMemoryTradeStore::new()
        .with_process(TweetProcessRecord::submitted("tp-7", "author-1", "post", clock.0));
    let app = app_with(
        MockBrokerage::new().fail_submit_for("AAPL"),
        store,
        clock,
        "http://127.0.0.1:9/unused",
    );
    let payload = r#"{"tweet_process_id": "tp-7", "status": "ok", "market_effect": "yes",
        "trades": [{"ticker": "AAPL", "action": "buy", "confidence": 0.8}]}"#;

    let (status, body) = send(&app.router, post_text("/api/process-tweet/webhook", payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reconciliation"]["outcomes"][0]["outcome"], "queued");

    assert_eq!(app.store.queued().len(), 1);
    assert_eq!(app.store.queued()[0].dollar_amount, dec!(800));
    assert!(app.store.executed().is_empty());
}

#[tokio::test]
async fn test_trigger_creates_submitted_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/process-tweet"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/webhook/process-tweet", server.uri());
    let app = app_with(MockBrokerage::new(), InMemoryTradeStore::new(), open_clock(), &url);

    let (status, body) = send(
        &app.router,
        post_json(
            "/api/process-tweet/trigger-workflow",
            &json!({"tweet_author_id": "author-9", "tweet_content": "Raising guidance"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    let id = body["tweet_process_id"].as_str().unwrap();
    let row = app.store.process(id).unwrap();
    assert_eq!(row.status, "submitted");
    assert_eq!(row.tweet_author_id, "author-9");
}

#[tokio::test]
async fn test_failed_trigger_marks_run_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = app_with(
        MockBrokerage::new(),
        InMemoryTradeStore::new(),
        open_clock(),
        &server.uri(),
    );
    let (status, _) = send(
        &app.router,
        post_json(
            "/api/process-tweet/trigger-workflow",
            &json!({"tweet_author_id": "author-9", "tweet_content": "Raising guidance"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let rows = app.store.processes();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, "error");
    assert_eq!(rows[0].error_type.as_deref(), Some("trigger_failed"));
}

#[tokio::test]
async fn test_trigger_requires_content() {
    let app = app(open_clock());
    let (status, _) = send(
        &app.router,
        post_json(
            "/api/process-tweet/trigger-workflow",
            &json!({"tweet_author_id": "author-9", "tweet_content": "  "}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.processes().len(), 1);
}

#[tokio::test]
async fn test_manual_order() {
    let app = app(open_clock());
    let (status, body) = send(
        &app.router,
        post_json(
            "/api/orders",
            &json!({"ticker": "msft", "action": "buy", "dollar_amount": "250"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["symbol"], "MSFT");
    assert_eq!(app.broker.submitted_orders().len(), 1);

    let (status, body) = send(&app.router, get("/api/orders?status=accepted")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_manual_order_market_closed() {
    let app = app(closed_clock());
    let (status, body) = send(
        &app.router,
        post_json(
            "/api/orders",
            &json!({"ticker": "MSFT", "action": "buy", "dollar_amount": "250"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");
    assert!(app.broker.submitted_orders().is_empty());
}

#[tokio::test]
async fn test_positions_pass_through() {
    let broker = MockBrokerage::new().with_position(position("AAPL", dec!(10), dec!(190)));
    let app = app_with(broker, InMemoryTradeStore::new(), open_clock(), "http://127.0.0.1:9/unused");

    let (status, body) = send(&app.router, get("/api/positions")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["symbol"], "AAPL");

    let close = Request::builder()
        .method("DELETE")
        .uri("/api/positions/aapl?percentage=50")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, close).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        app.broker.closed_positions(),
        vec![("AAPL".to_string(), Some(dec!(50)))]
    );

    let bad = Request::builder()
        .method("DELETE")
        .uri("/api/positions/AAPL?percentage=150")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = Request::builder()
        .method("DELETE")
        .uri("/api/positions/TSLA")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, missing).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_trade_kind_is_bad_request() {
    let app = app(open_clock());
    let (status, body) = send(&app.router, get("/api/trades/pending")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_malformed_author_platform_is_bad_request() {
    let app = app(open_clock());
    let (status, body) = send(&app.router, get("/api/authors/blue%20sky!")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}
