//! Decoding of the workflow completion callback.
//!
//! The workflow posts its result as text that is often JSON encoded twice:
//! the whole body may arrive as a JSON string, quotes and newlines may be
//! escaped literally, and `trades` may itself be a JSON string holding the
//! array.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::intent::TradeIntent;

/// Terminal status reported by the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStatus {
    Ok,
    Error,
}

/// Decoded completion callback.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult {
    pub tweet_process_id: String,
    pub status: WorkflowStatus,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    /// Whether the post was judged market moving. `None` when not reported.
    pub market_effect: Option<bool>,
    pub trades: Vec<TradeIntent>,
}

impl WorkflowResult {
    /// True when the run succeeded and flagged the post as market moving.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        self.status == WorkflowStatus::Ok && self.market_effect == Some(true)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WebhookError {
    #[error("webhook body is empty")]
    Empty,

    #[error("malformed webhook body: {0}")]
    Malformed(String),

    #[error("invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl WebhookError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawWorkflowResult {
    tweet_process_id: Value,
    status: String,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    market_effect: Option<Value>,
    #[serde(default)]
    trades: Option<Value>,
}

/// Decodes a raw webhook body into a [`WorkflowResult`].
///
/// # Errors
/// Returns an error when the body cannot be parsed even after unescaping,
/// or when a field holds an unexpected value.
pub fn decode_workflow_result(raw: &str) -> Result<WorkflowResult, WebhookError> {
    let raw: RawWorkflowResult = parse_lenient(raw)?;

    let tweet_process_id = match raw.tweet_process_id {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => return Err(WebhookError::invalid("tweet_process_id", other.to_string())),
    };
    if tweet_process_id.is_empty() {
        return Err(WebhookError::invalid("tweet_process_id", "must not be empty"));
    }

    let status = match raw.status.trim().to_lowercase().as_str() {
        "ok" | "success" => WorkflowStatus::Ok,
        "error" => WorkflowStatus::Error,
        other => return Err(WebhookError::invalid("status", other)),
    };

    let market_effect = match raw.market_effect {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "yes" | "true" => Some(true),
            "no" | "false" => Some(false),
            "" => None,
            other => return Err(WebhookError::invalid("market_effect", other)),
        },
        Some(other) => return Err(WebhookError::invalid("market_effect", other.to_string())),
    };

    let items: Vec<Value> = match raw.trades {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) if s.trim().is_empty() => Vec::new(),
        Some(Value::String(s)) => {
            parse_lenient(&s).map_err(|e| WebhookError::invalid("trades", e.to_string()))?
        }
        Some(Value::Array(items)) => items,
        Some(other) => return Err(WebhookError::invalid("trades", other.to_string())),
    };

    // One unreadable entry must not drop the rest of the batch.
    let trades = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<TradeIntent>(item) {
            Ok(intent) => Some(intent),
            Err(e) => {
                tracing::warn!(
                    tweet_process_id = %tweet_process_id,
                    index,
                    error = %e,
                    "Skipping unreadable trade entry"
                );
                None
            }
        })
        .collect();

    Ok(WorkflowResult {
        tweet_process_id,
        status,
        error_type: raw.error_type.filter(|s| !s.trim().is_empty()),
        error_message: raw.error_message.filter(|s| !s.trim().is_empty()),
        market_effect,
        trades,
    })
}

/// Parses JSON that may be string-wrapped or carry literal escapes.
fn parse_lenient<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, WebhookError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(WebhookError::Empty);
    }

    // A body that is itself a JSON string literal gets unwrapped once.
    let unwrapped;
    let text = if trimmed.starts_with('"') {
        unwrapped = serde_json::from_str::<String>(trimmed)
            .unwrap_or_else(|_| trimmed.trim_matches('"').to_string());
        unwrapped.trim()
    } else {
        trimmed
    };

    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(first) => {
            let unescaped = unescape_literals(text);
            serde_json::from_str(&unescaped).map_err(|second| {
                tracing::debug!(first = %first, second = %second, "Webhook body failed to parse");
                WebhookError::Malformed(second.to_string())
            })
        }
    }
}

/// Replaces literal `\n` and `\"` sequences with the characters they denote.
fn unescape_literals(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\\"", "\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::TradeAction;

    #[test]
    fn test_plain_json_body() {
        let body = r#"{
            "tweet_process_id": "tp-1",
            "status": "ok",
            "market_effect": "yes",
            "trades": [{"ticker": "AAPL", "action": "buy", "confidence": 0.9, "reasoning": "beat"}]
        }"#;

        let result = decode_workflow_result(body).unwrap();
        assert_eq!(result.tweet_process_id, "tp-1");
        assert_eq!(result.status, WorkflowStatus::Ok);
        assert_eq!(result.market_effect, Some(true));
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].action, TradeAction::Buy);
        assert!(result.is_actionable());
    }

    #[test]
    fn test_literal_escapes_are_unescaped() {
        let body = r#"{\n\"tweet_process_id\": \"tp-2\",\n\"status\": \"ok\",\n\"market_effect\": \"no\"\n}"#;

        let result = decode_workflow_result(body).unwrap();
        assert_eq!(result.tweet_process_id, "tp-2");
        assert_eq!(result.market_effect, Some(false));
        assert!(result.trades.is_empty());
        assert!(!result.is_actionable());
    }

    #[test]
    fn test_string_wrapped_body() {
        let inner = r#"{"tweet_process_id":"tp-3","status":"ok","market_effect":"no"}"#;
        let body = serde_json::to_string(inner).unwrap();

        let result = decode_workflow_result(&body).unwrap();
        assert_eq!(result.tweet_process_id, "tp-3");
    }

    #[test]
    fn test_trades_as_embedded_json_string() {
        let trades = r#"[{"ticker":"TSLA","action":"put","timeline_days":90},{"ticker":"F","action":"sell"}]"#;
        let body = serde_json::json!({
            "tweet_process_id": "tp-4",
            "status": "ok",
            "market_effect": "yes",
            "trades": trades,
        })
        .to_string();

        let result = decode_workflow_result(&body).unwrap();
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].action, TradeAction::Put);
        assert_eq!(result.trades[0].timeline_days, Some(90));
        assert_eq!(result.trades[1].ticker, "F");
    }

    #[test]
    fn test_error_status_keeps_error_fields() {
        let body = r#"{"tweet_process_id":"tp-5","status":"error","error_type":"llm_timeout","error_message":"model did not answer"}"#;

        let result = decode_workflow_result(body).unwrap();
        assert_eq!(result.status, WorkflowStatus::Error);
        assert_eq!(result.error_type.as_deref(), Some("llm_timeout"));
        assert_eq!(result.error_message.as_deref(), Some("model did not answer"));
        assert_eq!(result.market_effect, None);
    }

    #[test]
    fn test_reasoning_with_escaped_quotes_survives() {
        let body = r#"{"tweet_process_id":"tp-6","status":"ok","market_effect":"yes","trades":[{"ticker":"GM","action":"buy","reasoning":"CEO said \"record\" quarter"}]}"#;

        let result = decode_workflow_result(body).unwrap();
        assert_eq!(result.trades[0].reasoning, "CEO said \"record\" quarter");
    }

    #[test]
    fn test_unreadable_trade_entry_is_skipped() {
        let body = r#"{"tweet_process_id":"tp-9","status":"ok","market_effect":"yes","trades":[{"ticker":"AAPL","action":"hold"},{"ticker":"NVDA","action":"call"}]}"#;

        let result = decode_workflow_result(body).unwrap();
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].ticker, "NVDA");
    }

    #[test]
    fn test_rejects_empty_body() {
        assert_eq!(decode_workflow_result("   "), Err(WebhookError::Empty));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            decode_workflow_result("not json at all"),
            Err(WebhookError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_market_effect() {
        let body = r#"{"tweet_process_id":"tp-7","status":"ok","market_effect":"maybe"}"#;
        assert!(matches!(
            decode_workflow_result(body),
            Err(WebhookError::InvalidField { field: "market_effect", .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_status() {
        let body = r#"{"tweet_process_id":"tp-8","status":"pending"}"#;
        assert!(matches!(
            decode_workflow_result(body),
            Err(WebhookError::InvalidField { field: "status", .. })
        ));
    }

    #[test]
    fn test_rejects_empty_id() {
        let body = r#"{"tweet_process_id":"  ","status":"ok"}"#;
        assert!(matches!(
            decode_workflow_result(body),
            Err(WebhookError::InvalidField { field: "tweet_process_id", .. })
        ));
    }
}
