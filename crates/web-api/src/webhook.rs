//! Endpoints shared with the analysis workflow: start a run, receive its result.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use newsflow_data::TweetProcessRecord;
use newsflow_execution::CompletionOutcome;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::trigger::TriggerPayload;

#[derive(Debug, Deserialize)]
pub struct TriggerRequest {
    pub tweet_author_id: String,
    pub tweet_content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub tweet_process_id: String,
    pub status: String,
}

/// Records a submitted run and hands it to the workflow.
///
/// # Errors
/// Returns 400 for blank fields, 500 if the run cannot be recorded, and
/// 502 if the workflow does not accept it. In the 502 case the run is
/// already marked `error` with `error_type = "trigger_failed"`.
pub async fn trigger_workflow(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TriggerRequest>,
) -> ApiResult<(StatusCode, Json<TriggerResponse>)> {
    let author = request.tweet_author_id.trim();
    let content = request.tweet_content.trim();
    if author.is_empty() || content.is_empty() {
        return Err(ApiError::BadRequest(
            "tweet_author_id and tweet_content are required".to_string(),
        ));
    }

    let tweet_process_id = Uuid::new_v4().to_string();
    let record = TweetProcessRecord::submitted(&tweet_process_id, author, content, state.clock.now());
    state.store.create_process(&record).await?;

    let payload = TriggerPayload {
        tweet_process_id: &tweet_process_id,
        tweet_author_id: author,
        tweet_content: content,
    };
    if let Err(e) = state.trigger.trigger(&payload).await {
        warn!(tweet_process_id = %tweet_process_id, error = %e, "Workflow trigger failed");
        let message = e.to_string();
        state
            .store
            .fail_process(
                &tweet_process_id,
                Some("trigger_failed"),
                Some(&message),
                state.clock.now(),
            )
            .await?;
        return Err(ApiError::Upstream(format!(
            "tweet process {tweet_process_id}: {message}"
        )));
    }

    info!(tweet_process_id = %tweet_process_id, author, "Workflow triggered");
    Ok((
        StatusCode::ACCEPTED,
        Json(TriggerResponse {
            tweet_process_id,
            status: "submitted".to_string(),
        }),
    ))
}

/// Completion callback. The body is taken as raw text because the workflow
/// often double-encodes it.
///
/// # Errors
/// 400 for an undecodable body, 404 for an unknown run, 409 if the run was
/// already completed, 500 if the status update fails. Trade execution
/// problems never change the status code.
pub async fn workflow_webhook(
    State(state): State<Arc<AppState>>,
    body: String,
) -> ApiResult<Json<CompletionOutcome>> {
    let outcome = state.completion.complete(&body).await?;
    Ok(Json(outcome))
}
