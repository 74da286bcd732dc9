//! Outbound call that starts an analysis run in the workflow service.

use std::time::Duration;

use newsflow_core::WorkflowConfig;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("workflow request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("workflow returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Body posted to the workflow trigger URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerPayload<'a> {
    pub tweet_process_id: &'a str,
    pub tweet_author_id: &'a str,
    pub tweet_content: &'a str,
}

/// HTTP client for the workflow trigger endpoint.
#[derive(Clone)]
pub struct WorkflowTrigger {
    http: Client,
    url: String,
    api_key: String,
}

impl std::fmt::Debug for WorkflowTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowTrigger")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl WorkflowTrigger {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &WorkflowConfig) -> Result<Self, TriggerError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            http,
            url: config.trigger_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Posts one run to the workflow. Any non-2xx response is an error.
    ///
    /// # Errors
    /// Returns [`TriggerError`] on transport failure or rejection.
    pub async fn trigger(&self, payload: &TriggerPayload<'_>) -> Result<(), TriggerError> {
        let mut request = self.http.post(&self.url).json(payload);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(TriggerError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
