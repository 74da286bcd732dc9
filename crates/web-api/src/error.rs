use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use newsflow_alpaca::AlpacaError;
use newsflow_execution::{CompletionError, ExecutionError, StoreError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Brokerage(#[from] AlpacaError),

    /// A downstream service we call did not accept the request.
    #[error("{0}")]
    Upstream(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0:#}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    error: &'static str,
    message: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Execution(e) => from_u16(e.http_status()),
            Self::Completion(e) => from_u16(e.http_status()),
            Self::Brokerage(e) => match e {
                AlpacaError::Api { status_code, .. } if (400..500).contains(status_code) => {
                    from_u16(*status_code)
                }
                AlpacaError::RateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
                AlpacaError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                AlpacaError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Execution(e) => e.kind(),
            Self::Completion(CompletionError::InvalidPayload(_)) => "invalid_payload",
            Self::Completion(CompletionError::NotFound(_)) => "not_found",
            Self::Completion(CompletionError::Conflict { .. }) => "conflict",
            Self::Completion(CompletionError::Store(_)) | Self::Store(_) => "persistence",
            Self::Brokerage(_) => "brokerage",
            Self::Upstream(_) => "upstream",
            Self::Anyhow(_) => "internal",
        }
    }
}

fn from_u16(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        }
        let body = Json(ErrorBody {
            code: status.as_u16(),
            error: self.kind(),
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brokerage_client_errors_pass_through() {
        let err = ApiError::from(AlpacaError::api(404, "position does not exist"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError::from(AlpacaError::api(503, "maintenance"));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_execution_errors_use_their_status() {
        let err = ApiError::from(ExecutionError::validation("market is closed"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "validation");
    }
}
