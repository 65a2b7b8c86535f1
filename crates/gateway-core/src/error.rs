use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// The gateway's single error taxonomy. Every fallible operation across the
/// workspace returns this type (or wraps it), so the HTTP layer can map
/// failures to status codes in one place instead of scattering `match`es
/// over ad-hoc error enums.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("evaluation failed: {0}")]
    EvaluationError(String),

    #[error("dispatch failed: {0}")]
    DispatchError(String),

    #[error("engine error: {0}")]
    EngineError(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::Invalid(_) => StatusCode::BAD_REQUEST,
            GatewayError::EvaluationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::DispatchError(_) => StatusCode::BAD_GATEWAY,
            GatewayError::EngineError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<duckdb::Error> for GatewayError {
    fn from(err: duckdb::Error) -> Self {
        GatewayError::EngineError(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
