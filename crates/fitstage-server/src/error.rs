use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fitstage_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Quota exceeded: {used} of {max} votes used")]
    QuotaExceeded { used: u32, max: u32 },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => ServerError::NotFound(what.to_string()),
            StoreError::ForbiddenRole(role) => {
                ServerError::Forbidden(format!("role '{role}' may not perform this action"))
            }
            StoreError::QuotaExceeded { used, max } => ServerError::QuotaExceeded { used, max },
            StoreError::InvalidTarget(msg) => ServerError::InvalidTarget(msg),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::QuotaExceeded { .. } => (StatusCode::CONFLICT, self.to_string()),
            ServerError::InvalidTarget(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ServerError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
