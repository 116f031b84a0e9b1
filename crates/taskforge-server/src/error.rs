use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use taskforge_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    /// No Authorization header was presented.
    #[error("missing credential")]
    MissingCredential,

    /// A token was presented but is unknown or past its expiry.
    /// Deliberately distinct from [`ServerError::MissingCredential`].
    #[error("invalid or expired session")]
    InvalidSession,

    /// Malformed payload (empty title, create under a virtual list, ...).
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// Target entity does not exist or is not owned by the caller.
    /// Both cases read the same for information hiding.
    #[error("not found")]
    NotFound,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ServerError::NotFound,
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::MissingCredential | ServerError::InvalidSession => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
