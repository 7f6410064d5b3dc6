use auth::{AuthError, ProviderError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use records::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid status")]
    InvalidStatus,

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    AccessDenied(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { .. } => AppError::NotFound(error.to_string()),
            other => AppError::InternalError(Box::new(other)),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Validation(message) => AppError::Invalid(message),
            AuthError::AccessDenied { .. } => AppError::AccessDenied(error.to_string()),
            AuthError::ProfileNotFound { .. } => AppError::NotFound(error.to_string()),
            AuthError::Provider(ProviderError::Rejected { .. }) => AppError::Invalid(error.to_string()),
            other => AppError::InternalError(Box::new(other)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload
            | AppError::MissingFields
            | AppError::InvalidStatus
            | AppError::Invalid(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::AccessDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalError(ref e) => {
                error!("Request failed: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match self {
            AppError::InternalError(e) => e.to_string(),
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
