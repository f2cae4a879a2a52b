use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Crate-wide error taxonomy. Store transport failures become
/// `Connectivity`; constraint violations are mapped to their domain
/// meaning at the store boundary before this type is ever constructed.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("storage unavailable")]
    Connectivity(#[source] sqlx::Error),

    #[error("slot already taken")]
    SlotTaken,

    #[error("{0}")]
    InvalidInput(String),

    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    #[error("unauthorized")]
    Unauthorized,
}

impl ApiError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ApiError::InvalidInput(msg.into())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            other => ApiError::Connectivity(other),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Connectivity(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::SlotTaken => StatusCode::CONFLICT,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Connectivity(source) = self {
            log::error!("store error: {source}");
        }
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

/// Detects a UNIQUE constraint violation so callers can translate it into
/// the matching domain conflict instead of a generic failure.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
