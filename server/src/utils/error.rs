use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::utils::response::error as error_response;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Not acceptable: {0}")]
    NotAcceptable(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Store operation timed out after {0:?}")]
    StoreTimeout(Duration),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::DatabaseError(_)
            | AppError::StoreTimeout(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::NotAcceptable(_) => "NOT_ACCEPTABLE",
            AppError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::StoreTimeout(_) => "STORE_TIMEOUT",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Store unavailability, timeouts and recovered panics. Safe for the
    /// caller to retry.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            AppError::DatabaseError(_)
                | AppError::StoreTimeout(_)
                | AppError::InternalServerError(_)
        )
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg)
            | AppError::NotFound(msg)
            | AppError::NotAcceptable(msg)
            | AppError::UnsupportedMediaType(msg) => {
                warn!(error = ?self, message = %msg, "Request rejected");
            }
            AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
            AppError::StoreTimeout(limit) => {
                error!(timeout = ?limit, "Store operation timed out");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        // Only expose high-level message to the client
        let public_message = match &self {
            AppError::ValidationError(msg)
            | AppError::NotFound(msg)
            | AppError::NotAcceptable(msg)
            | AppError::UnsupportedMediaType(msg) => msg.clone(),
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            AppError::StoreTimeout(_) => "The data store did not respond in time".to_string(),
            AppError::InternalServerError(_) => "Something went wrong.".to_string(),
        };

        error_response(code, public_message, None, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::ValidationError("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("gone".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::NotAcceptable("accept".into()).status_code(),
            StatusCode::NOT_ACCEPTABLE
        );
        assert_eq!(
            AppError::UnsupportedMediaType("ct".into()).status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            AppError::StoreTimeout(Duration::from_secs(5)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_infrastructure_kinds() {
        assert!(AppError::DatabaseError(sqlx::Error::PoolTimedOut).is_infrastructure());
        assert!(AppError::StoreTimeout(Duration::from_secs(1)).is_infrastructure());
        assert!(!AppError::ValidationError("x".into()).is_infrastructure());
        assert!(!AppError::NotFound("x".into()).is_infrastructure());
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let response = AppError::InternalServerError("secret stack".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
