//! Error handling for the CoffeeStudio calculator service
//!
//! Every error becomes a JSON body of the form
//! `{"error": {"code": ..., "message": ..., "fields": [...]}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{CalcError, FieldError, ValidationError};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    // Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // External service errors
    #[error("External service error: {0}")]
    ExternalService(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<CalcError> for AppError {
    fn from(err: CalcError) -> Self {
        AppError::Validation(err.into_validation("currency"))
    }
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl ErrorDetail {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            fields: Vec::new(),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            AppError::Unauthorized(message) => ErrorDetail::new("UNAUTHORIZED", message.clone()),
            AppError::InsufficientPermissions => ErrorDetail::new(
                "INSUFFICIENT_PERMISSIONS",
                "You do not have permission to perform this action",
            ),
            AppError::Validation(errors) => ErrorDetail {
                code: "VALIDATION_ERROR".to_string(),
                message: errors.to_string(),
                fields: errors.errors.clone(),
            },
            AppError::NotFound(resource) => {
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource))
            }
            AppError::ExternalService(msg) => {
                ErrorDetail::new("EXTERNAL_SERVICE_ERROR", format!("External service error: {}", msg))
            }
            AppError::DatabaseError(_) => ErrorDetail::new("DATABASE_ERROR", "A database error occurred"),
            AppError::Internal(_) => {
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred")
            }
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Currency;

    #[test]
    fn test_validation_maps_to_422() {
        let err = AppError::from(ValidationError::single("yield_factor", "bad"));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_invalid_currency_is_validation() {
        let err = AppError::from(CalcError::InvalidCurrency {
            from: Currency::Pen,
            to: Currency::Eur,
        });
        match err {
            AppError::Validation(errors) => assert!(errors.has_field("currency")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_not_found_status() {
        assert_eq!(AppError::NotFound("Lot".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InsufficientPermissions.status(), StatusCode::FORBIDDEN);
    }
}
