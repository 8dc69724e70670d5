//! Error types for the API.
//!
//! Every failure leaves the server as `{ "code": "...", "message": "..." }`
//! with the status implied by the code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use medmart_core::{CoreError, ValidationError};
use medmart_db::DbError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Machine-readable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationFailed,
    Unauthenticated,
    Forbidden,
    NotFound,
    Conflict,
    InsufficientStock,
    ProductUnavailable,
    EmptyCart,
    PayloadTooLarge,
    UnsupportedMediaType,
    Internal,
    Unavailable,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InsufficientStock => StatusCode::CONFLICT,
            ErrorCode::ProductUnavailable => StatusCode::CONFLICT,
            ErrorCode::EmptyCart => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// API error: a code plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthenticated, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::invalid(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ProductNotFound(_) => ErrorCode::NotFound,
            CoreError::ProductUnavailable(_) => ErrorCode::ProductUnavailable,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::EmptyCart => ErrorCode::EmptyCart,
            CoreError::InvalidCheckoutStep { .. } => ErrorCode::ValidationFailed,
            CoreError::Validation(_) => ErrorCode::ValidationFailed,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        let code = match &err {
            DbError::NotFound { .. } => ErrorCode::NotFound,
            DbError::UniqueViolation { .. } => ErrorCode::Conflict,
            DbError::ForeignKeyViolation { .. } => ErrorCode::ValidationFailed,
            DbError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            DbError::ProductUnavailable(_) => ErrorCode::ProductUnavailable,
            DbError::EmptyOrder => ErrorCode::EmptyCart,
            DbError::ConnectionFailed(_) | DbError::PoolExhausted => ErrorCode::Unavailable,
            DbError::MigrationFailed(_) | DbError::QueryFailed(_) | DbError::Internal(_) => ErrorCode::Internal,
        };

        // Backend details stay in the log
        if matches!(code, ErrorCode::Internal | ErrorCode::Unavailable) {
            error!(error = %err, "Database failure while handling request");
            return ApiError::new(code, "The server could not complete the request");
        }

        ApiError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_errors_map_to_codes() {
        let err: ApiError = DbError::not_found("Product", "p1").into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.code.status(), StatusCode::NOT_FOUND);

        let err: ApiError = DbError::duplicate("email", "a@b.co").into();
        assert_eq!(err.code.status(), StatusCode::CONFLICT);

        let err: ApiError = DbError::QueryFailed("syntax error near SELEC".into()).into();
        assert_eq!(err.code, ErrorCode::Internal);
        assert!(!err.message.contains("SELEC"));
    }

    #[test]
    fn test_error_body_shape() {
        let err = ApiError::new(ErrorCode::EmptyCart, "Cart is empty");
        let body = serde_json::to_value(&err).unwrap();
        assert_eq!(body["code"], "EMPTY_CART");
        assert_eq!(body["message"], "Cart is empty");
    }
}
