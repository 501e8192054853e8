//! Unified error handling
//!
//! [`AppError`] is the single error type crossing the HTTP boundary. Typed
//! component errors ([`CheckoutError`](crate::orders::CheckoutError),
//! [`TransitionError`](crate::orders::TransitionError),
//! [`RepoError`](crate::db::repository::RepoError)) convert into it at the
//! handler layer. The response body is always `{error, message}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::models::OrderStatus;
use shared::response::ErrorBody;
use std::fmt;
use tracing::error;

use crate::db::repository::RepoError;

/// Which phase of the two-phase order write failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePhase {
    Header,
    Lines,
}

impl fmt::Display for WritePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WritePhase::Header => write!(f, "header"),
            WritePhase::Lines => write!(f, "lines"),
        }
    }
}

/// Application error
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Authentication (401) ==========
    #[error("Authentication required")]
    Unauthorized,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    // ========== Authorization (403) ==========
    #[error("Permission denied: {0}")]
    Forbidden(String),

    // ========== Business errors (4xx) ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Conflict: {0}")]
    Conflict(String),

    // ========== Persistence errors (5xx) ==========
    #[error("Order write failed during {phase} insert: {message}")]
    PersistFailed { phase: WritePhase, message: String },

    /// Compensation delete failed after a line-insert failure: a header may
    /// survive with zero lines until the reconciliation sweep removes it.
    /// Surfaced distinctly, never masked as an ordinary failure.
    #[error("Order {order_id} compensation failed: {message}")]
    CompensationFailed { order_id: String, message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

/// Result type for handlers
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    // ========== Helper constructors ==========

    pub fn unauthorized() -> Self {
        Self::Unauthorized
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken(message.into())
    }

    pub fn token_expired() -> Self {
        Self::TokenExpired
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
            ),
            AppError::TokenExpired => {
                (StatusCode::UNAUTHORIZED, "token_expired", self.to_string())
            }
            AppError::InvalidToken(_) => {
                (StatusCode::UNAUTHORIZED, "invalid_token", self.to_string())
            }
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden", self.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            AppError::InvalidTransition { .. } => (
                StatusCode::BAD_REQUEST,
                "invalid_transition",
                self.to_string(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::PersistFailed { phase, message } => {
                error!(phase = %phase, error = %message, "Order persistence failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "persist_failed",
                    format!("Failed to persist order {phase}"),
                )
            }
            AppError::CompensationFailed { order_id, message } => {
                error!(
                    order_id = %order_id,
                    error = %message,
                    "Compensation failed, orphan header may remain"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "compensation_failed",
                    "Failed to persist order items and to roll back the order".to_string(),
                )
            }
            AppError::Database(msg) => {
                error!(error = %msg, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "Database error".to_string(),
                )
            }
            AppError::Internal(err) => {
                error!(error = ?err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Conflict(msg) => AppError::Conflict(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            AppError::unauthorized().into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::forbidden("nope").into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::validation("bad").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidTransition {
                from: OrderStatus::Completed,
                to: OrderStatus::Preparing,
            }
            .into_response()
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::CompensationFailed {
                order_id: "o1".into(),
                message: "delete failed".into(),
            }
            .into_response()
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
