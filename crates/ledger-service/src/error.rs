//! API error types and responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use ledger_core::{Amount, LedgerError};

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Resource already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Source balance below the requested amount.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance.
        balance: Amount,
        /// Requested amount.
        required: Amount,
    },

    /// Transient store failure; nothing was applied and the request may be retried.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_argument",
                msg.clone(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::AlreadyExists(msg) => {
                (StatusCode::CONFLICT, "already_exists", msg.clone(), None)
            }
            Self::InsufficientFunds { balance, required } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient_funds",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Request aborted by store conflict");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "retryable_conflict",
                    "The operation could not be completed; retry the request".to_string(),
                    Some(serde_json::json!({ "retryable": true })),
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidArgument(msg) => Self::BadRequest(msg),
            e @ (LedgerError::AccountNotFound { .. }
            | LedgerError::TransactionNotFound { .. }) => Self::NotFound(e.to_string()),
            e @ LedgerError::AccountAlreadyExists { .. } => Self::AlreadyExists(e.to_string()),
            LedgerError::InsufficientFunds {
                balance, required, ..
            } => Self::InsufficientFunds { balance, required },
            LedgerError::Conflict(msg) => Self::Unavailable(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
