//! Client error types.

use ledger_core::Amount;

/// Errors that can occur when using the ledger client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response without a more specific mapping.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// The request was rejected as malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Account or transaction not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Account ID already taken.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Source balance below the requested amount.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Balance at the time of the check.
        balance: Amount,
        /// Requested amount.
        required: Amount,
    },

    /// The server aborted the operation; nothing was applied.
    #[error("retryable conflict: {0}")]
    Conflict(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Whether repeating the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
