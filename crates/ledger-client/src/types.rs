//! Request and response types for the ledger client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use ledger_core::{AccountId, Amount, TransactionId, TransactionStatus};

/// Create account request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAccountRequest {
    /// Caller-chosen account ID.
    pub account_id: AccountId,
    /// Opening balance.
    pub initial_balance: Amount,
}

/// Account as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountInfo {
    /// Account ID.
    pub account_id: AccountId,
    /// Current balance.
    pub balance: Amount,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Last balance change.
    pub updated_at: DateTime<Utc>,
}

/// Transfer request.
#[derive(Debug, Clone, Serialize)]
pub struct TransferRequest {
    /// Account to debit.
    pub source_account_id: AccountId,
    /// Account to credit.
    pub destination_account_id: AccountId,
    /// Amount to move.
    pub amount: Amount,
}

/// Transaction as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionInfo {
    /// Transaction ID.
    pub id: TransactionId,
    /// Debited account.
    pub source_account_id: AccountId,
    /// Credited account.
    pub destination_account_id: AccountId,
    /// Amount moved.
    pub amount: Amount,
    /// Transaction status.
    pub status: TransactionStatus,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Updated timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Page of an account's transaction history.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionList {
    /// Transactions, newest first.
    pub transactions: Vec<TransactionInfo>,
}

/// Health check response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Storage backend state.
    pub storage: StorageHealth,
}

/// Storage part of [`HealthResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct StorageHealth {
    /// Backend name.
    pub backend: String,
    /// `ok` or `unavailable`.
    pub status: String,
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorDetail,
}

/// API error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
    /// Additional details.
    pub details: Option<serde_json::Value>,
}
