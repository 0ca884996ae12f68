//! Transfer handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use ledger_core::{AccountId, Amount, Transaction, TransactionId, TransactionStatus};

use super::parse_transaction_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Transaction response.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: TransactionId,
    /// Debited account.
    pub source_account_id: AccountId,
    /// Credited account.
    pub destination_account_id: AccountId,
    /// Amount moved, as a decimal string.
    pub amount: Amount,
    /// Transaction status.
    pub status: TransactionStatus,
    /// Created timestamp.
    pub created_at: String,
    /// Updated timestamp.
    pub updated_at: String,
}

impl From<&Transaction> for TransactionResponse {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id,
            source_account_id: tx.source_account_id,
            destination_account_id: tx.destination_account_id,
            amount: tx.amount,
            status: tx.status,
            created_at: tx.created_at.to_rfc3339(),
            updated_at: tx.updated_at.to_rfc3339(),
        }
    }
}

/// Transfer request.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Account to debit.
    pub source_account_id: AccountId,
    /// Account to credit.
    pub destination_account_id: AccountId,
    /// Positive amount as a decimal string.
    pub amount: Amount,
}

/// Transfer funds between two accounts.
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let Json(body) = body?;

    let tx = state
        .transfers
        .execute(
            body.source_account_id,
            body.destination_account_id,
            body.amount,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TransactionResponse::from(&tx))))
}

/// Get a transaction.
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<String>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let transaction_id = parse_transaction_id(&transaction_id)?;
    let tx = state.accounts.get_transaction(transaction_id).await?;
    Ok(Json(TransactionResponse::from(&tx)))
}
