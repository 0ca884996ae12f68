//! Account management handlers.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use ledger_core::{Account, AccountId, Amount};

use super::parse_account_id;
use super::transactions::TransactionResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Account response.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID.
    pub account_id: AccountId,
    /// Current balance as a decimal string.
    pub balance: Amount,
    /// Created timestamp.
    pub created_at: String,
    /// Last balance change.
    pub updated_at: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id,
            balance: account.balance,
            created_at: account.created_at.to_rfc3339(),
            updated_at: account.updated_at.to_rfc3339(),
        }
    }
}

/// Create account request.
///
/// `initial_balance` must be a JSON string; numbers are rejected so that no
/// value ever passes through binary floating point.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Caller-chosen positive account ID.
    pub account_id: AccountId,
    /// Opening balance, non-negative.
    pub initial_balance: Amount,
}

/// Open a new account.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let Json(body) = body?;

    let account = state
        .accounts
        .create(body.account_id, body.initial_balance)
        .await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(&account))))
}

/// Get an account.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account_id = parse_account_id(&account_id)?;
    let account = state.accounts.get(account_id).await?;
    Ok(Json(AccountResponse::from(&account)))
}

/// Pagination query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    /// Page size (1-100, default 50).
    pub limit: Option<usize>,
    /// Number of transactions to skip.
    pub offset: Option<usize>,
}

/// Transaction list response.
#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    /// Transactions, newest first.
    pub transactions: Vec<TransactionResponse>,
}

/// List transactions where the account is source or destination.
pub async fn list_account_transactions(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
    query: Result<Query<ListTransactionsQuery>, QueryRejection>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let account_id = parse_account_id(&account_id)?;
    let Query(query) = query?;

    let transactions = state
        .accounts
        .list_transactions(account_id, query.limit, query.offset.unwrap_or(0))
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: transactions.iter().map(TransactionResponse::from).collect(),
    }))
}
