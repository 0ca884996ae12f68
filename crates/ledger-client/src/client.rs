//! Ledger HTTP client implementation.

use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::error::ClientError;
use crate::types::{
    AccountId, AccountInfo, Amount, ApiErrorResponse, CreateAccountRequest, HealthResponse,
    TransactionId, TransactionInfo, TransactionList, TransferRequest,
};

/// Ledger API client.
///
/// Provides methods for opening accounts, transferring funds and reading
/// history.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    client: Client,
    base_url: String,
    conflict_retries: u32,
    retry_backoff: Duration,
}

impl LedgerClient {
    /// Create a new ledger client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the ledger service (e.g., `"http://ledger:8080"`)
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new ledger client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the base URL is empty or the
    /// HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base URL is empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            conflict_retries: options.conflict_retries,
            retry_backoff: Duration::from_millis(options.retry_backoff_ms),
        })
    }

    /// Open a new account.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AlreadyExists` if the ID is taken.
    pub async fn create_account(
        &self,
        account_id: AccountId,
        initial_balance: Amount,
    ) -> Result<AccountInfo, ClientError> {
        let url = format!("{}/accounts", self.base_url);
        let request = CreateAccountRequest {
            account_id,
            initial_balance,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        self.handle_response(response).await
    }

    /// Get an account.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the account does not exist.
    pub async fn get_account(&self, account_id: AccountId) -> Result<AccountInfo, ClientError> {
        let url = format!("{}/accounts/{account_id}", self.base_url);

        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Move `amount` from `source` to `destination`.
    ///
    /// A `retryable_conflict` answer means nothing was applied, so the
    /// transfer is resent up to `conflict_retries` times.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InsufficientFunds`, `ClientError::NotFound` or
    /// `ClientError::InvalidArgument` on rejection, and `ClientError::Conflict`
    /// once retries are exhausted.
    pub async fn transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Amount,
    ) -> Result<TransactionInfo, ClientError> {
        let url = format!("{}/transactions", self.base_url);
        let request = TransferRequest {
            source_account_id: source,
            destination_account_id: destination,
            amount,
        };

        let mut attempt = 0;
        loop {
            let response = self.client.post(&url).json(&request).send().await?;

            match self.handle_response(response).await {
                Err(e) if e.is_retryable() && attempt < self.conflict_retries => {
                    attempt += 1;
                    tracing::debug!(
                        attempt,
                        source = %source,
                        destination = %destination,
                        error = %e,
                        "Retrying transfer after conflict"
                    );
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                result => return result,
            }
        }
    }

    /// Get a transaction.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the transaction does not exist.
    pub async fn get_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<TransactionInfo, ClientError> {
        let url = format!("{}/transactions/{transaction_id}", self.base_url);

        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List transactions touching an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the account does not exist.
    pub async fn list_account_transactions(
        &self,
        account_id: AccountId,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<TransactionList, ClientError> {
        let url = format!("{}/accounts/{account_id}/transactions", self.base_url);

        let mut query = Vec::new();
        if let Some(limit) = limit {
            query.push(("limit", limit));
        }
        if let Some(offset) = offset {
            query.push(("offset", offset));
        }

        let response = self.client.get(&url).query(&query).send().await?;

        self.handle_response(response).await
    }

    /// Check service health. A degraded service still returns its report.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be reached.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = format!("{}/health", self.base_url);

        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            return Ok(response.json().await?);
        }
        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse error response
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let detail = api_error.error;
                let message = detail.message;

                // Map specific error codes to typed errors
                match detail.code.as_str() {
                    "invalid_argument" => Err(ClientError::InvalidArgument(message)),
                    "not_found" => Err(ClientError::NotFound(message)),
                    "already_exists" => Err(ClientError::AlreadyExists(message)),
                    "retryable_conflict" => Err(ClientError::Conflict(message)),
                    "insufficient_funds" => {
                        let amount_at = |key: &str| {
                            detail
                                .details
                                .as_ref()
                                .and_then(|d| d.get(key))
                                .and_then(serde_json::Value::as_str)
                                .and_then(|s| s.parse::<Amount>().ok())
                        };

                        match (amount_at("balance"), amount_at("required")) {
                            (Some(balance), Some(required)) => {
                                Err(ClientError::InsufficientFunds { balance, required })
                            }
                            _ => Err(ClientError::Api {
                                code: detail.code,
                                message,
                                status: status.as_u16(),
                            }),
                        }
                    }
                    _ => Err(ClientError::Api {
                        code: detail.code,
                        message,
                        status: status.as_u16(),
                    }),
                }
            }
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// How many times `transfer` resends after a retryable conflict (default: 3).
    pub conflict_retries: u32,
    /// Base delay between retries in milliseconds, multiplied by the attempt
    /// number (default: 50).
    pub retry_backoff_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            conflict_retries: 3,
            retry_backoff_ms: 50,
        }
    }
}

impl ClientOptions {
    /// Options that never retry.
    #[must_use]
    pub fn without_retries() -> Self {
        Self {
            conflict_retries: 0,
            ..Self::default()
        }
    }
}
