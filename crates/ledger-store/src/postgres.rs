//! PostgreSQL storage implementation.
//!
//! Row locks are taken with `SELECT ... FOR UPDATE` inside a `sqlx`
//! transaction. Dropping an uncommitted [`sqlx::Transaction`] queues a
//! `ROLLBACK` on its connection, which is what backs the unit-of-work
//! rollback-on-drop guarantee.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres};

use ledger_core::{
    Account, AccountId, Amount, NewTransaction, Transaction, TransactionId, TransactionStatus,
};

use crate::error::{Result, StoreError};
use crate::schema::MIGRATOR;
use crate::{LedgerStore, UnitOfWork};

const ACCOUNT_COLUMNS: &str = "account_id, balance, created_at, updated_at";
const TRANSACTION_COLUMNS: &str =
    "id, source_account_id, destination_account_id, amount, status, created_at, updated_at";

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Maximum simultaneous connections, i.e. the maximum number of units of
    /// work in flight.
    pub max_connections: u32,
    /// How long to wait for a free connection before giving up.
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 25,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// PostgreSQL-backed ledger store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect a new pool to `database_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or the database is unreachable.
    pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<Self> {
        let options = PgConnectOptions::from_str(database_url)?;
        Self::connect_with(options, settings).await
    }

    /// Connect a new pool with explicit connection options.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable.
    pub async fn connect_with(options: PgConnectOptions, settings: &PoolSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect_with(options)
            .await?;

        tracing::info!(
            max_connections = settings.max_connections,
            acquire_timeout = ?settings.acquire_timeout,
            "PostgreSQL connection pool established"
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

#[derive(FromRow)]
struct AccountRow {
    account_id: i64,
    balance: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self> {
        Ok(Self {
            id: AccountId::new(row.account_id).map_err(|e| StoreError::Corrupt(e.to_string()))?,
            balance: Amount::try_from_decimal(row.balance)
                .map_err(|e| StoreError::Corrupt(e.to_string()))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct TransactionRow {
    id: i64,
    source_account_id: i64,
    destination_account_id: i64,
    amount: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self> {
        let corrupt = |e: &dyn std::fmt::Display| StoreError::Corrupt(e.to_string());
        Ok(Self {
            id: TransactionId::new(row.id).map_err(|e| corrupt(&e))?,
            source_account_id: AccountId::new(row.source_account_id).map_err(|e| corrupt(&e))?,
            destination_account_id: AccountId::new(row.destination_account_id)
                .map_err(|e| corrupt(&e))?,
            amount: Amount::try_from_decimal(row.amount).map_err(|e| corrupt(&e))?,
            status: row.status.parse().map_err(|e| corrupt(&e))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn create_account(&self, id: AccountId, balance: Amount) -> Result<Account> {
        // Insert-if-absent in one statement so two concurrent creates cannot both succeed.
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "INSERT INTO accounts (account_id, balance) VALUES ($1, $2)
             ON CONFLICT (account_id) DO NOTHING
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(id.get())
        .bind(balance.as_decimal())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(StoreError::AccountExists(id))?.try_into()
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Transaction::try_from).transpose()
    }

    async fn list_transactions_by_account(
        &self,
        account_id: AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions
             WHERE source_account_id = $1 OR destination_account_id = $1
             ORDER BY id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(account_id.get())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Unit of work over one PostgreSQL transaction.
pub struct PgUnitOfWork {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = $1 FOR UPDATE"
        ))
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn set_account_balance(&mut self, id: AccountId, balance: Amount) -> Result<()> {
        let result = sqlx::query(
            "UPDATE accounts SET balance = $1, updated_at = NOW() WHERE account_id = $2",
        )
        .bind(balance.as_decimal())
        .bind(id.get())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AccountNotFound(id));
        }
        Ok(())
    }

    async fn insert_transaction(&mut self, new: &NewTransaction) -> Result<Transaction> {
        let row: TransactionRow = sqlx::query_as(&format!(
            "INSERT INTO transactions (source_account_id, destination_account_id, amount, status)
             VALUES ($1, $2, $3, $4)
             RETURNING {TRANSACTION_COLUMNS}"
        ))
        .bind(new.source_account_id.get())
        .bind(new.destination_account_id.get())
        .bind(new.amount.as_decimal())
        .bind(new.status.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            // 23503: foreign_key_violation
            let violated = match &e {
                sqlx::Error::Database(db) if db.code().is_some_and(|code| code == "23503") => {
                    Some(db.constraint().map(str::to_owned))
                }
                _ => None,
            };
            match violated {
                Some(constraint) => {
                    StoreError::AccountNotFound(missing_account(new, constraint.as_deref()))
                }
                None => StoreError::from(e),
            }
        })?;

        row.try_into()
    }

    async fn update_transaction_status(
        &mut self,
        id: TransactionId,
        status: TransactionStatus,
    ) -> Result<()> {
        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM transactions WHERE id = $1 FOR UPDATE")
                .bind(id.get())
                .fetch_optional(&mut *self.tx)
                .await?;
        let current = current
            .ok_or(StoreError::TransactionNotFound(id))?
            .parse::<TransactionStatus>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        if !current.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                transaction_id: id,
                from: current,
                to: status,
            });
        }

        sqlx::query("UPDATE transactions SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.as_str())
            .bind(id.get())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// The account a transaction insert referenced but could not find, read from
/// the violated foreign key (`transactions_<column>_fkey` by default).
fn missing_account(new: &NewTransaction, constraint: Option<&str>) -> AccountId {
    match constraint {
        Some(name) if name.contains("destination_account_id") => new.destination_account_id,
        _ => new.source_account_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: These tests require a running PostgreSQL instance
    // Run with: DATABASE_URL=postgres://... cargo test -p ledger-store -- --ignored

    async fn connect() -> PgStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let store = PgStore::connect(&url, &PoolSettings::default())
            .await
            .expect("Failed to connect");
        store.migrate().await.expect("Failed to migrate");
        store
    }

    /// Account IDs unique to one test run, so reruns against the same database do not collide.
    fn fresh_ids() -> (AccountId, AccountId) {
        let base = Utc::now().timestamp_micros() * 2;
        (AccountId::new(base).unwrap(), AccountId::new(base + 1).unwrap())
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL running
    async fn create_and_get_account() {
        let store = connect().await;
        let (a, _) = fresh_ids();

        let created = store.create_account(a, "100".parse().unwrap()).await.unwrap();
        assert_eq!(created.balance.to_string(), "100.0000000000");

        let fetched = store.get_account(a).await.unwrap().unwrap();
        assert_eq!(fetched.balance, created.balance);

        let duplicate = store.create_account(a, "1".parse().unwrap()).await;
        assert!(matches!(duplicate, Err(StoreError::AccountExists(existing)) if existing == a));
    }

    #[tokio::test]
    #[ignore]
    async fn rollback_discards_pending_transaction() {
        let store = connect().await;
        let (a, b) = fresh_ids();
        store.create_account(a, "10".parse().unwrap()).await.unwrap();
        store.create_account(b, "0".parse().unwrap()).await.unwrap();

        let mut unit = store.begin().await.unwrap();
        unit.lock_account(a).await.unwrap().unwrap();
        let tx = unit
            .insert_transaction(&NewTransaction::pending(a, b, "4".parse().unwrap()))
            .await
            .unwrap();
        unit.set_account_balance(a, "6".parse().unwrap())
            .await
            .unwrap();
        unit.rollback().await.unwrap();

        assert!(store.get_transaction(tx.id).await.unwrap().is_none());
        let account = store.get_account(a).await.unwrap().unwrap();
        assert_eq!(account.balance.to_string(), "10.0000000000");
    }

    #[tokio::test]
    #[ignore]
    async fn commit_persists_completed_transaction() {
        let store = connect().await;
        let (a, b) = fresh_ids();
        store.create_account(a, "10".parse().unwrap()).await.unwrap();
        store.create_account(b, "0".parse().unwrap()).await.unwrap();

        let mut unit = store.begin().await.unwrap();
        unit.lock_account(a).await.unwrap().unwrap();
        unit.lock_account(b).await.unwrap().unwrap();
        let tx = unit
            .insert_transaction(&NewTransaction::pending(a, b, "4".parse().unwrap()))
            .await
            .unwrap();
        unit.set_account_balance(a, "6".parse().unwrap())
            .await
            .unwrap();
        unit.set_account_balance(b, "4".parse().unwrap())
            .await
            .unwrap();
        unit.update_transaction_status(tx.id, TransactionStatus::Completed)
            .await
            .unwrap();
        unit.commit().await.unwrap();

        let stored = store.get_transaction(tx.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Completed);
        assert_eq!(stored.amount.to_string(), "4.0000000000");

        let listed = store.list_transactions_by_account(b, 10, 0).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, tx.id);
    }

    #[test]
    fn foreign_key_names_the_missing_side() {
        let (a, b) = (AccountId::new(1).unwrap(), AccountId::new(2).unwrap());
        let new = NewTransaction::pending(a, b, "1".parse().unwrap());

        assert_eq!(
            missing_account(&new, Some("transactions_destination_account_id_fkey")),
            b
        );
        assert_eq!(
            missing_account(&new, Some("transactions_source_account_id_fkey")),
            a
        );
        assert_eq!(missing_account(&new, None), a);
    }

    #[tokio::test]
    #[ignore]
    async fn insert_with_missing_account_reports_that_account() {
        let store = connect().await;
        let (a, b) = fresh_ids();
        store.create_account(a, "10".parse().unwrap()).await.unwrap();

        let mut unit = store.begin().await.unwrap();
        let result = unit
            .insert_transaction(&NewTransaction::pending(a, b, "1".parse().unwrap()))
            .await;
        assert!(matches!(result, Err(StoreError::AccountNotFound(missing)) if missing == b));

        let err: ledger_core::LedgerError = result.unwrap_err().into();
        assert_eq!(err.kind(), ledger_core::ErrorKind::AccountNotFound);
    }

    #[tokio::test]
    #[ignore]
    async fn completed_transaction_cannot_change_status() {
        let store = connect().await;
        let (a, b) = fresh_ids();
        store.create_account(a, "10".parse().unwrap()).await.unwrap();
        store.create_account(b, "0".parse().unwrap()).await.unwrap();

        let mut unit = store.begin().await.unwrap();
        let tx = unit
            .insert_transaction(&NewTransaction::pending(a, b, "1".parse().unwrap()))
            .await
            .unwrap();
        unit.update_transaction_status(tx.id, TransactionStatus::Completed)
            .await
            .unwrap();
        unit.commit().await.unwrap();

        let mut unit = store.begin().await.unwrap();
        let result = unit
            .update_transaction_status(tx.id, TransactionStatus::Pending)
            .await;
        assert!(matches!(
            result,
            Err(StoreError::InvalidTransition {
                from: TransactionStatus::Completed,
                to: TransactionStatus::Pending,
                ..
            })
        ));
        unit.rollback().await.unwrap();

        let stored = store.get_transaction(tx.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Completed);
    }

    /// One transfer in its own unit of work, locking rows in ascending ID order.
    async fn transfer(store: PgStore, from: AccountId, to: AccountId) -> Result<()> {
        let amount: Amount = "1".parse().unwrap();
        let (first, second) = if from < to { (from, to) } else { (to, from) };

        let mut unit = store.begin().await?;
        let low = unit
            .lock_account(first)
            .await?
            .ok_or(StoreError::AccountNotFound(first))?;
        let high = unit
            .lock_account(second)
            .await?
            .ok_or(StoreError::AccountNotFound(second))?;
        let (source, destination) = if from == first { (low, high) } else { (high, low) };

        let tx = unit
            .insert_transaction(&NewTransaction::pending(from, to, amount))
            .await?;
        let debited = source
            .balance
            .checked_sub(amount)
            .ok_or_else(|| StoreError::Corrupt("test account overdrawn".into()))?;
        let credited = destination
            .balance
            .checked_add(amount)
            .ok_or_else(|| StoreError::Corrupt("test account overflowed".into()))?;
        unit.set_account_balance(from, debited).await?;
        unit.set_account_balance(to, credited).await?;
        unit.update_transaction_status(tx.id, TransactionStatus::Completed)
            .await?;
        unit.commit().await
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore]
    async fn opposite_transfers_do_not_deadlock() {
        let store = connect().await;
        let (a, b) = fresh_ids();
        store.create_account(a, "100".parse().unwrap()).await.unwrap();
        store.create_account(b, "100".parse().unwrap()).await.unwrap();

        let mut handles = Vec::new();
        for round in 0..20 {
            let (from, to) = if round % 2 == 0 { (a, b) } else { (b, a) };
            handles.push(tokio::spawn(transfer(store.clone(), from, to)));
        }

        let all = async {
            for handle in handles {
                handle.await.unwrap().unwrap();
            }
        };
        tokio::time::timeout(std::time::Duration::from_secs(30), all)
            .await
            .expect("opposite-direction transfers stalled");

        let a_balance = store.get_account(a).await.unwrap().unwrap().balance;
        let b_balance = store.get_account(b).await.unwrap().unwrap().balance;
        assert_eq!(a_balance.to_string(), "100.0000000000");
        assert_eq!(b_balance.to_string(), "100.0000000000");
        assert_eq!(store.list_transactions_by_account(a, 100, 0).await.unwrap().len(), 20);
    }

    #[tokio::test]
    #[ignore]
    async fn health_check_passes() {
        let store = connect().await;
        assert!(store.health_check().await.is_ok());
    }
}
