//! Database schema and migrations.
//!
//! The PostgreSQL schema lives in `migrations/` next to this crate's manifest
//! and is embedded into the binary at compile time:
//!
//! - `accounts`: one row per account, keyed by `account_id`; `balance` is
//!   `DECIMAL(20, 10)` and constrained to be non-negative.
//! - `transactions`: append-only transfer log keyed by a `BIGSERIAL` id, with
//!   foreign keys to both accounts and indexes on source, destination, status
//!   and creation time.

use sqlx::migrate::Migrator;

/// Embedded migrations, applied by [`crate::PgStore::migrate`].
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");
