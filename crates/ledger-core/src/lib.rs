//! Core types and utilities for the ledger.
//!
//! This crate provides the foundational types used throughout the ledger workspace:
//!
//! - **Identifiers**: `AccountId`, `TransactionId`
//! - **Money**: `Amount`, an exact non-negative decimal with ten fractional digits
//! - **Accounts**: `Account`
//! - **Transactions**: `Transaction`, `NewTransaction`, `TransactionStatus`
//! - **Errors**: `LedgerError`, `ErrorKind`
//!
//! # Amounts
//!
//! Amounts are never converted to binary floating point. They parse from and
//! serialize to plain decimal strings, and all arithmetic is checked:
//!
//! ```
//! use ledger_core::Amount;
//!
//! let balance: Amount = "100".parse().unwrap();
//! let after = balance.checked_sub("30.5".parse().unwrap()).unwrap();
//! assert_eq!(after.to_string(), "69.5000000000");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod amount;
pub mod error;
pub mod ids;
pub mod transaction;

pub use account::Account;
pub use amount::{Amount, AmountError, AMOUNT_INTEGER_DIGITS, AMOUNT_SCALE};
pub use error::{ErrorKind, LedgerError, Result};
pub use ids::{AccountId, IdError, TransactionId};
pub use transaction::{NewTransaction, Transaction, TransactionStatus, UnknownStatus};
