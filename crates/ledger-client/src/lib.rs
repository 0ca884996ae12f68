//! Ledger Client SDK.
//!
//! This crate provides a client library for services to interact with the ledger API.
//!
//! # Example
//!
//! ```no_run
//! use ledger_client::{AccountId, LedgerClient};
//!
//! # async fn example() -> Result<(), ledger_client::ClientError> {
//! let client = LedgerClient::new("http://ledger.payments.svc:8080")?;
//! let alice = AccountId::new(1).unwrap();
//! let bob = AccountId::new(2).unwrap();
//!
//! client.create_account(alice, "100.00".parse().unwrap()).await?;
//! client.create_account(bob, "0".parse().unwrap()).await?;
//!
//! let tx = client.transfer(alice, bob, "30.5".parse().unwrap()).await?;
//! println!("Transaction {} is {}", tx.id, tx.status);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, LedgerClient};
pub use error::ClientError;
pub use types::*;
