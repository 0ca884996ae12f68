//! Ledger HTTP API Service.
//!
//! This crate provides the transfer engine and its HTTP API:
//!
//! - Account creation and lookup
//! - Atomic fund transfers between accounts
//! - Transaction lookup and per-account history
//!
//! # Storage
//!
//! Handlers and the engine only see `Arc<dyn LedgerStore>`. The binary picks
//! PostgreSQL when a database is configured and the in-memory store otherwise.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result

pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{DatabaseConfig, ServiceConfig};
pub use engine::{AccountAdmin, TransferEngine};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
