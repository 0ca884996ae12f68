//! Ledger operations on top of a [`LedgerStore`](ledger_store::LedgerStore).

mod accounts;
mod transfer;

#[cfg(test)]
mod testing;

pub use accounts::{AccountAdmin, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
pub use transfer::TransferEngine;
