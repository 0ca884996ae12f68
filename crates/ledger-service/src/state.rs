//! Application state.

use std::sync::Arc;

use ledger_store::LedgerStore;

use crate::config::ServiceConfig;
use crate::engine::{AccountAdmin, TransferEngine};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn LedgerStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Transfer execution.
    pub transfers: TransferEngine,

    /// Account creation and lookups.
    pub accounts: AccountAdmin,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, config: ServiceConfig) -> Self {
        tracing::info!(backend = store.backend(), "Ledger store attached");

        Self {
            transfers: TransferEngine::new(Arc::clone(&store)),
            accounts: AccountAdmin::new(Arc::clone(&store)),
            store,
            config,
        }
    }
}
