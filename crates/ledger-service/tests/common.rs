//! Common test utilities for ledger integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::json;

use ledger_service::{create_router, AppState, ServiceConfig};
use ledger_store::{LedgerStore, MemoryStore};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct handle on the store behind the server.
    pub store: MemoryStore,
}

impl TestHarness {
    /// Create a new test harness with an empty in-memory store.
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let server = server_for(Arc::new(store.clone()));
        Self { server, store }
    }

    /// Open an account through the API and assert it was created.
    pub async fn open_account(&self, account_id: i64, initial_balance: &str) {
        self.server
            .post("/accounts")
            .json(&json!({
                "account_id": account_id,
                "initial_balance": initial_balance,
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
    }

    /// Fetch an account's balance string through the API.
    pub async fn balance(&self, account_id: i64) -> String {
        let response = self.server.get(&format!("/accounts/{account_id}")).await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["balance"].as_str().unwrap().to_string()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration used by every test server.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        database: None,
        ..ServiceConfig::default()
    }
}

/// Build a test server over an arbitrary store.
pub fn server_for(store: Arc<dyn LedgerStore>) -> TestServer {
    let state = AppState::new(store, test_config());
    let router: Router = create_router(state);
    TestServer::new(router).expect("Failed to create test server")
}
