// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Client;

use crate::cache::token::TokenRecord;
use crate::cache::token_store::TokenStore;
use crate::config::service::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::helpers::time::now_utc;
use crate::issuer::adapter::TokenSourceAdapter;
use crate::issuer::{IssueToken, IssuedToken};
use crate::pool::manager::PoolManager;

pub const APP_ID: &str = "1:123456789:web:abcdef";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// In-process issuance authority: numbered tokens, optional failure on the n-th call.
#[derive(Clone, Default)]
pub struct ScriptedIssuer {
    pub calls: Arc<AtomicUsize>,
    pub seen_app_ids: Arc<Mutex<Vec<String>>>,
    fail_at: Option<usize>,
    fail_code: String,
    rejected_app_ids: Vec<String>,
}

impl ScriptedIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`-th call (1-based) with `code`.
    pub fn failing_at(n: usize, code: &str) -> Self {
        Self {
            fail_at: Some(n),
            fail_code: code.to_owned(),
            ..Self::default()
        }
    }

    /// Reject these app ids with `app-check/invalid-app-resource-name`.
    pub fn rejecting(app_ids: &[&str]) -> Self {
        Self {
            rejected_app_ids: app_ids.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IssueToken for ScriptedIssuer {
    async fn issue(&self, app_id: &str, ttl_millis: u64) -> PoolResult<IssuedToken> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen_app_ids.lock().unwrap().push(app_id.to_owned());

        if self.fail_at == Some(n) {
            return Err(PoolError::issuance(self.fail_code.clone(), "scripted failure"));
        }
        if self.rejected_app_ids.iter().any(|id| id == app_id) {
            return Err(PoolError::issuance(
                "app-check/invalid-app-resource-name",
                "unknown app",
            ));
        }
        Ok(IssuedToken {
            token: format!("token-{}", n),
            ttl_millis: Some(ttl_millis),
        })
    }
}

pub fn fast_pool_config() -> PoolConfig {
    PoolConfig {
        batch_delay_ms: 0,
        ..PoolConfig::default()
    }
}

pub fn manager_with(issuer: ScriptedIssuer, store_path: &Path, pool: &PoolConfig) -> PoolManager<ScriptedIssuer> {
    PoolManager::new(
        TokenSourceAdapter::new(issuer, 1, 7 * 24 * 3600),
        TokenStore::new(store_path),
        APP_ID.to_owned(),
        pool,
    )
}

pub fn manager(issuer: ScriptedIssuer, store_path: &Path) -> PoolManager<ScriptedIssuer> {
    manager_with(issuer, store_path, &fast_pool_config())
}

/// Record created `age_seconds` ago with the given ttl.
pub fn record_aged(token: &str, age_seconds: i64, ttl: u64) -> TokenRecord {
    let created_at: DateTime<Utc> = now_utc() - TimeDelta::seconds(age_seconds);
    TokenRecord::new(token.to_owned(), created_at, ttl)
}
