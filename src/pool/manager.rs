use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{error, info};

use crate::cache::token::TokenRecord;
use crate::cache::token_store::{partition_by_expiry, TokenStore};
use crate::config::service::{PoolConfig, ServiceConfig};
use crate::error::{PoolError, PoolResult};
use crate::helpers::time::now_utc;
use crate::issuer::adapter::TokenSourceAdapter;
use crate::issuer::http::HttpTokenIssuer;
use crate::issuer::IssueToken;
use crate::observability::metrics::get_metrics;
use crate::pool::batching::batch_plan;

/// Status of the cached pool, as reported by [`PoolManager::read_valid`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PoolStatus {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
    pub tokens: Vec<TokenRecord>,
}

/// Owns the token store and the only path that writes it.
pub struct PoolManager<I> {
    adapter: TokenSourceAdapter<I>,
    store: TokenStore,
    app_id: String,
    batch_delay: Duration,
    max_tokens_per_request: u64,
    // serialises load-prune-append-write within this process
    write_lock: Mutex<()>,
}

impl PoolManager<HttpTokenIssuer> {
    pub fn from_config(cfg: &ServiceConfig) -> Result<Self> {
        let issuer = HttpTokenIssuer::new(&cfg.issuer)?;
        let adapter = TokenSourceAdapter::new(
            issuer,
            cfg.issuer.min_ttl_seconds,
            cfg.issuer.max_ttl_seconds,
        );
        Ok(Self::new(
            adapter,
            TokenStore::new(cfg.store.path.clone()),
            cfg.issuer.app_id.clone(),
            &cfg.pool,
        ))
    }
}

impl<I: IssueToken> PoolManager<I> {
    pub fn new(
        adapter: TokenSourceAdapter<I>,
        store: TokenStore,
        app_id: String,
        pool: &PoolConfig,
    ) -> Self {
        Self {
            adapter,
            store,
            app_id,
            batch_delay: Duration::from_millis(pool.batch_delay_ms),
            max_tokens_per_request: pool.max_tokens_per_request,
            write_lock: Mutex::new(()),
        }
    }

    pub fn adapter(&self) -> &TokenSourceAdapter<I> {
        &self.adapter
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Issue exactly `count` tokens one after another.
    ///
    /// Fail-fast: the first issuance error aborts the batch and nothing is
    /// returned. The store is never touched here.
    pub async fn generate_batch(&self, count: u64, ttl_seconds: u64) -> PoolResult<Vec<TokenRecord>> {
        self.check_request_size("count", count)?;
        self.adapter.check_ttl(ttl_seconds)?;
        self.issue_serially(count, ttl_seconds).await
    }

    /// Merge `new_tokens` into the store after pruning expired entries.
    ///
    /// Existing entries stay first, new ones are appended. Returns the merged
    /// content as written.
    pub async fn persist(&self, new_tokens: Vec<TokenRecord>) -> PoolResult<Vec<TokenRecord>> {
        let metrics = get_metrics().await;
        let _guard = self.write_lock.lock().await;

        let result: PoolResult<Vec<TokenRecord>> = async {
            let existing = self.store.load().await?;
            let (mut merged, expired) = partition_by_expiry(existing, now_utc());
            if !expired.is_empty() {
                info!("pruned {} expired tokens", expired.len());
            }
            merged.extend(new_tokens);
            self.store.save(&merged).await?;
            Ok(merged)
        }
        .await;

        match &result {
            Ok(merged) => {
                metrics.store_writes.inc();
                metrics.pooled_tokens.set(merged.len() as i64);
            }
            Err(e) => {
                metrics.store_failures.with_label_values(&[e.kind()]).inc();
                error!("failed to save tokens: {}", e);
            }
        }
        result
    }

    /// Generate `total_tokens` in batches of at most `batch_size`, pausing
    /// between batches, then persist everything once.
    ///
    /// If any batch fails, tokens from earlier batches are dropped unsaved.
    pub async fn generate_pool(
        &self,
        total_tokens: u64,
        batch_size: u64,
        ttl_seconds: u64,
    ) -> PoolResult<Vec<TokenRecord>> {
        self.check_request_size("totalTokens", total_tokens)?;
        self.adapter.check_ttl(ttl_seconds)?;
        let plan = batch_plan(total_tokens, batch_size)?;
        let batches = plan.len();

        let mut all_tokens = Vec::with_capacity(total_tokens as usize);
        for (i, size) in plan.into_iter().enumerate() {
            if i > 0 && !self.batch_delay.is_zero() {
                sleep(self.batch_delay).await;
            }
            info!("generate batch {}/{} ({} tokens)", i + 1, batches, size);
            let tokens = self.issue_serially(size, ttl_seconds).await.inspect_err(|e| {
                error!(
                    "batch {}/{} failed, discarding {} tokens from earlier batches: {}",
                    i + 1,
                    batches,
                    all_tokens.len(),
                    e
                );
            })?;
            all_tokens.extend(tokens);
        }

        self.persist(all_tokens).await
    }

    /// Read-only status: counts and the tokens still valid now.
    pub async fn read_valid(&self) -> PoolResult<PoolStatus> {
        let tokens = self.store.load().await?;
        let total = tokens.len();
        let (valid, expired) = partition_by_expiry(tokens, now_utc());
        Ok(PoolStatus {
            total,
            valid: valid.len(),
            expired: expired.len(),
            tokens: valid,
        })
    }

    async fn issue_serially(&self, count: u64, ttl_seconds: u64) -> PoolResult<Vec<TokenRecord>> {
        let mut tokens = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let record = self.adapter.issue(&self.app_id, ttl_seconds).await?;
            tokens.push(record);
        }
        if count > 0 {
            get_metrics().await.batches.inc();
            info!("generated {} tokens", tokens.len());
        }
        Ok(tokens)
    }

    fn check_request_size(&self, name: &str, value: u64) -> PoolResult<()> {
        if value > self.max_tokens_per_request {
            return Err(PoolError::invalid_argument(format!(
                "{} {} exceeds the limit of {} tokens per request",
                name, value, self.max_tokens_per_request
            )));
        }
        Ok(())
    }
}
