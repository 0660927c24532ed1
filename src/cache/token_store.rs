use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::cache::token::TokenRecord;
use crate::error::{PoolError, PoolResult};

/// Single JSON document holding every cached token.
///
/// A missing file reads as an empty store. A file that exists but cannot be
/// parsed is an error, never silently replaced.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> PoolResult<Vec<TokenRecord>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("token store '{}' not found, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.read_error(e)),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str::<Vec<TokenRecord>>(&raw).map_err(|e| self.read_error(e))
    }

    /// Replace the whole store: write a sibling temp file, then rename it over the target.
    pub async fn save(&self, tokens: &[TokenRecord]) -> PoolResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_error(e))?;
        }

        let content = serde_json::to_vec_pretty(tokens).map_err(|e| self.write_error(e))?;
        let tmp = self.tmp_path();

        if let Err(e) = self.write_private(&tmp, &content).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(self.write_error(e));
        }

        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(self.write_error(e));
        }

        info!("saved {} tokens to {}", tokens.len(), self.path.display());
        Ok(())
    }

    /// Create `tmp` fresh with owner-only permissions; token bytes never sit in
    /// a file readable by others, even briefly.
    async fn write_private(&self, tmp: &Path, content: &[u8]) -> std::io::Result<()> {
        match fs::remove_file(tmp).await {
            Ok(()) => debug!("removed stale temp file {}", tmp.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(tmp).await?;
        file.write_all(content).await?;
        file.sync_all().await
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("tokens"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_error(&self, e: impl std::fmt::Display) -> PoolError {
        PoolError::StoreRead {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }

    fn write_error(&self, e: impl std::fmt::Display) -> PoolError {
        PoolError::StoreWrite {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }
}

/// Split into (valid, expired) by `expires_at > now`, keeping insertion order.
pub fn partition_by_expiry(
    tokens: Vec<TokenRecord>,
    now: DateTime<Utc>,
) -> (Vec<TokenRecord>, Vec<TokenRecord>) {
    tokens.into_iter().partition(|t| t.is_valid_at(now))
}
