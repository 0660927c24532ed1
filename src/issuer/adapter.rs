use tracing::{debug, error, warn};

use crate::cache::token::TokenRecord;
use crate::error::{PoolError, PoolResult};
use crate::helpers::time::{get_instant, now_utc};
use crate::issuer::diagnostics::{
    hint_for, CODE_APP_NOT_REGISTERED, CODE_INVALID_APP_RESOURCE_NAME, CODE_PERMISSION_DENIED,
};
use crate::issuer::http::{CODE_INVALID_RESPONSE, CODE_UNAVAILABLE};
use crate::issuer::IssueToken;
use crate::observability::metrics::get_metrics;

/// Wraps an issuance authority: checks preconditions and turns its answer
/// into a [`TokenRecord`].
#[derive(Debug, Clone)]
pub struct TokenSourceAdapter<I> {
    issuer: I,
    min_ttl_seconds: u64,
    max_ttl_seconds: u64,
}

impl<I: IssueToken> TokenSourceAdapter<I> {
    pub fn new(issuer: I, min_ttl_seconds: u64, max_ttl_seconds: u64) -> Self {
        Self {
            issuer,
            min_ttl_seconds,
            max_ttl_seconds,
        }
    }

    pub fn issuer(&self) -> &I {
        &self.issuer
    }

    pub fn check_ttl(&self, ttl_seconds: u64) -> PoolResult<()> {
        self.checked_ttl_millis(ttl_seconds).map(|_| ())
    }

    fn checked_ttl_millis(&self, ttl_seconds: u64) -> PoolResult<u64> {
        if ttl_seconds == 0 {
            return Err(PoolError::invalid_argument("ttl must be a positive number of seconds"));
        }
        if ttl_seconds < self.min_ttl_seconds || ttl_seconds > self.max_ttl_seconds {
            return Err(PoolError::invalid_argument(format!(
                "ttl {}s is outside the accepted range [{}s, {}s]",
                ttl_seconds, self.min_ttl_seconds, self.max_ttl_seconds
            )));
        }
        ttl_millis(ttl_seconds)
    }

    /// Issue one token bound to `app_id`, valid for `ttl_seconds`.
    ///
    /// `created_at` is read before the round-trip, so the recorded expiry never
    /// runs past the authority's own.
    pub async fn issue(&self, app_id: &str, ttl_seconds: u64) -> PoolResult<TokenRecord> {
        if app_id.trim().is_empty() {
            return Err(PoolError::invalid_argument("app identifier must not be empty"));
        }
        let requested_millis = self.checked_ttl_millis(ttl_seconds)?;

        let metrics = get_metrics().await;
        let start = get_instant();
        let created_at = now_utc();
        metrics.issuance_requests.inc();

        let issued = self
            .issuer
            .issue(app_id, requested_millis)
            .await
            .inspect_err(|e| {
                let code = e.code().unwrap_or(e.kind());
                metrics
                    .issuance_failures
                    .with_label_values(&[failure_label(code)])
                    .inc();
                error!("token issuance for app '{}' failed: {}", app_id, e);
                if let Some(hint) = hint_for(code) {
                    warn!("{}", hint);
                }
            });
        metrics
            .issuance_duration
            .observe(start.elapsed().as_secs_f64());
        let issued = issued?;

        if let Some(ttl_millis) = issued.ttl_millis.filter(|ms| *ms != requested_millis) {
            debug!(
                "authority granted {}ms instead of requested {}s",
                ttl_millis, ttl_seconds
            );
        }

        Ok(TokenRecord::new(issued.token, created_at, ttl_seconds))
    }
}

/// Milliseconds for the authority; rejects ttls that overflow the timestamp range.
fn ttl_millis(ttl_seconds: u64) -> PoolResult<u64> {
    ttl_seconds
        .checked_mul(1000)
        .filter(|ms| *ms <= i64::MAX as u64)
        .ok_or_else(|| PoolError::invalid_argument(format!("ttl {}s is too large", ttl_seconds)))
}

/// Metric label for a failure code: known codes pass through, vendor noise
/// collapses into `other`.
pub fn failure_label(code: &str) -> &'static str {
    match code {
        CODE_INVALID_APP_RESOURCE_NAME => CODE_INVALID_APP_RESOURCE_NAME,
        CODE_APP_NOT_REGISTERED => CODE_APP_NOT_REGISTERED,
        CODE_PERMISSION_DENIED | "PERMISSION_DENIED" => CODE_PERMISSION_DENIED,
        CODE_UNAVAILABLE => CODE_UNAVAILABLE,
        CODE_INVALID_RESPONSE => CODE_INVALID_RESPONSE,
        "invalid_argument" => "invalid_argument",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_codes_collapse_into_other() {
        assert_eq!(failure_label(CODE_APP_NOT_REGISTERED), CODE_APP_NOT_REGISTERED);
        assert_eq!(failure_label("PERMISSION_DENIED"), CODE_PERMISSION_DENIED);
        assert_eq!(failure_label("http-418"), "other");
        assert_eq!(failure_label("vendor/some-new-code-7f3a"), "other");
    }

    #[test]
    fn oversized_ttl_is_rejected() {
        assert!(matches!(ttl_millis(u64::MAX / 2), Err(PoolError::InvalidArgument(_))));
        assert_eq!(ttl_millis(1800).unwrap(), 1_800_000);
    }
}
