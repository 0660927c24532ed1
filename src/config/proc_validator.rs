//! Configuration validation with aggregated errors.
//! Every issue is collected into one `Vec<String>` so a broken config is
//! reported in a single pass:
//!   * issuer endpoint, timeout and ttl bounds
//!   * pool defaults against the ttl bounds and request limits
//!   * server / metrics paths

use tracing::{info, warn};

use crate::config::service::{
    GenericSourceValue, IssuerConfig, PoolConfig, ServiceConfig, MAX_TTL_SECONDS_LIMIT,
};
use crate::config::settings::SettingsConfig;

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_issuer(&cfg.issuer, &mut errors);
    validate_pool(&cfg.pool, &cfg.issuer, &mut errors);

    if cfg.store.path.as_os_str().is_empty() {
        errors.push("store.path must not be empty".to_string());
    }

    if errors.is_empty() {
        info!("config validation passed");
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' is not a valid port",
            settings.server.port
        ));
    }
    if settings.metrics.is_enabled && !settings.metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            settings.metrics.path
        ));
    }
    if let Some(logging) = &settings.logging {
        let level = logging.level.to_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' must be one of trace, debug, info, warn, error",
                logging.level
            ));
        }
    }
}

fn validate_issuer(issuer: &IssuerConfig, errors: &mut Vec<String>) {
    if issuer.url.trim().is_empty() {
        errors.push("issuer.url must not be empty".to_string());
    } else if !(issuer.url.starts_with("http://") || issuer.url.starts_with("https://")) {
        errors.push(format!("issuer.url '{}' must be an http(s) url", issuer.url));
    }
    if issuer.timeout_ms == 0 {
        errors.push("issuer.timeout_ms must be > 0".to_string());
    }
    if issuer.min_ttl_seconds == 0 {
        errors.push("issuer.min_ttl_seconds must be > 0".to_string());
    }
    if issuer.min_ttl_seconds > issuer.max_ttl_seconds {
        errors.push(format!(
            "issuer.min_ttl_seconds ({}) must be <= issuer.max_ttl_seconds ({})",
            issuer.min_ttl_seconds, issuer.max_ttl_seconds
        ));
    }
    if issuer.max_ttl_seconds > MAX_TTL_SECONDS_LIMIT {
        errors.push(format!(
            "issuer.max_ttl_seconds ({}) must be <= {}",
            issuer.max_ttl_seconds, MAX_TTL_SECONDS_LIMIT
        ));
    }
    if issuer.app_id.trim().is_empty() {
        // not fatal: every issuance will be rejected as an invalid argument
        warn!("issuer.app_id is empty; token issuance will fail until it is set");
    }
    if let Some(headers) = &issuer.headers {
        for (name, value) in headers {
            let empty = match value {
                GenericSourceValue::Literal { .. } => false,
                GenericSourceValue::FromEnv { from_env } => from_env.is_empty(),
                GenericSourceValue::FromFile { path } => path.is_empty(),
            };
            if empty {
                errors.push(format!("issuer.headers['{}'] has an empty reference", name));
            }
        }
    }
}

fn validate_pool(pool: &PoolConfig, issuer: &IssuerConfig, errors: &mut Vec<String>) {
    if pool.default_ttl_seconds < issuer.min_ttl_seconds
        || pool.default_ttl_seconds > issuer.max_ttl_seconds
    {
        errors.push(format!(
            "pool.default_ttl_seconds ({}) must be within [{}, {}]",
            pool.default_ttl_seconds, issuer.min_ttl_seconds, issuer.max_ttl_seconds
        ));
    }
    if pool.default_batch_size == 0 {
        errors.push("pool.default_batch_size must be > 0".to_string());
    }
    if pool.max_tokens_per_request == 0 {
        errors.push("pool.max_tokens_per_request must be > 0".to_string());
    }
    if pool.default_count > pool.max_tokens_per_request {
        errors.push(format!(
            "pool.default_count ({}) exceeds pool.max_tokens_per_request ({})",
            pool.default_count, pool.max_tokens_per_request
        ));
    }
    if pool.default_total_tokens > pool.max_tokens_per_request {
        errors.push(format!(
            "pool.default_total_tokens ({}) exceeds pool.max_tokens_per_request ({})",
            pool.default_total_tokens, pool.max_tokens_per_request
        ));
    }
}
