use http::Method;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::settings::SettingsConfig;

pub const MIN_TTL_SECONDS_DEFAULT: u64 = 30 * 60;
pub const MAX_TTL_SECONDS_DEFAULT: u64 = 7 * 24 * 60 * 60;
/// Upper bound accepted for `issuer.max_ttl_seconds` (ten years).
pub const MAX_TTL_SECONDS_LIMIT: u64 = 10 * 365 * 24 * 60 * 60;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    pub issuer: IssuerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub pool: PoolConfig,
}

/// ================================
/// Issuance authority
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct IssuerConfig {
    pub url: String,
    #[serde(with = "http_serde::method", default = "default_method")]
    pub method: Method,
    /// application the tokens are bound to
    #[serde(default)]
    pub app_id: String,
    /// used by diagnostics to build the fully qualified app resource name
    #[serde(default)]
    pub project_id: String,
    pub headers: Option<HashMap<String, GenericSourceValue>>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_min_ttl")]
    pub min_ttl_seconds: u64,
    #[serde(default = "default_max_ttl")]
    pub max_ttl_seconds: u64,
}

/// Header value sources
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum GenericSourceValue {
    Literal { value: String },
    FromEnv { from_env: String },
    FromFile { path: String },
}

/// ================================
/// Durable store
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// ================================
/// Pool generation
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct PoolConfig {
    #[serde(default = "default_count")]
    pub default_count: u64,
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,
    #[serde(default = "default_total_tokens")]
    pub default_total_tokens: u64,
    #[serde(default = "default_batch_size")]
    pub default_batch_size: u64,
    /// pause between consecutive batches
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    /// upper bound for `count` and `totalTokens` of a single request
    #[serde(default = "default_max_tokens_per_request")]
    pub max_tokens_per_request: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            default_count: default_count(),
            default_ttl_seconds: default_ttl_seconds(),
            default_total_tokens: default_total_tokens(),
            default_batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            max_tokens_per_request: default_max_tokens_per_request(),
        }
    }
}

fn default_method() -> Method {
    Method::POST
}
fn default_timeout_ms() -> u64 {
    5000
}
fn default_min_ttl() -> u64 {
    MIN_TTL_SECONDS_DEFAULT
}
fn default_max_ttl() -> u64 {
    MAX_TTL_SECONDS_DEFAULT
}
fn default_store_path() -> PathBuf {
    PathBuf::from("./data/tokens.json")
}
fn default_count() -> u64 {
    10
}
fn default_ttl_seconds() -> u64 {
    1800
}
fn default_total_tokens() -> u64 {
    100
}
fn default_batch_size() -> u64 {
    10
}
fn default_batch_delay_ms() -> u64 {
    100
}
fn default_max_tokens_per_request() -> u64 {
    1000
}
