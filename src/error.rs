//! Error types for the token pool.

use thiserror::Error;

/// Errors surfaced by the token source adapter, the pool manager and the store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Bad count, ttl, batch size or app identifier.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The issuance authority rejected or failed the request.
    #[error("issuance failed [{code}]: {message}")]
    Issuance { code: String, message: String },

    /// The store file exists but could not be read or parsed.
    #[error("failed to read token store '{path}': {reason}")]
    StoreRead { path: String, reason: String },

    /// The store file could not be written.
    #[error("failed to write token store '{path}': {reason}")]
    StoreWrite { path: String, reason: String },
}

impl PoolError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        PoolError::InvalidArgument(msg.into())
    }

    pub fn issuance(code: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::Issuance {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Stable kind label, used in HTTP error bodies and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            PoolError::InvalidArgument(_) => "invalid_argument",
            PoolError::Issuance { .. } => "issuance_error",
            PoolError::StoreRead { .. } => "store_read_error",
            PoolError::StoreWrite { .. } => "store_write_error",
        }
    }

    /// Vendor code for issuance errors.
    pub fn code(&self) -> Option<&str> {
        match self {
            PoolError::Issuance { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
