//! Token Source Adapter
//!
//! The external issuance authority is reached through [`IssueToken`]. The
//! [`adapter::TokenSourceAdapter`] validates arguments and stamps every issued
//! token into a [`crate::cache::token::TokenRecord`].

use crate::error::PoolResult;

pub mod adapter;
pub mod diagnostics;
pub mod http;

/// Raw answer of the issuance authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    /// lifetime echoed by the authority, if it reports one
    pub ttl_millis: Option<u64>,
}

/// One round-trip to the issuance authority. Implementations never retry.
pub trait IssueToken {
    fn issue(
        &self,
        app_id: &str,
        ttl_millis: u64,
    ) -> impl std::future::Future<Output = PoolResult<IssuedToken>> + Send;
}
