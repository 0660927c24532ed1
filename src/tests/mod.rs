pub mod common;
mod atomic_store_write;
mod http_issuer;
mod store_expiration;
