//! Token Pool Manager: serial batch issuance, expiry-pruned merge and
//! persistence of the token store.

pub mod batching;
pub mod manager;
