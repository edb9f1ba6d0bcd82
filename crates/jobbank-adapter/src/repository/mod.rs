//! Persistence Adapters - Repository implementations
//!
//! These implement the `EntityStore` trait from jobbank-domain.

pub mod in_memory;
pub mod sqlite;
