//! # toodoo_core
//!
//! Core domain logic for Toodoo: list membership, hash-based participant
//! authentication, item rules, persistence and mail notifications.

pub mod auth;
pub mod guards;
pub mod lists;
pub mod membership;
pub mod migrate;
pub mod models;
pub mod notify;
pub mod store;
pub mod validation;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
