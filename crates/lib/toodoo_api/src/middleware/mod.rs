//! Request middleware.

pub mod hash_auth;
pub mod list_item;
