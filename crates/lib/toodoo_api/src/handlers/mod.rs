//! Request handlers.

pub mod health;
pub mod items;
pub mod todo_lists;
