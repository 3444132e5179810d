//! Domain models.
//!
//! These are internal domain models, distinct from the API request and
//! response shapes in `toodoo_api::models`.

pub mod descriptor;
pub mod item;
pub mod todo_list;
pub mod user;

pub use descriptor::{OneOrMany, ParticipantDescriptor};
pub use item::{ItemStatus, NewItem, TodoListItem};
pub use todo_list::{ListDetails, Membership, NewMembership, ParticipantRole, TodoList};
pub use user::{User, UserAttributes};
