//! Persistence for users, lists, memberships and items.
//!
//! All access goes through a [`StoreTx`] obtained from [`Store::begin`].
//! Dropping a transaction without calling [`StoreTx::commit`] discards every
//! write made through it. Reads never return soft-deleted rows.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ItemStatus, Membership, ParticipantRole, TodoList, TodoListItem, User, UserAttributes,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Values for a new item row. Position is assigned by the store.
#[derive(Debug, Clone)]
pub struct ItemInsert<'a> {
    pub todo_list_id: Uuid,
    pub user_id: Uuid,
    pub name: &'a str,
    pub status: ItemStatus,
    pub deadline: Option<DateTime<Utc>>,
}

/// Entry point to a backing store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Start a transaction.
    async fn begin(&self) -> Result<Box<dyn StoreTx>>;
}

/// Operations available inside one transaction.
#[async_trait]
pub trait StoreTx: Send {
    // -- lists -------------------------------------------------------------

    async fn insert_list(&mut self, name: &str) -> Result<TodoList>;

    async fn find_list(&mut self, list_id: Uuid) -> Result<Option<TodoList>>;

    /// Like `find_list`, but holds the list against concurrent writers until
    /// the transaction ends.
    async fn lock_list(&mut self, list_id: Uuid) -> Result<Option<TodoList>>;

    /// The live list having a member whose access hash digests to `digest`.
    async fn find_list_by_hash_digest(&mut self, digest: &str) -> Result<Option<TodoList>>;

    /// Soft-delete a list and its items. Returns false if it was not live.
    async fn soft_delete_list(&mut self, list_id: Uuid) -> Result<bool>;

    // -- users -------------------------------------------------------------

    async fn find_user_by_id(&mut self, user_id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>>;

    /// Return the live user with `attrs.email`, creating it if missing.
    async fn find_or_create_user(&mut self, attrs: &UserAttributes) -> Result<User>;

    // -- memberships -------------------------------------------------------

    async fn current_participants(&mut self, list_id: Uuid) -> Result<Vec<Membership>>;

    /// Attach `user_id` to the list. Returns false, without writing, when the
    /// user is already a member.
    async fn attach(
        &mut self,
        list_id: Uuid,
        user_id: Uuid,
        role: ParticipantRole,
        hash_digest: &str,
    ) -> Result<bool>;

    async fn participant_by_hash_digest(
        &mut self,
        list_id: Uuid,
        digest: &str,
    ) -> Result<Option<Membership>>;

    // -- items -------------------------------------------------------------

    /// Live items of a list ordered by position.
    async fn current_items(&mut self, list_id: Uuid) -> Result<Vec<TodoListItem>>;

    async fn find_item(&mut self, item_id: Uuid) -> Result<Option<TodoListItem>>;

    /// Insert an item at the end of its list.
    async fn insert_item(&mut self, item: ItemInsert<'_>) -> Result<TodoListItem>;

    async fn update_item_status(&mut self, item_id: Uuid, status: ItemStatus)
    -> Result<TodoListItem>;

    async fn update_item_deadline(
        &mut self,
        item_id: Uuid,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<TodoListItem>;

    async fn soft_delete_item(&mut self, item_id: Uuid) -> Result<bool>;

    /// Assign positions `1..=n` following the order of `item_ids`.
    async fn set_item_positions(&mut self, list_id: Uuid, item_ids: &[Uuid]) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
