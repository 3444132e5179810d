//! In-process store.
//!
//! Transactions are serialized: `begin` takes the store lock and works on a
//! copy of the state, `commit` writes the copy back.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{ItemInsert, Result, Store, StoreError, StoreTx};
use crate::models::{
    ItemStatus, Membership, ParticipantRole, TodoList, TodoListItem, User, UserAttributes,
};

#[derive(Debug, Clone)]
struct UserRow {
    user: User,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct ListRow {
    list: TodoList,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct ParticipantRow {
    todo_list_id: Uuid,
    user_id: Uuid,
    role: ParticipantRole,
    hash_digest: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ItemRow {
    item: TodoListItem,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
struct State {
    users: Vec<UserRow>,
    lists: Vec<ListRow>,
    participants: Vec<ParticipantRow>,
    items: Vec<ItemRow>,
}

impl State {
    fn live_list(&self, list_id: Uuid) -> Option<&TodoList> {
        self.lists
            .iter()
            .find(|r| r.list.id == list_id && r.deleted_at.is_none())
            .map(|r| &r.list)
    }

    fn live_user(&self, user_id: Uuid) -> Option<&User> {
        self.users
            .iter()
            .find(|r| r.user.id == user_id && r.deleted_at.is_none())
            .map(|r| &r.user)
    }

    fn membership(&self, row: &ParticipantRow) -> Option<Membership> {
        self.live_user(row.user_id).map(|user| Membership {
            todo_list_id: row.todo_list_id,
            user: user.clone(),
            role: row.role,
            joined_at: row.created_at,
        })
    }

    fn live_item_mut(&mut self, item_id: Uuid) -> Result<&mut ItemRow> {
        self.items
            .iter_mut()
            .find(|r| r.item.id == item_id && r.deleted_at.is_none())
            .ok_or(StoreError::Db(sqlx::Error::RowNotFound))
    }
}

/// Store kept entirely in memory. Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live lists.
    pub async fn list_count(&self) -> usize {
        let state = self.state.lock().await;
        state.lists.iter().filter(|r| r.deleted_at.is_none()).count()
    }

    /// Number of live users.
    pub async fn user_count(&self) -> usize {
        let state = self.state.lock().await;
        state.users.iter().filter(|r| r.deleted_at.is_none()).count()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<State>,
    working: State,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn insert_list(&mut self, name: &str) -> Result<TodoList> {
        let now = Utc::now();
        let list = TodoList {
            id: Uuid::now_v7(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.working.lists.push(ListRow {
            list: list.clone(),
            deleted_at: None,
        });
        Ok(list)
    }

    async fn find_list(&mut self, list_id: Uuid) -> Result<Option<TodoList>> {
        Ok(self.working.live_list(list_id).cloned())
    }

    async fn lock_list(&mut self, list_id: Uuid) -> Result<Option<TodoList>> {
        // The whole store is already held by this transaction.
        self.find_list(list_id).await
    }

    async fn find_list_by_hash_digest(&mut self, digest: &str) -> Result<Option<TodoList>> {
        let list_id = self
            .working
            .participants
            .iter()
            .find(|p| p.hash_digest == digest)
            .map(|p| p.todo_list_id);
        Ok(list_id.and_then(|id| self.working.live_list(id).cloned()))
    }

    async fn soft_delete_list(&mut self, list_id: Uuid) -> Result<bool> {
        let now = Utc::now();
        let Some(row) = self
            .working
            .lists
            .iter_mut()
            .find(|r| r.list.id == list_id && r.deleted_at.is_none())
        else {
            return Ok(false);
        };
        row.deleted_at = Some(now);
        for item in self
            .working
            .items
            .iter_mut()
            .filter(|r| r.item.todo_list_id == list_id && r.deleted_at.is_none())
        {
            item.deleted_at = Some(now);
        }
        Ok(true)
    }

    async fn find_user_by_id(&mut self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.working.live_user(user_id).cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>> {
        Ok(self
            .working
            .users
            .iter()
            .find(|r| r.user.email == email && r.deleted_at.is_none())
            .map(|r| r.user.clone()))
    }

    async fn find_or_create_user(&mut self, attrs: &UserAttributes) -> Result<User> {
        if let Some(user) = self.find_user_by_email(&attrs.email).await? {
            return Ok(user);
        }
        let user = User {
            id: Uuid::now_v7(),
            email: attrs.email.clone(),
            name: attrs.name_or_default(),
            created_at: Utc::now(),
        };
        self.working.users.push(UserRow {
            user: user.clone(),
            deleted_at: None,
        });
        Ok(user)
    }

    async fn current_participants(&mut self, list_id: Uuid) -> Result<Vec<Membership>> {
        Ok(self
            .working
            .participants
            .iter()
            .filter(|p| p.todo_list_id == list_id)
            .filter_map(|p| self.working.membership(p))
            .collect())
    }

    async fn attach(
        &mut self,
        list_id: Uuid,
        user_id: Uuid,
        role: ParticipantRole,
        hash_digest: &str,
    ) -> Result<bool> {
        let participants = &self.working.participants;
        if participants
            .iter()
            .any(|p| p.todo_list_id == list_id && p.user_id == user_id)
        {
            return Ok(false);
        }
        if participants.iter().any(|p| p.hash_digest == hash_digest) {
            return Err(StoreError::Conflict("access hash already in use".into()));
        }
        self.working.participants.push(ParticipantRow {
            todo_list_id: list_id,
            user_id,
            role,
            hash_digest: hash_digest.to_string(),
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn participant_by_hash_digest(
        &mut self,
        list_id: Uuid,
        digest: &str,
    ) -> Result<Option<Membership>> {
        Ok(self
            .working
            .participants
            .iter()
            .find(|p| p.todo_list_id == list_id && p.hash_digest == digest)
            .and_then(|p| self.working.membership(p)))
    }

    async fn current_items(&mut self, list_id: Uuid) -> Result<Vec<TodoListItem>> {
        let mut items: Vec<TodoListItem> = self
            .working
            .items
            .iter()
            .filter(|r| r.item.todo_list_id == list_id && r.deleted_at.is_none())
            .map(|r| r.item.clone())
            .collect();
        items.sort_by_key(|i| i.position);
        Ok(items)
    }

    async fn find_item(&mut self, item_id: Uuid) -> Result<Option<TodoListItem>> {
        Ok(self
            .working
            .items
            .iter()
            .find(|r| r.item.id == item_id && r.deleted_at.is_none())
            .map(|r| r.item.clone()))
    }

    async fn insert_item(&mut self, insert: ItemInsert<'_>) -> Result<TodoListItem> {
        let position = self
            .working
            .items
            .iter()
            .filter(|r| r.item.todo_list_id == insert.todo_list_id && r.deleted_at.is_none())
            .map(|r| r.item.position)
            .max()
            .unwrap_or(0)
            + 1;
        let now = Utc::now();
        let item = TodoListItem {
            id: Uuid::now_v7(),
            todo_list_id: insert.todo_list_id,
            user_id: insert.user_id,
            name: insert.name.to_string(),
            position,
            status: insert.status,
            deadline: insert.deadline,
            created_at: now,
            updated_at: now,
        };
        self.working.items.push(ItemRow {
            item: item.clone(),
            deleted_at: None,
        });
        Ok(item)
    }

    async fn update_item_status(
        &mut self,
        item_id: Uuid,
        status: ItemStatus,
    ) -> Result<TodoListItem> {
        let row = self.working.live_item_mut(item_id)?;
        row.item.status = status;
        row.item.updated_at = Utc::now();
        Ok(row.item.clone())
    }

    async fn update_item_deadline(
        &mut self,
        item_id: Uuid,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<TodoListItem> {
        let row = self.working.live_item_mut(item_id)?;
        row.item.deadline = deadline;
        row.item.updated_at = Utc::now();
        Ok(row.item.clone())
    }

    async fn soft_delete_item(&mut self, item_id: Uuid) -> Result<bool> {
        match self.working.live_item_mut(item_id) {
            Ok(row) => {
                row.deleted_at = Some(Utc::now());
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    async fn set_item_positions(&mut self, list_id: Uuid, item_ids: &[Uuid]) -> Result<()> {
        let now = Utc::now();
        for (index, item_id) in item_ids.iter().enumerate() {
            if let Some(row) = self.working.items.iter_mut().find(|r| {
                r.item.id == *item_id && r.item.todo_list_id == list_id && r.deleted_at.is_none()
            }) {
                row.item.position = index as i32 + 1;
                row.item.updated_at = now;
            }
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dropped_transaction_leaves_no_trace() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_list("Groceries").await.unwrap();
        tx.find_or_create_user(&UserAttributes::from_email("a@x.com"))
            .await
            .unwrap();
        drop(tx);

        assert_eq!(0, store.list_count().await);
        assert_eq!(0, store.user_count().await);
    }

    #[tokio::test]
    async fn attach_is_idempotent_per_list_and_user() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let list = tx.insert_list("Chores").await.unwrap();
        let user = tx
            .find_or_create_user(&UserAttributes::from_email("a@x.com"))
            .await
            .unwrap();

        assert!(tx.attach(list.id, user.id, ParticipantRole::Creator, "d1").await.unwrap());
        assert!(!tx.attach(list.id, user.id, ParticipantRole::Participant, "d2").await.unwrap());
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let members = tx.current_participants(list.id).await.unwrap();
        assert_eq!(1, members.len());
        assert_eq!(ParticipantRole::Creator, members[0].role);
    }

    #[tokio::test]
    async fn deleted_list_is_unreachable_by_hash() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let list = tx.insert_list("Trip").await.unwrap();
        let user = tx
            .find_or_create_user(&UserAttributes::from_email("a@x.com"))
            .await
            .unwrap();
        tx.attach(list.id, user.id, ParticipantRole::Creator, "digest")
            .await
            .unwrap();
        assert!(tx.find_list_by_hash_digest("digest").await.unwrap().is_some());

        assert!(tx.soft_delete_list(list.id).await.unwrap());
        assert!(tx.find_list_by_hash_digest("digest").await.unwrap().is_none());
        assert!(!tx.soft_delete_list(list.id).await.unwrap());
    }

    #[tokio::test]
    async fn items_are_appended_and_reordered() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let list = tx.insert_list("Trip").await.unwrap();
        let user = tx
            .find_or_create_user(&UserAttributes::from_email("a@x.com"))
            .await
            .unwrap();

        let mut ids = Vec::new();
        for name in ["tickets", "passport", "bags"] {
            let item = tx
                .insert_item(ItemInsert {
                    todo_list_id: list.id,
                    user_id: user.id,
                    name,
                    status: ItemStatus::Pending,
                    deadline: None,
                })
                .await
                .unwrap();
            ids.push(item.id);
        }
        let positions: Vec<i32> = tx
            .current_items(list.id)
            .await
            .unwrap()
            .iter()
            .map(|i| i.position)
            .collect();
        assert_eq!(vec![1, 2, 3], positions);

        ids.reverse();
        tx.set_item_positions(list.id, &ids).await.unwrap();
        let names: Vec<String> = tx
            .current_items(list.id)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(vec!["bags", "passport", "tickets"], names);
    }
}
