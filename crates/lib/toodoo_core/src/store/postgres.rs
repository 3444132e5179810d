//! PostgreSQL store backed by `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{ItemInsert, Result, Store, StoreError, StoreTx};
use crate::models::{
    ItemStatus, Membership, ParticipantRole, TodoList, TodoListItem, User, UserAttributes,
};

const LIST_COLUMNS: &str = "id, name, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, todo_list_id, user_id, name, position, status, deadline, created_at, updated_at";

const MEMBERSHIP_SELECT: &str = r#"
    SELECT p.todo_list_id, u.id AS user_id, u.email, u.name,
           u.created_at AS user_created_at, p.role, p.created_at AS joined_at
    FROM participants p
    JOIN users u ON u.id = p.user_id AND u.deleted_at IS NULL
"#;

#[derive(Debug, sqlx::FromRow)]
struct ListRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ListRow> for TodoList {
    fn from(row: ListRow) -> Self {
        TodoList {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MembershipRow {
    todo_list_id: Uuid,
    user_id: Uuid,
    email: String,
    name: String,
    user_created_at: DateTime<Utc>,
    role: String,
    joined_at: DateTime<Utc>,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = StoreError;

    fn try_from(row: MembershipRow) -> Result<Self> {
        Ok(Membership {
            todo_list_id: row.todo_list_id,
            user: User {
                id: row.user_id,
                email: row.email,
                name: row.name,
                created_at: row.user_created_at,
            },
            role: row.role.parse().map_err(StoreError::Corrupt)?,
            joined_at: row.joined_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    todo_list_id: Uuid,
    user_id: Uuid,
    name: String,
    position: i32,
    status: String,
    deadline: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for TodoListItem {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self> {
        Ok(TodoListItem {
            id: row.id,
            todo_list_id: row.todo_list_id,
            user_id: row.user_id,
            name: row.name,
            position: row.position,
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            deadline: row.deadline,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Store over a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn insert_list(&mut self, name: &str) -> Result<TodoList> {
        let sql = format!(
            "INSERT INTO todo_lists (id, name) VALUES ($1, $2) RETURNING {LIST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ListRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(name)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row.into())
    }

    async fn find_list(&mut self, list_id: Uuid) -> Result<Option<TodoList>> {
        let sql = format!(
            "SELECT {LIST_COLUMNS} FROM todo_lists WHERE id = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, ListRow>(&sql)
            .bind(list_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn lock_list(&mut self, list_id: Uuid) -> Result<Option<TodoList>> {
        let sql = format!(
            "SELECT {LIST_COLUMNS} FROM todo_lists \
             WHERE id = $1 AND deleted_at IS NULL FOR UPDATE"
        );
        let row = sqlx::query_as::<_, ListRow>(&sql)
            .bind(list_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_list_by_hash_digest(&mut self, digest: &str) -> Result<Option<TodoList>> {
        let row = sqlx::query_as::<_, ListRow>(
            r#"
            SELECT l.id, l.name, l.created_at, l.updated_at
            FROM todo_lists l
            JOIN participants p ON p.todo_list_id = l.id
            WHERE p.hash_digest = $1 AND l.deleted_at IS NULL
            "#,
        )
        .bind(digest)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn soft_delete_list(&mut self, list_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE todo_lists SET deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(list_id)
        .execute(&mut *self.tx)
        .await?;

        sqlx::query(
            "UPDATE todo_list_items SET deleted_at = now() \
             WHERE todo_list_id = $1 AND deleted_at IS NULL",
        )
        .bind(list_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_user_by_id(&mut self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, created_at FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, created_at FROM users \
             WHERE email = $1 AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_or_create_user(&mut self, attrs: &UserAttributes) -> Result<User> {
        // A concurrent insert of the same email makes ours a no-op; the
        // select below then sees the winner.
        sqlx::query(
            "INSERT INTO users (id, email, name) VALUES ($1, $2, $3) \
             ON CONFLICT (email) WHERE deleted_at IS NULL DO NOTHING",
        )
        .bind(Uuid::now_v7())
        .bind(&attrs.email)
        .bind(attrs.name_or_default())
        .execute(&mut *self.tx)
        .await?;

        self.find_user_by_email(&attrs.email)
            .await?
            .ok_or(StoreError::Db(sqlx::Error::RowNotFound))
    }

    async fn current_participants(&mut self, list_id: Uuid) -> Result<Vec<Membership>> {
        // now() is fixed per transaction, so rows attached together tie on
        // created_at.
        let sql = format!(
            "{MEMBERSHIP_SELECT} WHERE p.todo_list_id = $1 \
             ORDER BY p.role = 'creator' DESC, p.created_at, u.email"
        );
        let rows = sqlx::query_as::<_, MembershipRow>(&sql)
            .bind(list_id)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.into_iter().map(Membership::try_from).collect()
    }

    async fn attach(
        &mut self,
        list_id: Uuid,
        user_id: Uuid,
        role: ParticipantRole,
        hash_digest: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO participants (todo_list_id, user_id, role, hash_digest) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (todo_list_id, user_id) DO NOTHING",
        )
        .bind(list_id)
        .bind(user_id)
        .bind(role.as_str())
        .bind(hash_digest)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn participant_by_hash_digest(
        &mut self,
        list_id: Uuid,
        digest: &str,
    ) -> Result<Option<Membership>> {
        let sql = format!("{MEMBERSHIP_SELECT} WHERE p.todo_list_id = $1 AND p.hash_digest = $2");
        let row = sqlx::query_as::<_, MembershipRow>(&sql)
            .bind(list_id)
            .bind(digest)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(Membership::try_from).transpose()
    }

    async fn current_items(&mut self, list_id: Uuid) -> Result<Vec<TodoListItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM todo_list_items \
             WHERE todo_list_id = $1 AND deleted_at IS NULL \
             ORDER BY position ASC"
        );
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(list_id)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.into_iter().map(TodoListItem::try_from).collect()
    }

    async fn find_item(&mut self, item_id: Uuid) -> Result<Option<TodoListItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM todo_list_items WHERE id = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(item_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(TodoListItem::try_from).transpose()
    }

    async fn insert_item(&mut self, insert: ItemInsert<'_>) -> Result<TodoListItem> {
        let sql = format!(
            r#"
            INSERT INTO todo_list_items
                (id, todo_list_id, user_id, name, position, status, deadline)
            SELECT $1, $2, $3, $4, COALESCE(MAX(position), 0) + 1, $5, $6
            FROM todo_list_items
            WHERE todo_list_id = $2 AND deleted_at IS NULL
            RETURNING {ITEM_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(insert.todo_list_id)
            .bind(insert.user_id)
            .bind(insert.name)
            .bind(insert.status.as_str())
            .bind(insert.deadline)
            .fetch_one(&mut *self.tx)
            .await?;
        row.try_into()
    }

    async fn update_item_status(
        &mut self,
        item_id: Uuid,
        status: ItemStatus,
    ) -> Result<TodoListItem> {
        let sql = format!(
            "UPDATE todo_list_items SET status = $1, updated_at = now() \
             WHERE id = $2 AND deleted_at IS NULL RETURNING {ITEM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(status.as_str())
            .bind(item_id)
            .fetch_one(&mut *self.tx)
            .await?;
        row.try_into()
    }

    async fn update_item_deadline(
        &mut self,
        item_id: Uuid,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<TodoListItem> {
        let sql = format!(
            "UPDATE todo_list_items SET deadline = $1, updated_at = now() \
             WHERE id = $2 AND deleted_at IS NULL RETURNING {ITEM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(deadline)
            .bind(item_id)
            .fetch_one(&mut *self.tx)
            .await?;
        row.try_into()
    }

    async fn soft_delete_item(&mut self, item_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE todo_list_items SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(item_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_item_positions(&mut self, list_id: Uuid, item_ids: &[Uuid]) -> Result<()> {
        for (index, item_id) in item_ids.iter().enumerate() {
            sqlx::query(
                "UPDATE todo_list_items SET position = $1, updated_at = now() \
                 WHERE id = $2 AND todo_list_id = $3 AND deleted_at IS NULL",
            )
            .bind(index as i32 + 1)
            .bind(item_id)
            .bind(list_id)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Runs against a real database only when `TOODOO_TEST_DATABASE_URL` is set.

    use super::*;
    use crate::models::UserAttributes;

    async fn test_store() -> Option<PgStore> {
        let url = std::env::var("TOODOO_TEST_DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url).await.expect("connect to test database");
        crate::migrate::migrate(&pool).await.expect("migrate");
        Some(PgStore::new(pool))
    }

    #[tokio::test]
    async fn attach_twice_keeps_one_row() {
        let Some(store) = test_store().await else {
            eprintln!("TOODOO_TEST_DATABASE_URL not set, skipping");
            return;
        };

        let email = format!("{}@pg.example", Uuid::now_v7());
        let mut tx = store.begin().await.unwrap();
        let list = tx.insert_list("pg attach").await.unwrap();
        let user = tx
            .find_or_create_user(&UserAttributes::from_email(email.as_str()))
            .await
            .unwrap();
        let again = tx
            .find_or_create_user(&UserAttributes::from_email(email.as_str()))
            .await
            .unwrap();
        assert_eq!(user.id, again.id);

        let digest = Uuid::now_v7().to_string();
        assert!(tx.attach(list.id, user.id, ParticipantRole::Creator, &digest).await.unwrap());
        assert!(!tx
            .attach(list.id, user.id, ParticipantRole::Participant, "other")
            .await
            .unwrap());
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(1, tx.current_participants(list.id).await.unwrap().len());
        let found = tx.find_list_by_hash_digest(&digest).await.unwrap();
        assert_eq!(Some(list.id), found.map(|l| l.id));
    }

    #[tokio::test]
    async fn rolled_back_list_is_absent() {
        let Some(store) = test_store().await else {
            eprintln!("TOODOO_TEST_DATABASE_URL not set, skipping");
            return;
        };

        let mut tx = store.begin().await.unwrap();
        let list = tx.insert_list("pg rollback").await.unwrap();
        drop(tx);

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_list(list.id).await.unwrap().is_none());
    }
}
