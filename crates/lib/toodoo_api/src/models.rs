//! Request and response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use toodoo_core::guards::is_creator;
use toodoo_core::models::{
    ItemStatus, ListDetails, Membership, OneOrMany, ParticipantDescriptor, ParticipantRole,
    TodoListItem, User,
};
use uuid::Uuid;

/// Error body returned by every failing request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTodoListRequest {
    pub name: String,
    pub creator: OneOrMany<ParticipantDescriptor>,
    #[serde(default)]
    pub participants: Option<OneOrMany<ParticipantDescriptor>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InviteRequest {
    pub participant: OneOrMany<ParticipantDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeDeadlineRequest {
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeOrderRequest {
    pub order: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub role: ParticipantRole,
}

impl From<&Membership> for ParticipantResponse {
    fn from(m: &Membership) -> Self {
        Self {
            user: UserResponse::from(&m.user),
            role: m.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse {
    pub id: Uuid,
    pub name: String,
    pub position: i32,
    pub status: ItemStatus,
    pub deadline: Option<DateTime<Utc>>,
    pub expired: bool,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TodoListItem> for ItemResponse {
    fn from(item: &TodoListItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            position: item.position,
            status: item.status,
            deadline: item.deadline,
            expired: item.is_expired(),
            user_id: item.user_id,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoListResponse {
    pub id: Uuid,
    pub name: String,
    pub creator: Option<UserResponse>,
    /// The calling participant.
    pub me: UserResponse,
    pub is_creator: bool,
    pub participants: Vec<ParticipantResponse>,
    pub items: Vec<ItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TodoListResponse {
    pub fn for_viewer(details: &ListDetails, viewer: &User) -> Self {
        Self {
            id: details.list.id,
            name: details.list.name.clone(),
            creator: details.creator().map(UserResponse::from),
            me: UserResponse::from(viewer),
            is_creator: is_creator(&details.participants, viewer.id),
            participants: details.participants.iter().map(ParticipantResponse::from).collect(),
            items: details.items.iter().map(ItemResponse::from).collect(),
            created_at: details.list.created_at,
            updated_at: details.list.updated_at,
        }
    }
}

/// Response to list creation. `hash` is the creator's access hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedTodoListResponse {
    pub id: Uuid,
    pub name: String,
    pub hash: String,
    pub creator: UserResponse,
    pub participants: Vec<ParticipantResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteResponse {
    /// Only the users that were not members before.
    pub invited: Vec<UserResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemListResponse {
    pub items: Vec<ItemResponse>,
}
