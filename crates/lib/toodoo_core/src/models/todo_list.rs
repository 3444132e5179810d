use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::item::TodoListItem;
use super::user::User;

/// A named, shared todo list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoList {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role a user holds within one list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Creator,
    #[default]
    Participant,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Creator => "creator",
            ParticipantRole::Participant => "participant",
        }
    }
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipantRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creator" => Ok(ParticipantRole::Creator),
            "participant" => Ok(ParticipantRole::Participant),
            other => Err(format!("unknown participant role '{other}'")),
        }
    }
}

/// A user's current membership in a list. The access hash is never part of
/// it; only its digest is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub todo_list_id: Uuid,
    pub user: User,
    pub role: ParticipantRole,
    pub joined_at: DateTime<Utc>,
}

/// A membership created by reconciliation, carrying the plaintext access hash
/// so it can be handed to the invitee exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMembership {
    pub user: User,
    pub role: ParticipantRole,
    pub hash: String,
}

/// A list together with its live members and ordered items.
#[derive(Debug, Clone)]
pub struct ListDetails {
    pub list: TodoList,
    pub participants: Vec<Membership>,
    pub items: Vec<TodoListItem>,
}

impl ListDetails {
    /// The member holding the creator role, if any.
    pub fn creator(&self) -> Option<&User> {
        self.participants
            .iter()
            .find(|m| m.role == ParticipantRole::Creator)
            .map(|m| &m.user)
    }
}
