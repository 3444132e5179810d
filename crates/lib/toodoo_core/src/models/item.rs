use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored item status.
///
/// `Expired` is accepted when reading but never written by status toggling;
/// expiry is derived from the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Done,
    Expired,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Done => "done",
            ItemStatus::Expired => "expired",
        }
    }

    /// Two-state toggle: pending becomes done, anything else becomes pending.
    pub fn toggled(self) -> Self {
        match self {
            ItemStatus::Pending => ItemStatus::Done,
            _ => ItemStatus::Pending,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ItemStatus::Pending),
            "done" => Ok(ItemStatus::Done),
            "expired" => Ok(ItemStatus::Expired),
            other => Err(format!("unknown item status '{other}'")),
        }
    }
}

/// An item of a todo list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoListItem {
    pub id: Uuid,
    pub todo_list_id: Uuid,
    /// Participant who added the item.
    pub user_id: Uuid,
    pub name: String,
    /// Ordering within the owning list, starting at 1.
    pub position: i32,
    pub status: ItemStatus,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TodoListItem {
    pub fn is_expired(&self) -> bool {
        crate::guards::is_expired(self, Utc::now())
    }
}

/// Input for adding an item.
#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub name: String,
    /// Falls back to one month from today when absent.
    pub deadline: Option<DateTime<Utc>>,
}
