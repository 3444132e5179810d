//! Invariant guards for lists and items.
//!
//! Pure predicates over a list's current membership and items. Callers turn
//! a `false` into the appropriate error.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Membership, ParticipantRole, TodoList, TodoListItem};

/// True iff the creator member of the list is `user_id`.
pub fn is_creator(participants: &[Membership], user_id: Uuid) -> bool {
    participants
        .iter()
        .find(|m| m.role == ParticipantRole::Creator)
        .is_some_and(|m| m.user.id == user_id)
}

/// True iff `user_id` is among the list's current members.
pub fn is_participant(participants: &[Membership], user_id: Uuid) -> bool {
    participants.iter().any(|m| m.user.id == user_id)
}

/// True iff the live `item` belongs to `list`.
pub fn has_item(list: &TodoList, item: &TodoListItem) -> bool {
    item.todo_list_id == list.id
}

/// True iff `ids` names every current item exactly once and nothing else.
pub fn is_whole_set_of_item_ids(items: &[TodoListItem], ids: &[Uuid]) -> bool {
    if ids.len() != items.len() {
        return false;
    }
    let given: HashSet<Uuid> = ids.iter().copied().collect();
    let current: HashSet<Uuid> = items.iter().map(|i| i.id).collect();
    given.len() == ids.len() && given == current
}

/// True iff the item has a deadline strictly before `now`.
pub fn is_expired(item: &TodoListItem, now: DateTime<Utc>) -> bool {
    item.deadline.is_some_and(|deadline| deadline < now)
}
