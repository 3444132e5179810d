//! Membership reconciliation.
//!
//! Turns participant descriptors into users and attaches the ones that are
//! not yet members of a list, minting a fresh access hash for each new
//! membership. Everything happens inside the caller's transaction, so a
//! failure leaves neither users nor memberships behind.

use std::collections::HashSet;

use tracing::debug;

use crate::auth::hash::{digest_access_hash, mint_access_hash};
use crate::lists::TodoListError;
use crate::models::{
    NewMembership, ParticipantDescriptor, ParticipantRole, TodoList, User, UserAttributes,
};
use crate::store::StoreTx;
use crate::validation::validate_email;

/// Resolve a descriptor to the attributes used for find-or-create.
pub async fn normalize(
    tx: &mut dyn StoreTx,
    descriptor: ParticipantDescriptor,
) -> Result<UserAttributes, TodoListError> {
    let attrs = match descriptor {
        ParticipantDescriptor::Email(email) => UserAttributes::from_email(email),
        ParticipantDescriptor::Attributes(attrs) => attrs,
        ParticipantDescriptor::UserRef { id } => {
            let user = tx
                .find_user_by_id(id)
                .await?
                .ok_or_else(|| TodoListError::NotFound(format!("user {id}")))?;
            UserAttributes::from(&user)
        }
    };
    validate_email(&attrs.email).map_err(TodoListError::InvalidInput)?;
    Ok(attrs)
}

/// Find or create a user for every descriptor, deduplicated by email in
/// first-seen order.
pub async fn resolve_users(
    tx: &mut dyn StoreTx,
    descriptors: Vec<ParticipantDescriptor>,
) -> Result<Vec<User>, TodoListError> {
    let mut seen = HashSet::new();
    let mut users = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        let attrs = normalize(tx, descriptor).await?;
        let user = tx.find_or_create_user(&attrs).await?;
        if seen.insert(user.email.clone()) {
            users.push(user);
        }
    }
    Ok(users)
}

/// Attach every user not already on `list`. Returns the memberships that
/// were actually created.
pub async fn attach_new_members(
    tx: &mut dyn StoreTx,
    list: &TodoList,
    users: Vec<User>,
    role: ParticipantRole,
) -> Result<Vec<NewMembership>, TodoListError> {
    // Holds the list until commit so concurrent reconciliations see each
    // other's attachments.
    tx.lock_list(list.id)
        .await?
        .ok_or_else(|| TodoListError::NotFound(format!("list {}", list.id)))?;

    let existing: HashSet<_> = tx
        .current_participants(list.id)
        .await?
        .into_iter()
        .map(|m| m.user.id)
        .collect();

    let mut attached = Vec::new();
    for user in users.into_iter().filter(|u| !existing.contains(&u.id)) {
        let hash = mint_access_hash();
        if tx
            .attach(list.id, user.id, role, &digest_access_hash(&hash))
            .await?
        {
            debug!(list_id = %list.id, user_id = %user.id, %role, "attached member");
            attached.push(NewMembership { user, role, hash });
        }
    }
    Ok(attached)
}

/// Reconcile `descriptors` into the membership of `list` with `role`.
///
/// Idempotent per (list, email): already-present users are skipped and do
/// not appear in the result.
pub async fn reconcile(
    tx: &mut dyn StoreTx,
    list: &TodoList,
    descriptors: Vec<ParticipantDescriptor>,
    role: ParticipantRole,
) -> Result<Vec<NewMembership>, TodoListError> {
    let users = resolve_users(tx, descriptors).await?;
    attach_new_members(tx, list, users, role).await
}
