//! List and item operations.
//!
//! Each operation runs in a single store transaction. Notifications go out
//! only after the transaction has committed.

use chrono::{DateTime, Months, NaiveTime, Utc};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::guards::{has_item, is_expired, is_participant, is_whole_set_of_item_ids};
use crate::membership::{attach_new_members, reconcile, resolve_users};
use crate::models::{
    ItemStatus, ListDetails, NewItem, NewMembership, ParticipantDescriptor, ParticipantRole,
    TodoList, TodoListItem, User,
};
use crate::notify::{Invitation, Notifier, RemovalNotice};
use crate::store::{ItemInsert, Store, StoreError, StoreTx};
use crate::validation::validate_name;

/// List operation errors.
#[derive(Debug, Error)]
pub enum TodoListError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A business rule rejected the operation. Nothing was written.
    #[error("{0}")]
    RuleViolation(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Input for creating a list.
#[derive(Debug, Clone)]
pub struct CreateList {
    pub name: String,
    /// Must resolve to exactly one user.
    pub creator: Vec<ParticipantDescriptor>,
    pub participants: Vec<ParticipantDescriptor>,
}

/// A freshly created list and every membership created with it, creator
/// first.
#[derive(Debug, Clone)]
pub struct CreatedList {
    pub list: TodoList,
    pub members: Vec<NewMembership>,
}

impl CreatedList {
    pub fn creator(&self) -> Option<&NewMembership> {
        self.members
            .iter()
            .find(|m| m.role == ParticipantRole::Creator)
    }
}

/// Create a list with its creator and initial participants, then invite all
/// of them.
pub async fn create_list(
    store: &dyn Store,
    notifier: &dyn Notifier,
    input: CreateList,
) -> Result<CreatedList, TodoListError> {
    validate_name("List", &input.name).map_err(TodoListError::InvalidInput)?;
    if input.creator.is_empty() {
        return Err(TodoListError::InvalidInput("A creator is required".into()));
    }

    let mut tx = store.begin().await?;
    let list = tx.insert_list(input.name.trim()).await?;

    let creators = resolve_users(&mut *tx, input.creator).await?;
    if creators.len() > 1 {
        return Err(TodoListError::InvalidInput(
            "Only one creator is admitted".into(),
        ));
    }
    let mut members = attach_new_members(&mut *tx, &list, creators, ParticipantRole::Creator).await?;
    members.extend(reconcile(&mut *tx, &list, input.participants, ParticipantRole::Participant).await?);
    tx.commit().await?;

    info!(list_id = %list.id, members = members.len(), "created todo list");

    if let Some(creator) = members.first().map(|m| m.user.clone()) {
        send_invitations(notifier, &list, &members, &creator).await;
    }
    Ok(CreatedList { list, members })
}

/// Add participants to an existing list and invite the new ones.
pub async fn invite(
    store: &dyn Store,
    notifier: &dyn Notifier,
    list: &TodoList,
    descriptors: Vec<ParticipantDescriptor>,
    inviting: &User,
) -> Result<Vec<NewMembership>, TodoListError> {
    let mut tx = store.begin().await?;
    let attached = reconcile(&mut *tx, list, descriptors, ParticipantRole::Participant).await?;
    tx.commit().await?;

    info!(list_id = %list.id, invited = attached.len(), "invited participants");
    send_invitations(notifier, list, &attached, inviting).await;
    Ok(attached)
}

/// The list with its members and ordered items.
pub async fn list_details(store: &dyn Store, list: &TodoList) -> Result<ListDetails, TodoListError> {
    let mut tx = store.begin().await?;
    let current = tx
        .find_list(list.id)
        .await?
        .ok_or_else(|| TodoListError::NotFound(format!("list {}", list.id)))?;
    let participants = tx.current_participants(list.id).await?;
    let items = tx.current_items(list.id).await?;
    Ok(ListDetails {
        list: current,
        participants,
        items,
    })
}

/// Soft-delete a list and its items, then tell every other participant.
pub async fn delete_list(
    store: &dyn Store,
    notifier: &dyn Notifier,
    list: &TodoList,
    deleter: &User,
) -> Result<(), TodoListError> {
    let mut tx = store.begin().await?;
    tx.lock_list(list.id)
        .await?
        .ok_or_else(|| TodoListError::NotFound(format!("list {}", list.id)))?;
    let participants = tx.current_participants(list.id).await?;
    tx.soft_delete_list(list.id).await?;
    tx.commit().await?;

    info!(list_id = %list.id, deleted_by = %deleter.id, "deleted todo list");

    for member in participants.into_iter().filter(|m| m.user.email != deleter.email) {
        let notice = RemovalNotice {
            list: list.clone(),
            participant: member.user,
            removed_by: deleter.clone(),
        };
        if let Err(e) = notifier.send_removal_notice(&notice).await {
            warn!(list_id = %list.id, to = %notice.participant.email, "removal notice failed: {e}");
        }
    }
    Ok(())
}

/// Start of today (UTC) plus one calendar month.
pub fn default_deadline(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    today
        .checked_add_months(Months::new(1))
        .unwrap_or(today)
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Append an item to the list on behalf of `user`, who must be a member.
pub async fn add_item(
    store: &dyn Store,
    list: &TodoList,
    user: &User,
    item: NewItem,
) -> Result<TodoListItem, TodoListError> {
    validate_name("Item", &item.name).map_err(TodoListError::InvalidInput)?;

    let mut tx = store.begin().await?;
    tx.lock_list(list.id)
        .await?
        .ok_or_else(|| TodoListError::NotFound(format!("list {}", list.id)))?;
    let participants = tx.current_participants(list.id).await?;
    if !is_participant(&participants, user.id) {
        return Err(TodoListError::RuleViolation(format!(
            "User {} is not a participant of {}",
            user.name, list.name
        )));
    }

    let created = tx
        .insert_item(ItemInsert {
            todo_list_id: list.id,
            user_id: user.id,
            name: item.name.trim(),
            status: ItemStatus::Pending,
            deadline: Some(item.deadline.unwrap_or_else(|| default_deadline(Utc::now()))),
        })
        .await?;
    tx.commit().await?;
    Ok(created)
}

/// Live item `item_id` of `list`, or not-found.
async fn item_of_list(
    tx: &mut dyn StoreTx,
    list: &TodoList,
    item_id: Uuid,
) -> Result<TodoListItem, TodoListError> {
    tx.find_item(item_id)
        .await?
        .filter(|item| has_item(list, item))
        .ok_or_else(|| TodoListError::NotFound(format!("item {item_id}")))
}

/// Flip an item between pending and done. Expired items are rejected.
pub async fn toggle_status(
    store: &dyn Store,
    list: &TodoList,
    item_id: Uuid,
) -> Result<TodoListItem, TodoListError> {
    let mut tx = store.begin().await?;
    let item = item_of_list(&mut *tx, list, item_id).await?;
    if is_expired(&item, Utc::now()) {
        return Err(TodoListError::RuleViolation(format!(
            "{} has expired",
            item.name
        )));
    }
    let updated = tx.update_item_status(item.id, item.status.toggled()).await?;
    tx.commit().await?;
    Ok(updated)
}

/// Set or clear an item's deadline.
pub async fn change_deadline(
    store: &dyn Store,
    list: &TodoList,
    item_id: Uuid,
    deadline: Option<DateTime<Utc>>,
) -> Result<TodoListItem, TodoListError> {
    let mut tx = store.begin().await?;
    let item = item_of_list(&mut *tx, list, item_id).await?;
    let updated = tx.update_item_deadline(item.id, deadline).await?;
    tx.commit().await?;
    Ok(updated)
}

pub async fn delete_item(
    store: &dyn Store,
    list: &TodoList,
    item_id: Uuid,
) -> Result<(), TodoListError> {
    let mut tx = store.begin().await?;
    let item = item_of_list(&mut *tx, list, item_id).await?;
    tx.soft_delete_item(item.id).await?;
    tx.commit().await?;
    Ok(())
}

/// Reorder a list's items. `item_ids` must name every live item exactly
/// once.
pub async fn reorder_items(
    store: &dyn Store,
    list: &TodoList,
    item_ids: Vec<Uuid>,
) -> Result<Vec<TodoListItem>, TodoListError> {
    let mut tx = store.begin().await?;
    tx.lock_list(list.id)
        .await?
        .ok_or_else(|| TodoListError::NotFound(format!("list {}", list.id)))?;
    let items = tx.current_items(list.id).await?;
    if !is_whole_set_of_item_ids(&items, &item_ids) {
        return Err(TodoListError::RuleViolation("Wrong list's items.".into()));
    }
    tx.set_item_positions(list.id, &item_ids).await?;
    let reordered = tx.current_items(list.id).await?;
    tx.commit().await?;
    Ok(reordered)
}

async fn send_invitations(
    notifier: &dyn Notifier,
    list: &TodoList,
    members: &[NewMembership],
    inviting: &User,
) {
    for member in members {
        let invitation = Invitation {
            list: list.clone(),
            participant: member.user.clone(),
            role: member.role,
            hash: member.hash.clone(),
            inviting: inviting.clone(),
        };
        if let Err(e) = notifier.send_invitation(&invitation).await {
            warn!(list_id = %list.id, to = %member.user.email, "invitation failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::auth::resolve_list;
    use crate::models::UserAttributes;
    use crate::notify::MemoryNotifier;
    use crate::store::MemoryStore;

    fn groceries(creator: &str, participants: &[&str]) -> CreateList {
        CreateList {
            name: "Groceries".into(),
            creator: vec![creator.into()],
            participants: participants.iter().map(|e| (*e).into()).collect(),
        }
    }

    async fn setup(participants: &[&str]) -> (MemoryStore, MemoryNotifier, CreatedList) {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new("http://front");
        let created = create_list(&store, &notifier, groceries("a@x.com", participants))
            .await
            .unwrap();
        (store, notifier, created)
    }

    fn creator_of(created: &CreatedList) -> User {
        created.members[0].user.clone()
    }

    async fn new_item(store: &MemoryStore, created: &CreatedList, name: &str) -> TodoListItem {
        add_item(
            store,
            &created.list,
            &creator_of(created),
            NewItem {
                name: name.into(),
                deadline: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn create_dedups_participants_and_mails_everyone() {
        let (store, notifier, created) = setup(&["b@x.com", "b@x.com", "c@x.com"]).await;

        assert_eq!(3, created.members.len());
        assert_eq!(ParticipantRole::Creator, created.members[0].role);
        assert_eq!("a@x.com", created.creator().unwrap().user.email);

        let details = list_details(&store, &created.list).await.unwrap();
        assert_eq!(3, details.participants.len());
        assert_eq!("a@x.com", details.creator().unwrap().email);

        assert_eq!(vec!["a@x.com", "b@x.com", "c@x.com"], notifier.invited());
        let first = notifier.sent()[0].message().clone();
        assert!(first.body.contains(&format!("/todo-list/{}", created.members[0].hash)));
    }

    #[tokio::test]
    async fn creator_listed_as_participant_is_attached_once() {
        let (_, _, created) = setup(&["a@x.com", "b@x.com"]).await;
        assert_eq!(2, created.members.len());
        assert_eq!(ParticipantRole::Creator, created.members[0].role);
    }

    #[tokio::test]
    async fn two_creators_roll_back_everything() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new("http://front");
        let mut input = groceries("a@x.com", &["c@x.com"]);
        input.creator.push("b@x.com".into());

        let result = create_list(&store, &notifier, input).await;
        assert!(matches!(result, Err(TodoListError::InvalidInput(m)) if m == "Only one creator is admitted"));
        assert_eq!(0, store.list_count().await);
        assert_eq!(0, store.user_count().await);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn same_creator_twice_is_one_creator() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new("http://front");
        let mut input = groceries("a@x.com", &[]);
        input.creator.push(
            UserAttributes {
                email: "a@x.com".into(),
                name: Some("Alice".into()),
            }
            .into(),
        );

        let created = create_list(&store, &notifier, input).await.unwrap();
        assert_eq!(1, created.members.len());
    }

    #[tokio::test]
    async fn create_requires_name_and_creator() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new("http://front");

        let mut long = groceries("a@x.com", &[]);
        long.name = "x".repeat(151);
        assert!(matches!(
            create_list(&store, &notifier, long).await,
            Err(TodoListError::InvalidInput(_))
        ));

        let mut nobody = groceries("a@x.com", &[]);
        nobody.creator.clear();
        assert!(matches!(
            create_list(&store, &notifier, nobody).await,
            Err(TodoListError::InvalidInput(_))
        ));
        assert_eq!(0, store.list_count().await);
    }

    #[tokio::test]
    async fn invite_mails_only_new_members() {
        let (store, notifier, created) = setup(&["b@x.com"]).await;
        let alice = creator_of(&created);

        let attached = invite(
            &store,
            &notifier,
            &created.list,
            vec!["b@x.com".into(), "d@x.com".into()],
            &alice,
        )
        .await
        .unwrap();

        assert_eq!(1, attached.len());
        assert_eq!("d@x.com", attached[0].user.email);
        assert_eq!(vec!["a@x.com", "b@x.com", "d@x.com"], notifier.invited());
        let last = notifier.sent().last().unwrap().message().clone();
        assert!(last.subject.contains("a invited you"));

        let again = invite(&store, &notifier, &created.list, vec!["d@x.com".into()], &alice)
            .await
            .unwrap();
        assert!(again.is_empty());
        assert_eq!(3, notifier.invited().len());
    }

    #[tokio::test]
    async fn undeliverable_participant_rejects_the_whole_list() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new("http://front");

        let err = create_list(&store, &notifier, groceries("a@x.com", &["b@x.com>"]))
            .await
            .unwrap_err();

        assert!(matches!(err, TodoListError::InvalidInput(_)));
        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_user_by_email("b@x.com>").await.unwrap().is_none());
        assert!(tx.find_user_by_email("a@x.com").await.unwrap().is_none());
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_invites_attach_a_newcomer_once() {
        let (store, notifier, created) = setup(&[]).await;
        let alice = creator_of(&created);

        let (left, right) = tokio::join!(
            invite(&store, &notifier, &created.list, vec!["d@x.com".into()], &alice),
            invite(&store, &notifier, &created.list, vec!["d@x.com".into()], &alice),
        );
        let (left, right) = (left.unwrap(), right.unwrap());

        assert_eq!(1, left.len() + right.len());
        assert!(left.is_empty() || right.is_empty());
        let details = list_details(&store, &created.list).await.unwrap();
        let d_rows = details
            .participants
            .iter()
            .filter(|m| m.user.email == "d@x.com")
            .count();
        assert_eq!(1, d_rows);
        assert_eq!(vec!["a@x.com", "d@x.com"], notifier.invited());
    }

    #[tokio::test]
    async fn add_item_appends_pending_with_default_deadline() {
        let (store, _, created) = setup(&[]).await;

        let first = new_item(&store, &created, "milk").await;
        let second = new_item(&store, &created, "eggs").await;

        assert_eq!(1, first.position);
        assert_eq!(2, second.position);
        assert_eq!(ItemStatus::Pending, first.status);
        assert_eq!(Some(default_deadline(Utc::now())), first.deadline);
    }

    #[test]
    fn default_deadline_is_midnight_a_month_out() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 15, 30, 0).unwrap();
        assert_eq!(
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap(),
            default_deadline(now)
        );
    }

    #[tokio::test]
    async fn non_participant_cannot_add_items() {
        let (store, notifier, created) = setup(&[]).await;
        let other = create_list(&store, &notifier, groceries("z@x.com", &[]))
            .await
            .unwrap();

        let result = add_item(
            &store,
            &created.list,
            &creator_of(&other),
            NewItem {
                name: "milk".into(),
                deadline: None,
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(TodoListError::RuleViolation(m)) if m == "User z is not a participant of Groceries"
        ));
        let details = list_details(&store, &created.list).await.unwrap();
        assert!(details.items.is_empty());
    }

    #[tokio::test]
    async fn toggle_flips_between_pending_and_done() {
        let (store, _, created) = setup(&[]).await;
        let item = new_item(&store, &created, "milk").await;

        let done = toggle_status(&store, &created.list, item.id).await.unwrap();
        assert_eq!(ItemStatus::Done, done.status);
        let pending = toggle_status(&store, &created.list, item.id).await.unwrap();
        assert_eq!(ItemStatus::Pending, pending.status);
    }

    #[tokio::test]
    async fn expired_items_cannot_be_toggled() {
        let (store, _, created) = setup(&[]).await;
        let item = new_item(&store, &created, "milk").await;
        change_deadline(
            &store,
            &created.list,
            item.id,
            Some(Utc::now() - Duration::days(1)),
        )
        .await
        .unwrap();

        let result = toggle_status(&store, &created.list, item.id).await;
        assert!(matches!(result, Err(TodoListError::RuleViolation(m)) if m == "milk has expired"));

        let details = list_details(&store, &created.list).await.unwrap();
        assert_eq!(ItemStatus::Pending, details.items[0].status);
    }

    #[tokio::test]
    async fn cleared_deadline_never_expires() {
        let (store, _, created) = setup(&[]).await;
        let item = new_item(&store, &created, "milk").await;

        let cleared = change_deadline(&store, &created.list, item.id, None)
            .await
            .unwrap();
        assert_eq!(None, cleared.deadline);
        assert!(toggle_status(&store, &created.list, item.id).await.is_ok());
    }

    #[tokio::test]
    async fn item_ops_reject_items_of_other_lists() {
        let (store, notifier, created) = setup(&[]).await;
        let other = create_list(&store, &notifier, groceries("z@x.com", &[]))
            .await
            .unwrap();
        let foreign = new_item(&store, &other, "bread").await;

        assert!(matches!(
            toggle_status(&store, &created.list, foreign.id).await,
            Err(TodoListError::NotFound(_))
        ));
        assert!(matches!(
            delete_item(&store, &created.list, foreign.id).await,
            Err(TodoListError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn reorder_requires_the_whole_set() {
        let (store, _, created) = setup(&[]).await;
        let a = new_item(&store, &created, "a").await;
        let b = new_item(&store, &created, "b").await;
        let c = new_item(&store, &created, "c").await;

        let reordered = reorder_items(&store, &created.list, vec![c.id, a.id, b.id])
            .await
            .unwrap();
        let ids: Vec<Uuid> = reordered.iter().map(|i| i.id).collect();
        assert_eq!(vec![c.id, a.id, b.id], ids);
        assert_eq!(vec![1, 2, 3], reordered.iter().map(|i| i.position).collect::<Vec<_>>());

        for bad in [vec![a.id, b.id], vec![a.id, a.id, b.id], vec![a.id, b.id, c.id, Uuid::now_v7()]] {
            assert!(matches!(
                reorder_items(&store, &created.list, bad).await,
                Err(TodoListError::RuleViolation(_))
            ));
        }
        let details = list_details(&store, &created.list).await.unwrap();
        assert_eq!(c.id, details.items[0].id);
    }

    #[tokio::test]
    async fn deleted_items_leave_the_list() {
        let (store, _, created) = setup(&[]).await;
        let a = new_item(&store, &created, "a").await;
        let b = new_item(&store, &created, "b").await;

        delete_item(&store, &created.list, a.id).await.unwrap();

        let details = list_details(&store, &created.list).await.unwrap();
        assert_eq!(vec![b.id], details.items.iter().map(|i| i.id).collect::<Vec<_>>());
        assert!(matches!(
            reorder_items(&store, &created.list, vec![a.id, b.id]).await,
            Err(TodoListError::RuleViolation(_))
        ));
    }

    #[tokio::test]
    async fn delete_list_notifies_everyone_but_the_deleter() {
        let (store, notifier, created) = setup(&["b@x.com", "c@x.com"]).await;
        let bob = created.members[1].user.clone();

        delete_list(&store, &notifier, &created.list, &bob).await.unwrap();

        let mut removed = notifier.removed();
        removed.sort();
        assert_eq!(vec!["a@x.com", "c@x.com"], removed);
        assert!(matches!(
            resolve_list(&store, &created.members[0].hash).await,
            Err(crate::auth::AuthError::NotFound)
        ));
    }
}
