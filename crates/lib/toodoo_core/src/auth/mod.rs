//! Participant authentication by access hash.
//!
//! A request addresses a list by one of its members' access hashes. The hash
//! both selects the list and, unless the caller already presents a valid
//! token for that list, identifies the calling user.

pub mod hash;
pub mod jwt;

use thiserror::Error;
use tracing::debug;

use crate::models::{TodoList, User};
use crate::store::{Store, StoreError};

use self::hash::digest_access_hash;
use self::jwt::{AccessClaims, TokenSettings, issue_access_token};

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The hash matches no live membership. Deliberately carries no detail.
    #[error("Participant not found")]
    NotFound,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of a successful authentication.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
    /// Token to hand back to the client for subsequent requests.
    pub token: String,
}

/// Find the live list addressed by an access hash.
pub async fn resolve_list(store: &dyn Store, hash: &str) -> Result<TodoList, AuthError> {
    let mut tx = store.begin().await?;
    tx.find_list_by_hash_digest(&digest_access_hash(hash))
        .await?
        .ok_or(AuthError::NotFound)
}

/// Establish the calling user for `list`.
///
/// `established` carries the claims of a token the caller already presented.
/// Claims issued for this list are honored without looking at `hash`;
/// anything else falls back to resolving `hash` within `list`.
pub async fn authenticate(
    store: &dyn Store,
    list: &TodoList,
    hash: &str,
    established: Option<&AccessClaims>,
    settings: &TokenSettings,
) -> Result<Authenticated, AuthError> {
    let mut tx = store.begin().await?;

    if let Some(claims) = established.filter(|c| c.list == list.id)
        && let Some(user) = tx.find_user_by_id(claims.sub).await?
    {
        debug!(user_id = %user.id, list_id = %list.id, "honoring presented token");
        let token = issue_access_token(&user, list.id, settings)?;
        return Ok(Authenticated { user, token });
    }

    let membership = tx
        .participant_by_hash_digest(list.id, &digest_access_hash(hash))
        .await?
        .ok_or(AuthError::NotFound)?;

    debug!(user_id = %membership.user.id, list_id = %list.id, "authenticated by access hash");
    let token = issue_access_token(&membership.user, list.id, settings)?;
    Ok(Authenticated {
        user: membership.user,
        token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lists::{CreateList, create_list};
    use crate::models::ParticipantDescriptor;
    use crate::notify::MemoryNotifier;
    use crate::store::MemoryStore;

    fn settings() -> TokenSettings {
        TokenSettings::new("test-secret")
    }

    async fn new_list(
        store: &MemoryStore,
        creator: &str,
        participants: &[&str],
    ) -> crate::lists::CreatedList {
        let notifier = MemoryNotifier::new("http://front");
        create_list(
            store,
            &notifier,
            CreateList {
                name: "Groceries".into(),
                creator: vec![ParticipantDescriptor::from(creator)],
                participants: participants
                    .iter()
                    .map(|e| ParticipantDescriptor::from(*e))
                    .collect(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn valid_hash_authenticates_its_owner() {
        let store = MemoryStore::new();
        let created = new_list(&store, "a@x.com", &["b@x.com"]).await;
        let bob = created
            .members
            .iter()
            .find(|m| m.user.email == "b@x.com")
            .unwrap();

        let list = resolve_list(&store, &bob.hash).await.unwrap();
        assert_eq!(created.list.id, list.id);

        let auth = authenticate(&store, &list, &bob.hash, None, &settings())
            .await
            .unwrap();
        assert_eq!(bob.user.id, auth.user.id);

        let claims = jwt::verify_access_token(&auth.token, &settings()).unwrap();
        assert_eq!(list.id, claims.list);
    }

    #[tokio::test]
    async fn unknown_hash_is_not_found() {
        let store = MemoryStore::new();
        let created = new_list(&store, "a@x.com", &[]).await;

        assert!(matches!(
            resolve_list(&store, "nope").await,
            Err(AuthError::NotFound)
        ));
        assert!(matches!(
            authenticate(&store, &created.list, "nope", None, &settings()).await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn hash_of_another_list_does_not_authenticate() {
        let store = MemoryStore::new();
        let first = new_list(&store, "a@x.com", &["shared@x.com"]).await;
        let second = new_list(&store, "c@x.com", &["shared@x.com"]).await;

        let first_hash = &first.members[1].hash;
        let second_hash = &second.members[1].hash;
        assert_ne!(first_hash, second_hash);

        assert!(matches!(
            authenticate(&store, &second.list, first_hash, None, &settings()).await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn token_for_this_list_skips_hash_check() {
        let store = MemoryStore::new();
        let created = new_list(&store, "a@x.com", &[]).await;
        let creator = &created.members[0];
        let token = issue_access_token(&creator.user, created.list.id, &settings()).unwrap();
        let claims = jwt::verify_access_token(&token, &settings()).unwrap();

        let auth = authenticate(&store, &created.list, "ignored", Some(&claims), &settings())
            .await
            .unwrap();
        assert_eq!(creator.user.id, auth.user.id);
    }

    #[tokio::test]
    async fn token_for_another_list_falls_back_to_hash() {
        let store = MemoryStore::new();
        let first = new_list(&store, "a@x.com", &[]).await;
        let second = new_list(&store, "c@x.com", &[]).await;
        let token =
            issue_access_token(&first.members[0].user, first.list.id, &settings()).unwrap();
        let claims = jwt::verify_access_token(&token, &settings()).unwrap();

        let auth = authenticate(
            &store,
            &second.list,
            &second.members[0].hash,
            Some(&claims),
            &settings(),
        )
        .await
        .unwrap();
        assert_eq!(second.members[0].user.id, auth.user.id);

        assert!(matches!(
            authenticate(&store, &second.list, "bogus", Some(&claims), &settings()).await,
            Err(AuthError::NotFound)
        ));
    }
}
