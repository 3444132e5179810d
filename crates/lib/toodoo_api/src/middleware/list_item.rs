//! Item middleware: the `{item_id}` path segment must name a live item of
//! the authenticated list.

use std::collections::HashMap;

use axum::Extension;
use axum::extract::{Path, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use toodoo_core::guards::has_item;
use toodoo_core::models::TodoListItem;
use uuid::Uuid;

use super::hash_auth::ListContext;
use crate::AppState;
use crate::error::AppError;

/// The item addressed by the request.
#[derive(Debug, Clone)]
pub struct ItemContext(pub TodoListItem);

/// Axum middleware: answers 404 for unknown or foreign items and injects
/// [`ItemContext`] otherwise. Must run after `require_list_hash`.
pub async fn require_list_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<ListContext>,
    Path(params): Path<HashMap<String, String>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let item_id = params
        .get("item_id")
        .and_then(|id| Uuid::parse_str(id).ok())
        .ok_or_else(AppError::not_found)?;

    let item = {
        let mut tx = state.store.begin().await?;
        tx.find_item(item_id).await?
    }
    .filter(|item| has_item(&ctx.list, item))
    .ok_or_else(AppError::not_found)?;

    request.extensions_mut().insert(ItemContext(item));
    Ok(next.run(request).await)
}
