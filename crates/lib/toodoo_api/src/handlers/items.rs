//! Todo list item request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use toodoo_core::lists;
use toodoo_core::models::NewItem;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::ApiJson;
use crate::middleware::hash_auth::ListContext;
use crate::middleware::list_item::ItemContext;
use crate::models::{
    ChangeDeadlineRequest, ChangeOrderRequest, CreateItemRequest, ItemListResponse, ItemResponse,
};

/// `POST /api/todolist/{hash}/items`
pub async fn store(
    State(state): State<AppState>,
    Extension(ctx): Extension<ListContext>,
    ApiJson(body): ApiJson<CreateItemRequest>,
) -> AppResult<(StatusCode, Json<ItemResponse>)> {
    let item = lists::add_item(
        state.store.as_ref(),
        &ctx.list,
        &ctx.user,
        NewItem {
            name: body.name,
            deadline: body.deadline,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ItemResponse::from(&item))))
}

/// `DELETE /api/todolist/{hash}/items/{item_id}`
pub async fn destroy(
    State(state): State<AppState>,
    Extension(ctx): Extension<ListContext>,
    Extension(ItemContext(item)): Extension<ItemContext>,
) -> AppResult<StatusCode> {
    lists::delete_item(state.store.as_ref(), &ctx.list, item.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /api/todolist/{hash}/items/{item_id}/toggle-status`
pub async fn toggle_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<ListContext>,
    Extension(ItemContext(item)): Extension<ItemContext>,
) -> AppResult<Json<ItemResponse>> {
    let item = lists::toggle_status(state.store.as_ref(), &ctx.list, item.id).await?;
    Ok(Json(ItemResponse::from(&item)))
}

/// `PUT /api/todolist/{hash}/items/{item_id}/change-deadline`
pub async fn change_deadline(
    State(state): State<AppState>,
    Extension(ctx): Extension<ListContext>,
    Extension(ItemContext(item)): Extension<ItemContext>,
    ApiJson(body): ApiJson<ChangeDeadlineRequest>,
) -> AppResult<Json<ItemResponse>> {
    let item =
        lists::change_deadline(state.store.as_ref(), &ctx.list, item.id, body.deadline).await?;
    Ok(Json(ItemResponse::from(&item)))
}

/// `PUT /api/todolist/{hash}/items/order`
pub async fn change_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<ListContext>,
    ApiJson(body): ApiJson<ChangeOrderRequest>,
) -> AppResult<Json<ItemListResponse>> {
    let items = lists::reorder_items(state.store.as_ref(), &ctx.list, body.order).await?;
    Ok(Json(ItemListResponse {
        items: items.iter().map(ItemResponse::from).collect(),
    }))
}
