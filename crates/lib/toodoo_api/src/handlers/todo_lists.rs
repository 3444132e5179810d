//! Todo list request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use toodoo_core::lists::{self, CreateList};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::ApiJson;
use crate::middleware::hash_auth::ListContext;
use crate::models::{
    CreateTodoListRequest, CreatedTodoListResponse, InviteRequest, InviteResponse,
    ParticipantResponse, TodoListResponse, UserResponse,
};

/// `POST /api/todolist`: create a list with its creator and participants.
pub async fn store(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateTodoListRequest>,
) -> AppResult<(StatusCode, Json<CreatedTodoListResponse>)> {
    let created = lists::create_list(
        state.store.as_ref(),
        state.notifier.as_ref(),
        CreateList {
            name: body.name,
            creator: body.creator.into_vec(),
            participants: body.participants.map(|p| p.into_vec()).unwrap_or_default(),
        },
    )
    .await?;

    let creator = created
        .creator()
        .ok_or_else(|| AppError::Internal("created list has no creator".into()))?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedTodoListResponse {
            id: created.list.id,
            name: created.list.name.clone(),
            hash: creator.hash.clone(),
            creator: UserResponse::from(&creator.user),
            participants: created
                .members
                .iter()
                .map(|m| ParticipantResponse {
                    user: UserResponse::from(&m.user),
                    role: m.role,
                })
                .collect(),
        }),
    ))
}

/// `GET /api/todolist/{hash}`
pub async fn show(
    State(state): State<AppState>,
    Extension(ctx): Extension<ListContext>,
) -> AppResult<Json<TodoListResponse>> {
    let details = lists::list_details(state.store.as_ref(), &ctx.list).await?;
    Ok(Json(TodoListResponse::for_viewer(&details, &ctx.user)))
}

/// `DELETE /api/todolist/{hash}`
pub async fn destroy(
    State(state): State<AppState>,
    Extension(ctx): Extension<ListContext>,
) -> AppResult<StatusCode> {
    lists::delete_list(
        state.store.as_ref(),
        state.notifier.as_ref(),
        &ctx.list,
        &ctx.user,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/todolist/{hash}/invite`: attach new participants.
pub async fn invite(
    State(state): State<AppState>,
    Extension(ctx): Extension<ListContext>,
    ApiJson(body): ApiJson<InviteRequest>,
) -> AppResult<Json<InviteResponse>> {
    let attached = lists::invite(
        state.store.as_ref(),
        state.notifier.as_ref(),
        &ctx.list,
        body.participant.into_vec(),
        &ctx.user,
    )
    .await?;
    Ok(Json(InviteResponse {
        invited: attached.iter().map(|m| UserResponse::from(&m.user)).collect(),
    }))
}
