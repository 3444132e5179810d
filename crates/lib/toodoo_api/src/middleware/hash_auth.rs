//! Access hash middleware: resolves the `{hash}` path segment to a list and
//! the calling participant.

use std::collections::HashMap;

use axum::extract::{Path, Request, State};
use axum::http::HeaderValue;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use toodoo_core::auth::jwt::verify_access_token;
use toodoo_core::auth::{authenticate, resolve_list};
use toodoo_core::models::{TodoList, User};
use tracing::warn;

use crate::AppState;
use crate::error::AppError;

/// The list addressed by the request and the participant calling it.
#[derive(Debug, Clone)]
pub struct ListContext {
    pub list: TodoList,
    pub user: User,
}

/// Axum middleware: resolves `{hash}`, authenticates the caller (honoring a
/// `Bearer` token issued for the same list), injects [`ListContext`] and
/// returns a fresh token in the `Authorization` response header.
pub async fn require_list_hash(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let hash = params.get("hash").ok_or_else(AppError::not_found)?;

    let claims = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| verify_access_token(token, &state.config.tokens));

    let list = resolve_list(state.store.as_ref(), hash).await?;
    let auth = authenticate(
        state.store.as_ref(),
        &list,
        hash,
        claims.as_ref(),
        &state.config.tokens,
    )
    .await?;

    request.extensions_mut().insert(ListContext {
        list,
        user: auth.user,
    });

    let mut response = next.run(request).await;
    match HeaderValue::from_str(&format!("Bearer {}", auth.token)) {
        Ok(value) => {
            response.headers_mut().insert(AUTHORIZATION, value);
        }
        Err(e) => warn!("unrepresentable access token header: {e}"),
    }
    Ok(response)
}
