//! # toodoo_api
//!
//! HTTP API library for Toodoo.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use sqlx::PgPool;
use toodoo_core::notify::Notifier;
use toodoo_core::store::Store;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{health, items, todo_lists};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub notifier: Arc<dyn Notifier>,
    pub config: ApiConfig,
}

/// Run embedded database migrations.
///
/// Delegates to `toodoo_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    toodoo_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([axum::http::header::AUTHORIZATION]);

    let public = Router::new()
        .route(routes::GET_HEALTH, get(health::health))
        .route(routes::POST_TODOLIST, post(todo_lists::store));

    // Layers run bottom-up: the hash must authenticate before the item check.
    let item_routes = Router::new()
        .route(routes::DELETE_ITEM, delete(items::destroy))
        .route(routes::PUT_ITEM_TOGGLE_STATUS, put(items::toggle_status))
        .route(routes::PUT_ITEM_CHANGE_DEADLINE, put(items::change_deadline))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::list_item::require_list_item,
        ))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::hash_auth::require_list_hash,
        ));

    let list_routes = Router::new()
        .route(
            routes::TODOLIST_BY_HASH,
            get(todo_lists::show).delete(todo_lists::destroy),
        )
        .route(routes::POST_TODOLIST_INVITE, post(todo_lists::invite))
        .route(routes::POST_ITEMS, post(items::store))
        .route(routes::PUT_ITEMS_ORDER, put(items::change_order))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::hash_auth::require_list_hash,
        ));

    Router::new()
        .merge(public)
        .merge(list_routes)
        .merge(item_routes)
        .layer(cors)
        .with_state(state)
}
