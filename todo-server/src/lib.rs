pub mod config;
pub mod error;
pub mod routes;
pub mod store;
pub mod todo;

use axum::{routing::get, Router};
use routes::{create_todo, delete_todo, get_todo, list_todos, route_not_found, update_todo};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

pub use config::ServerConfig;
pub use error::{TodoError, TodoResult};
pub use store::TodoStore;
pub use todo::{Todo, TodoList};

#[derive(Debug, Clone)]
pub struct AppState {
    store: Arc<TodoStore>,
}

impl AppState {
    pub fn new(store: TodoStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

/// 创建Todo路由，不附加任何中间件
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/todos",
            get(list_todos)
                .post(create_todo)
                .fallback(route_not_found),
        )
        .route(
            "/todos/{id}",
            get(get_todo)
                .put(update_todo)
                .delete(delete_todo)
                .fallback(route_not_found),
        )
        .fallback(route_not_found)
        .with_state(state)
}

/// 按配置创建完整的axum应用
pub fn create_axum_app(config: &ServerConfig) -> Router {
    let state = AppState::new(TodoStore::new(&config.store_path));
    let router = create_router(state);

    info!("axum应用创建成功，存储文件: {}", config.store_path.display());
    if config.enable_cors {
        router.layer(CorsLayer::very_permissive())
    } else {
        router
    }
}
