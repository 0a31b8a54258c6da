//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                GET   健康检查
//! - /api/storybook/create    POST  提交绘本任务（后台执行，通过 WS 推送进度）
//! - /api/storybook/status    POST  查询任务状态
//! - /api/books               GET   当前用户的绘本（X-User-Id）
//! - /api/books/community     GET   所有绘本
//! - /api/books/:id           GET   绘本详情
//! - /ws/storybook/:job_id    WS    任务进度
//! - /ws/events               WS    全局任务完成/失败事件
//! - /storage/*               GET   已上传的图片

use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;

use super::handlers;
use super::state::AppState;
use crate::infrastructure::adapters::STORAGE_ROUTE;

/// 创建所有路由
pub fn create_routes(storage_dir: impl AsRef<Path>) -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/storybook/:job_id", get(handlers::storybook_websocket_handler))
        .route("/ws/events", get(handlers::global_websocket_handler))
        .nest_service(STORAGE_ROUTE, ServeDir::new(storage_dir.as_ref()))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/storybook", storybook_routes())
        .nest("/books", book_routes())
}

/// Storybook 路由
fn storybook_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_storybook))
        .route("/status", post(handlers::storybook_status))
}

/// Book 路由
fn book_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::list_user_books))
        .route("/community", get(handlers::list_community_books))
        .route("/:id", get(handlers::get_book))
}
