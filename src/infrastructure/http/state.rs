//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    SubmitStorybookHandler,
    // Query handlers
    GetBookHandler, GetStorybookJobHandler, ListCommunityBooksHandler, ListUserBooksHandler,
    // Ports
    BookRepositoryPort, JobRegistryPort,
};
use crate::infrastructure::events::EventPublisher;

/// 应用状态
///
/// 流水线在后台 Worker 中运行，HTTP 层只负责提交、查询和推送
pub struct AppState {
    // ========== Ports ==========
    pub job_registry: Arc<dyn JobRegistryPort>,
    pub book_repo: Arc<dyn BookRepositoryPort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub submit_storybook_handler: SubmitStorybookHandler,

    // ========== Query Handlers ==========
    pub get_storybook_job_handler: GetStorybookJobHandler,
    pub get_book_handler: GetBookHandler,
    pub list_user_books_handler: ListUserBooksHandler,
    pub list_community_books_handler: ListCommunityBooksHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        job_registry: Arc<dyn JobRegistryPort>,
        book_repo: Arc<dyn BookRepositoryPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            // Ports
            job_registry: job_registry.clone(),
            book_repo: book_repo.clone(),
            event_publisher,

            // Command handlers
            submit_storybook_handler: SubmitStorybookHandler::new(job_registry.clone()),

            // Query handlers
            get_storybook_job_handler: GetStorybookJobHandler::new(job_registry),
            get_book_handler: GetBookHandler::new(book_repo.clone()),
            list_user_books_handler: ListUserBooksHandler::new(book_repo.clone()),
            list_community_books_handler: ListCommunityBooksHandler::new(book_repo),
        }
    }
}
