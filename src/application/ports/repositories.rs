//! Repository Ports - 出站端口
//!
//! 定义书籍记录持久化的抽象接口
//! 具体实现在 infrastructure 层（SQLite）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::storybook::{BookId, ImageUrlSet, Slot, Title, UserId};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 待插入的书籍（图片槽位全部为空）
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: Title,
    pub theme: String,
    pub user_id: UserId,
}

/// 书籍记录
#[derive(Debug, Clone)]
pub struct BookRecord {
    pub id: BookId,
    pub title: String,
    pub theme: String,
    pub user_id: String,
    pub images: ImageUrlSet,
    pub created_at: DateTime<Utc>,
}

/// Book Repository Port
#[async_trait]
pub trait BookRepositoryPort: Send + Sync {
    /// 插入书籍，返回存储层分配的 ID
    async fn insert(&self, book: &NewBook) -> Result<BookId, RepositoryError>;

    /// 写入单个图片槽位的 URL
    ///
    /// 书籍不存在时返回 NotFound
    async fn update_slot(&self, id: BookId, slot: Slot, url: &str) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: BookId) -> Result<Option<BookRecord>, RepositoryError>;

    /// 用户的书籍，按创建时间倒序
    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<BookRecord>, RepositoryError>;

    /// 所有书籍，按创建时间倒序
    async fn find_all(&self) -> Result<Vec<BookRecord>, RepositoryError>;
}
