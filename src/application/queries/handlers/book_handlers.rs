//! Book Query Handlers

use std::sync::Arc;

use serde::Serialize;

use crate::application::error::ApplicationError;
use crate::application::ports::{BookRecord, BookRepositoryPort};
use crate::application::queries::{GetBook, ListCommunityBooks, ListUserBooks};
use crate::domain::storybook::{BookId, ImageUrlSet, UserId};

/// 书籍响应
#[derive(Debug, Clone, Serialize)]
pub struct BookResponse {
    pub id: BookId,
    pub title: String,
    pub theme: String,
    pub user_id: String,
    pub images: ImageUrlSet,
    pub created_at: String,
}

impl From<BookRecord> for BookResponse {
    fn from(record: BookRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            theme: record.theme,
            user_id: record.user_id,
            images: record.images,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// GetBook Handler
pub struct GetBookHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl GetBookHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>) -> Self {
        Self { book_repo }
    }

    pub async fn handle(&self, query: GetBook) -> Result<BookResponse, ApplicationError> {
        let book = self
            .book_repo
            .find_by_id(BookId::new(query.book_id))
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", query.book_id))?;

        Ok(BookResponse::from(book))
    }
}

/// ListUserBooks Handler
pub struct ListUserBooksHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl ListUserBooksHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>) -> Self {
        Self { book_repo }
    }

    pub async fn handle(&self, query: ListUserBooks) -> Result<Vec<BookResponse>, ApplicationError> {
        let user_id = UserId::parse(query.user_id.as_deref())
            .ok_or_else(|| ApplicationError::validation("Missing user id"))?;

        let books = self.book_repo.find_by_user(&user_id).await?;
        Ok(books.into_iter().map(BookResponse::from).collect())
    }
}

/// ListCommunityBooks Handler
pub struct ListCommunityBooksHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl ListCommunityBooksHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>) -> Self {
        Self { book_repo }
    }

    pub async fn handle(
        &self,
        _query: ListCommunityBooks,
    ) -> Result<Vec<BookResponse>, ApplicationError> {
        let books = self.book_repo.find_all().await?;
        Ok(books.into_iter().map(BookResponse::from).collect())
    }
}
