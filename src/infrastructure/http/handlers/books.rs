//! Book Handlers

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;

use super::user_id_from;
use crate::application::{BookResponse, GetBook, ListCommunityBooks, ListUserBooks};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 当前用户的绘本，最新的在前
pub async fn list_user_books(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<BookResponse>>>, ApiError> {
    let user_id = user_id_from(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing user id".to_string()))?;

    let books = state
        .list_user_books_handler
        .handle(ListUserBooks {
            user_id: Some(user_id),
        })
        .await?;

    Ok(Json(ApiResponse::success(books)))
}

/// 社区绘本（所有用户），最新的在前
pub async fn list_community_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<BookResponse>>>, ApiError> {
    let books = state
        .list_community_books_handler
        .handle(ListCommunityBooks)
        .await?;

    Ok(Json(ApiResponse::success(books)))
}

pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BookResponse>>, ApiError> {
    let book = state.get_book_handler.handle(GetBook { book_id: id }).await?;
    Ok(Json(ApiResponse::success(book)))
}
