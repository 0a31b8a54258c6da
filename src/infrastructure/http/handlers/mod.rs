//! HTTP Handlers

mod books;
mod ping;
mod storybook;
mod websocket;

pub use books::*;
pub use ping::*;
pub use storybook::*;
pub use websocket::*;

use axum::http::HeaderMap;

/// 外部认证层写入的用户 ID 请求头
pub const USER_ID_HEADER: &str = "x-user-id";

/// 读取非空的用户 ID
pub(crate) fn user_id_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
