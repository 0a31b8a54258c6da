//! Book Queries

/// 获取书籍详情
#[derive(Debug, Clone)]
pub struct GetBook {
    pub book_id: i64,
}

/// 列出当前用户的书籍
#[derive(Debug, Clone)]
pub struct ListUserBooks {
    pub user_id: Option<String>,
}

/// 列出所有书籍（社区）
#[derive(Debug, Clone)]
pub struct ListCommunityBooks;
