//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：书籍与后台任务

mod book_queries;
mod job_queries;

pub mod handlers;

pub use book_queries::*;
pub use job_queries::*;
