//! Query Handlers 实现

mod book_handlers;
mod job_handlers;

pub use book_handlers::*;
pub use job_handlers::*;
