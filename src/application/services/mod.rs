//! Application Services - 流水线的组成部件
//!
//! - StageExecutor: 单阶段调用外部生成服务
//! - TitleExtractor: 书名抽取与回退
//! - BookPersistence: 书籍记录创建、图片上传与写回

mod book_persistence;
mod stage_executor;
mod title_extractor;

pub use book_persistence::{image_path, BookPersistence};
pub use stage_executor::{
    StageExecutor, StageExecutorConfig, StageFailure, StagePayload, StageResult,
};
pub use title_extractor::TitleExtractor;
