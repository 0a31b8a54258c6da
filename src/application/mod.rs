//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（文本/图片生成、书籍仓储、对象存储、任务登记、进度回调）
//! - services: 流水线部件（StageExecutor、TitleExtractor、BookPersistence）
//! - commands: CQRS 命令及处理器（绘本流水线编排、后台任务提交）
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use commands::{
    handlers::{CreateStorybookHandler, SubmitStorybookHandler},
    CreateStorybook, StorybookResult, SubmitStorybook, SubmitStorybookResponse,
};

pub use error::ApplicationError;

pub use ports::{
    // Generation
    CompletionRequest,
    GenerationError,
    ImageGeneratorPort,
    ImageQuality,
    ImageRequest,
    ImageSize,
    SamplingParams,
    TextGeneratorPort,
    // Persistence
    BlobStorageError,
    BlobStoragePort,
    BookRecord,
    BookRepositoryPort,
    NewBook,
    RepositoryError,
    // Jobs
    JobError,
    JobOutcome,
    JobRegistryPort,
    JobState,
    StorybookJob,
    // Progress
    NoopProgressSink,
    ProgressSink,
};

pub use queries::{
    handlers::{
        BookResponse, GetBookHandler, GetStorybookJobHandler, JobResponse,
        ListCommunityBooksHandler, ListUserBooksHandler,
    },
    GetBook, GetStorybookJob, ListCommunityBooks, ListUserBooks,
};

pub use services::{
    BookPersistence, StageExecutor, StageExecutorConfig, StageFailure, StagePayload, StageResult,
    TitleExtractor,
};
