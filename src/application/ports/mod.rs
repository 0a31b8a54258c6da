//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod blob_storage;
mod generation;
mod image_generator;
mod job_registry;
mod progress;
mod repositories;
mod text_generator;

pub use blob_storage::{BlobStorageError, BlobStoragePort};
pub use generation::GenerationError;
pub use image_generator::{ImageGeneratorPort, ImageQuality, ImageRequest, ImageSize};
pub use job_registry::{JobError, JobOutcome, JobRegistryPort, JobState, StorybookJob};
pub use progress::{NoopProgressSink, ProgressSink};
pub use repositories::{BookRecord, BookRepositoryPort, NewBook, RepositoryError};
pub use text_generator::{CompletionRequest, SamplingParams, TextGeneratorPort};
