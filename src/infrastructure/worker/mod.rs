//! Worker - 后台任务处理

mod storybook_worker;

pub use storybook_worker::{StorybookWorker, StorybookWorkerConfig};
