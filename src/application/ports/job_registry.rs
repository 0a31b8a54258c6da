//! Job Registry Port - 后台绘本任务管理
//!
//! 任务状态只保存在内存中，具体实现在 infrastructure/memory 层

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::storybook::{BookId, ImageUrlSet, ProgressStatus, SkippedSlot, StoryRequest};

/// Job Registry 错误
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(Uuid),

    #[error("Job queue is full")]
    QueueFull,

    #[error("Job queue is closed")]
    QueueClosed,

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

/// 任务状态
///
/// queued -> running -> completed | failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// 是否允许迁移到 `next`
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Queued, JobState::Running)
                | (JobState::Running, JobState::Completed)
                | (JobState::Queued, JobState::Failed)
                | (JobState::Running, JobState::Failed)
        )
    }
}

/// 任务完成后的摘要
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub book_id: BookId,
    pub title: String,
    pub story: String,
    pub images: ImageUrlSet,
    pub skipped: Vec<SkippedSlot>,
}

/// 绘本生成任务
#[derive(Debug, Clone)]
pub struct StorybookJob {
    pub job_id: Uuid,
    pub request: StoryRequest,
    pub user_id: Option<String>,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub last_progress: Option<ProgressStatus>,
    pub outcome: Option<JobOutcome>,
    pub error_message: Option<String>,
}

impl StorybookJob {
    pub fn new(request: StoryRequest, user_id: Option<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            request,
            user_id,
            state: JobState::Queued,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            last_progress: None,
            outcome: None,
            error_message: None,
        }
    }
}

/// Job Registry Port
pub trait JobRegistryPort: Send + Sync {
    /// 登记任务并放入执行队列
    fn submit(&self, job: StorybookJob) -> Result<Uuid, JobError>;

    fn get(&self, job_id: &Uuid) -> Option<StorybookJob>;

    /// queued -> running
    fn mark_running(&self, job_id: &Uuid) -> Result<(), JobError>;

    /// 记录最新进度
    fn record_progress(&self, job_id: &Uuid, status: ProgressStatus);

    /// running -> completed
    fn complete(&self, job_id: &Uuid, outcome: JobOutcome) -> Result<(), JobError>;

    /// queued | running -> failed
    fn fail(&self, job_id: &Uuid, error: String) -> Result<(), JobError>;
}
