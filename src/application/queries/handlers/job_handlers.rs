//! Storybook Job Query Handlers

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::application::error::ApplicationError;
use crate::application::ports::{JobOutcome, JobRegistryPort, JobState, StorybookJob};
use crate::application::queries::GetStorybookJob;
use crate::domain::storybook::ProgressStatus;

/// 任务快照
#[derive(Debug, Clone, Serialize)]
pub struct JobResponse {
    pub job_id: Uuid,
    pub status: JobState,
    pub theme: String,
    pub character: String,
    pub created_at: String,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub progress: Option<ProgressStatus>,
    pub result: Option<JobOutcome>,
    pub error: Option<String>,
}

impl From<StorybookJob> for JobResponse {
    fn from(job: StorybookJob) -> Self {
        Self {
            job_id: job.job_id,
            status: job.state,
            theme: job.request.theme().to_string(),
            character: job.request.character().to_string(),
            created_at: job.created_at.to_rfc3339(),
            started_at: job.started_at.map(|t| t.to_rfc3339()),
            finished_at: job.finished_at.map(|t| t.to_rfc3339()),
            progress: job.last_progress,
            result: job.outcome,
            error: job.error_message,
        }
    }
}

/// GetStorybookJob Handler
pub struct GetStorybookJobHandler {
    job_registry: Arc<dyn JobRegistryPort>,
}

impl GetStorybookJobHandler {
    pub fn new(job_registry: Arc<dyn JobRegistryPort>) -> Self {
        Self { job_registry }
    }

    pub async fn handle(&self, query: GetStorybookJob) -> Result<JobResponse, ApplicationError> {
        self.job_registry
            .get(&query.job_id)
            .map(JobResponse::from)
            .ok_or_else(|| ApplicationError::not_found("Job", query.job_id))
    }
}
