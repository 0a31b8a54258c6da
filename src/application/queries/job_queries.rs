//! Storybook Job Queries

use uuid::Uuid;

/// 查询后台任务状态
#[derive(Debug, Clone)]
pub struct GetStorybookJob {
    pub job_id: Uuid,
}
