//! In-Memory Job Registry Implementation

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::application::ports::{JobError, JobOutcome, JobRegistryPort, JobState, StorybookJob};
use crate::domain::storybook::ProgressStatus;

/// 默认保留的终态任务数量
pub const DEFAULT_RETAINED_JOBS: usize = 100;

/// 内存任务登记表
pub struct InMemoryJobRegistry {
    /// job_id -> StorybookJob
    jobs: DashMap<Uuid, StorybookJob>,
    /// 任务队列发送端
    queue_sender: mpsc::Sender<Uuid>,
    /// 终态任务保留上限，超出时按 finished_at 淘汰最早的
    retained_jobs: usize,
}

impl InMemoryJobRegistry {
    pub fn new(queue_sender: mpsc::Sender<Uuid>) -> Self {
        Self {
            jobs: DashMap::new(),
            queue_sender,
            retained_jobs: DEFAULT_RETAINED_JOBS,
        }
    }

    pub fn with_retention(mut self, retained_jobs: usize) -> Self {
        self.retained_jobs = retained_jobs;
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 淘汰超出保留上限的终态任务
    fn evict_finished(&self) {
        let mut finished: Vec<_> = self
            .jobs
            .iter()
            .filter(|j| j.state.is_terminal())
            .map(|j| (j.finished_at, j.job_id))
            .collect();

        if finished.len() <= self.retained_jobs {
            return;
        }

        finished.sort();
        let excess = finished.len() - self.retained_jobs;
        for (_, job_id) in finished.into_iter().take(excess) {
            self.jobs.remove(&job_id);
        }

        tracing::debug!(evicted = excess, "Finished jobs evicted");
    }

    fn transition(&self, job_id: &Uuid, next: JobState) -> Result<(), JobError> {
        let mut job = self.jobs.get_mut(job_id).ok_or(JobError::NotFound(*job_id))?;

        if !job.state.can_transition_to(next) {
            return Err(JobError::InvalidStateTransition(format!(
                "{} -> {}",
                job.state.as_str(),
                next.as_str()
            )));
        }

        let old_state = job.state;
        job.state = next;
        match next {
            JobState::Running => job.started_at = Some(Utc::now()),
            JobState::Completed | JobState::Failed => job.finished_at = Some(Utc::now()),
            JobState::Queued => {}
        }

        tracing::debug!(
            job_id = %job_id,
            old_state = ?old_state,
            new_state = ?next,
            "Job state changed"
        );
        Ok(())
    }
}

impl JobRegistryPort for InMemoryJobRegistry {
    fn submit(&self, job: StorybookJob) -> Result<Uuid, JobError> {
        let job_id = job.job_id;
        self.jobs.insert(job_id, job);

        if let Err(e) = self.queue_sender.try_send(job_id) {
            self.jobs.remove(&job_id);
            tracing::warn!(job_id = %job_id, error = %e, "Failed to enqueue job");
            return Err(match e {
                TrySendError::Full(_) => JobError::QueueFull,
                TrySendError::Closed(_) => JobError::QueueClosed,
            });
        }

        tracing::debug!(job_id = %job_id, "Job submitted");
        Ok(job_id)
    }

    fn get(&self, job_id: &Uuid) -> Option<StorybookJob> {
        self.jobs.get(job_id).map(|j| j.clone())
    }

    fn mark_running(&self, job_id: &Uuid) -> Result<(), JobError> {
        self.transition(job_id, JobState::Running)
    }

    fn record_progress(&self, job_id: &Uuid, status: ProgressStatus) {
        if let Some(mut job) = self.jobs.get_mut(job_id) {
            job.last_progress = Some(status);
        }
    }

    fn complete(&self, job_id: &Uuid, outcome: JobOutcome) -> Result<(), JobError> {
        self.transition(job_id, JobState::Completed)?;
        if let Some(mut job) = self.jobs.get_mut(job_id) {
            job.outcome = Some(outcome);
        }
        self.evict_finished();
        Ok(())
    }

    fn fail(&self, job_id: &Uuid, error: String) -> Result<(), JobError> {
        self.transition(job_id, JobState::Failed)?;
        if let Some(mut job) = self.jobs.get_mut(job_id) {
            job.error_message = Some(error);
        }
        self.evict_finished();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storybook::{BookId, ImageUrlSet, Stage, StoryRequest};

    fn job() -> StorybookJob {
        StorybookJob::new(
            StoryRequest::new("kindness", "a shy turtle").unwrap(),
            Some("user-1".to_string()),
        )
    }

    fn outcome() -> JobOutcome {
        JobOutcome {
            book_id: BookId::new(1),
            title: "T".to_string(),
            story: "S".to_string(),
            images: ImageUrlSet::new(),
            skipped: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_submit_enqueues() {
        let (tx, mut rx) = mpsc::channel(4);
        let registry = InMemoryJobRegistry::new(tx);

        let job_id = registry.submit(job()).unwrap();
        assert_eq!(rx.recv().await, Some(job_id));
        assert_eq!(registry.get(&job_id).unwrap().state, JobState::Queued);
    }

    #[test]
    fn test_queue_full_removes_job() {
        let (tx, _rx) = mpsc::channel(1);
        let registry = InMemoryJobRegistry::new(tx);

        registry.submit(job()).unwrap();
        let second = job();
        let second_id = second.job_id;
        assert!(matches!(registry.submit(second), Err(JobError::QueueFull)));
        assert!(registry.get(&second_id).is_none());
        assert_eq!(registry.jobs.len(), 1);
    }

    #[test]
    fn test_queue_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let registry = InMemoryJobRegistry::new(tx);
        assert!(matches!(registry.submit(job()), Err(JobError::QueueClosed)));
    }

    #[test]
    fn test_lifecycle() {
        let (tx, _rx) = mpsc::channel(4);
        let registry = InMemoryJobRegistry::new(tx);
        let job_id = registry.submit(job()).unwrap();

        registry.mark_running(&job_id).unwrap();
        registry.record_progress(&job_id, ProgressStatus::started(Stage::Story, "Generating story..."));
        let running = registry.get(&job_id).unwrap();
        assert_eq!(running.state, JobState::Running);
        assert!(running.started_at.is_some());
        assert_eq!(running.last_progress.unwrap().step, 1);

        registry.complete(&job_id, outcome()).unwrap();
        let done = registry.get(&job_id).unwrap();
        assert_eq!(done.state, JobState::Completed);
        assert!(done.finished_at.is_some());
        assert_eq!(done.outcome.unwrap().book_id, BookId::new(1));

        // 终态不能再迁移
        assert!(matches!(
            registry.fail(&job_id, "late".to_string()),
            Err(JobError::InvalidStateTransition(_))
        ));
    }

    #[test]
    fn test_fail_records_message() {
        let (tx, _rx) = mpsc::channel(4);
        let registry = InMemoryJobRegistry::new(tx);
        let job_id = registry.submit(job()).unwrap();

        registry.fail(&job_id, "Failed to generate story".to_string()).unwrap();
        let failed = registry.get(&job_id).unwrap();
        assert_eq!(failed.state, JobState::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("Failed to generate story"));
    }

    #[test]
    fn test_finished_jobs_are_evicted() {
        let (tx, _rx) = mpsc::channel(1000);
        let registry = InMemoryJobRegistry::new(tx).with_retention(10);

        let mut ids = Vec::new();
        for _ in 0..1000 {
            let job_id = registry.submit(job()).unwrap();
            registry.mark_running(&job_id).unwrap();
            registry.fail(&job_id, "boom".to_string()).unwrap();
            ids.push(job_id);
        }

        assert_eq!(registry.jobs.len(), 10);
        // 最近结束的保留
        assert!(registry.get(&ids[999]).is_some());
        assert!(registry.get(&ids[0]).is_none());
    }

    #[test]
    fn test_eviction_keeps_active_jobs() {
        let (tx, _rx) = mpsc::channel(16);
        let registry = InMemoryJobRegistry::new(tx).with_retention(1);

        let active = registry.submit(job()).unwrap();
        registry.mark_running(&active).unwrap();

        for _ in 0..3 {
            let job_id = registry.submit(job()).unwrap();
            registry.mark_running(&job_id).unwrap();
            registry.complete(&job_id, outcome()).unwrap();
        }

        assert_eq!(registry.jobs.len(), 2);
        assert_eq!(registry.get(&active).unwrap().state, JobState::Running);
    }

    #[test]
    fn test_unknown_job() {
        let (tx, _rx) = mpsc::channel(4);
        let registry = InMemoryJobRegistry::new(tx);
        let missing = Uuid::new_v4();
        assert!(matches!(registry.mark_running(&missing), Err(JobError::NotFound(_))));
        assert!(registry.get(&missing).is_none());
    }
}
