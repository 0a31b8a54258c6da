//! Storybook Worker - Background Pipeline Processor

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

use crate::application::commands::handlers::CreateStorybookHandler;
use crate::application::commands::CreateStorybook;
use crate::application::ports::{JobOutcome, JobRegistryPort, ProgressSink};
use crate::domain::storybook::ProgressStatus;
use crate::infrastructure::events::EventPublisher;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct StorybookWorkerConfig {
    /// 最大并发流水线数
    pub max_concurrent: usize,
}

impl Default for StorybookWorkerConfig {
    fn default() -> Self {
        Self { max_concurrent: 2 }
    }
}

/// 进度同时写入任务登记表并推送给订阅者
struct JobProgressSink {
    job_id: Uuid,
    job_registry: Arc<dyn JobRegistryPort>,
    event_publisher: Arc<EventPublisher>,
}

impl ProgressSink for JobProgressSink {
    fn report(&self, status: ProgressStatus) {
        tracing::debug!(
            job_id = %self.job_id,
            step = status.step,
            completed = status.completed,
            message = %status.message,
            "Pipeline progress"
        );
        self.job_registry.record_progress(&self.job_id, status.clone());
        self.event_publisher.publish_progress(self.job_id, status);
    }
}

/// 绘本 Worker
///
/// 后台任务处理器，从队列消费任务并执行完整流水线。
/// 单条流水线内部严格顺序，多条流水线之间按 max_concurrent 并发。
pub struct StorybookWorker {
    config: StorybookWorkerConfig,
    queue_receiver: mpsc::Receiver<Uuid>,
    job_registry: Arc<dyn JobRegistryPort>,
    handler: Arc<CreateStorybookHandler>,
    event_publisher: Arc<EventPublisher>,
}

impl StorybookWorker {
    pub fn new(
        config: StorybookWorkerConfig,
        queue_receiver: mpsc::Receiver<Uuid>,
        job_registry: Arc<dyn JobRegistryPort>,
        handler: Arc<CreateStorybookHandler>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            config,
            queue_receiver,
            job_registry,
            handler,
            event_publisher,
        }
    }

    /// 启动 Worker，队列关闭后返回
    pub async fn run(mut self) {
        tracing::info!(
            max_concurrent = self.config.max_concurrent,
            "StorybookWorker started"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));

        while let Some(job_id) = self.queue_receiver.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to acquire semaphore permit");
                    continue;
                }
            };

            let job_registry = self.job_registry.clone();
            let handler = self.handler.clone();
            let event_publisher = self.event_publisher.clone();

            tokio::spawn(async move {
                let _permit = permit; // 持有 permit 直到流水线结束
                Self::process_job(job_id, job_registry, handler, event_publisher).await;
            });
        }

        tracing::info!("StorybookWorker stopped");
    }

    /// 处理单个任务
    async fn process_job(
        job_id: Uuid,
        job_registry: Arc<dyn JobRegistryPort>,
        handler: Arc<CreateStorybookHandler>,
        event_publisher: Arc<EventPublisher>,
    ) {
        let job = match job_registry.get(&job_id) {
            Some(job) => job,
            None => {
                tracing::warn!(job_id = %job_id, "Job not found, skipping");
                return;
            }
        };

        if let Err(e) = job_registry.mark_running(&job_id) {
            tracing::error!(job_id = %job_id, error = %e, "Failed to update job state");
            return;
        }

        let sink = JobProgressSink {
            job_id,
            job_registry: job_registry.clone(),
            event_publisher: event_publisher.clone(),
        };
        let cmd = CreateStorybook {
            request: job.request,
            user_id: job.user_id,
        };

        match handler.handle(cmd, &sink).await {
            Ok(result) => {
                let outcome = JobOutcome::from(result);
                tracing::info!(
                    job_id = %job_id,
                    book_id = %outcome.book_id,
                    skipped = outcome.skipped.len(),
                    "Storybook job completed"
                );
                if let Err(e) = job_registry.complete(&job_id, outcome.clone()) {
                    tracing::error!(job_id = %job_id, error = %e, "Failed to complete job");
                }
                event_publisher.publish_completed(job_id, outcome);
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!(job_id = %job_id, error = %message, "Storybook job failed");
                if let Err(e) = job_registry.fail(&job_id, message.clone()) {
                    tracing::error!(job_id = %job_id, error = %e, "Failed to mark job failed");
                }
                event_publisher.publish_failed(job_id, &message);
            }
        }

        // 已订阅者仍会收到缓冲中的事件，随后看到通道关闭
        event_publisher.unregister_job(&job_id);
    }
}
