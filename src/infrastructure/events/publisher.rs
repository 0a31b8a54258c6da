//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::application::ports::JobOutcome;
use crate::domain::storybook::ProgressStatus;

const CHANNEL_CAPACITY: usize = 100;

/// WebSocket 事件类型
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum StorybookEvent {
    /// 阶段进度
    Progress {
        job_id: Uuid,
        #[serde(flatten)]
        status: ProgressStatus,
    },
    /// 任务完成
    JobCompleted {
        job_id: Uuid,
        #[serde(flatten)]
        outcome: JobOutcome,
    },
    /// 任务失败
    JobFailed {
        job_id: Uuid,
        error: String,
    },
}

impl StorybookEvent {
    pub fn job_id(&self) -> Uuid {
        match self {
            StorybookEvent::Progress { job_id, .. }
            | StorybookEvent::JobCompleted { job_id, .. }
            | StorybookEvent::JobFailed { job_id, .. } => *job_id,
        }
    }

    /// 完成或失败后该任务不会再有事件
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StorybookEvent::Progress { .. })
    }
}

/// 事件发布器
pub struct EventPublisher {
    /// job_id -> broadcast sender (该任务的进度与结束事件)
    job_channels: DashMap<Uuid, broadcast::Sender<StorybookEvent>>,
    /// 全局广播通道 (JobCompleted/JobFailed)
    global_channel: broadcast::Sender<StorybookEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            job_channels: DashMap::new(),
            global_channel: global_tx,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅全局事件
    pub fn subscribe_global(&self) -> broadcast::Receiver<StorybookEvent> {
        self.global_channel.subscribe()
    }

    /// 订阅任务事件，通道不存在时创建
    pub fn subscribe_job(&self, job_id: Uuid) -> broadcast::Receiver<StorybookEvent> {
        self.job_channels
            .entry(job_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// 任务结束后释放通道
    pub fn unregister_job(&self, job_id: &Uuid) {
        self.job_channels.remove(job_id);
    }

    /// 发布阶段进度
    pub fn publish_progress(&self, job_id: Uuid, status: ProgressStatus) {
        self.publish_to_job(job_id, StorybookEvent::Progress { job_id, status });
    }

    /// 发布任务完成事件（任务通道 + 全局广播）
    pub fn publish_completed(&self, job_id: Uuid, outcome: JobOutcome) {
        let event = StorybookEvent::JobCompleted { job_id, outcome };
        self.publish_to_job(job_id, event.clone());
        self.publish_global(event);
    }

    /// 发布任务失败事件（任务通道 + 全局广播）
    pub fn publish_failed(&self, job_id: Uuid, error: &str) {
        let event = StorybookEvent::JobFailed {
            job_id,
            error: error.to_string(),
        };
        self.publish_to_job(job_id, event.clone());
        self.publish_global(event);
    }

    fn publish_global(&self, event: StorybookEvent) {
        let job_id = event.job_id();
        if let Err(e) = self.global_channel.send(event) {
            tracing::debug!(
                job_id = %job_id,
                error = %e,
                "Failed to publish global event (no receivers)"
            );
        }
    }

    fn publish_to_job(&self, job_id: Uuid, event: StorybookEvent) {
        if let Some(sender) = self.job_channels.get(&job_id) {
            if let Err(e) = sender.send(event) {
                tracing::debug!(
                    job_id = %job_id,
                    error = %e,
                    "Failed to publish event (no receivers)"
                );
            }
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
