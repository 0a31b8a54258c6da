//! WebSocket Handlers

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::application::{JobState, StorybookJob};
use crate::infrastructure::events::StorybookEvent;
use crate::infrastructure::http::state::AppState;

/// 任务进度 WebSocket
pub async fn storybook_websocket_handler(
    ws: WebSocketUpgrade,
    Path(job_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_job_socket(socket, job_id, state))
}

/// 全局 WebSocket（任务完成/失败事件）
pub async fn global_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_global_socket(socket, state))
}

/// 任务已结束时，根据快照补发结束事件
fn terminal_event(job: &StorybookJob) -> Option<StorybookEvent> {
    match job.state {
        JobState::Completed => job.outcome.clone().map(|outcome| StorybookEvent::JobCompleted {
            job_id: job.job_id,
            outcome,
        }),
        JobState::Failed => Some(StorybookEvent::JobFailed {
            job_id: job.job_id,
            error: job.error_message.clone().unwrap_or_default(),
        }),
        JobState::Queued | JobState::Running => None,
    }
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &StorybookEvent,
) -> bool {
    let msg = match serde_json::to_string(event) {
        Ok(json) => Message::Text(json),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize event");
            return true;
        }
    };

    if let Err(e) = sender.send(msg).await {
        tracing::debug!(error = %e, "Failed to send WebSocket message");
        return false;
    }
    true
}

async fn handle_job_socket(socket: WebSocket, job_id: Uuid, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // 先订阅再读快照，避免漏掉两者之间的事件
    let mut event_rx = state.event_publisher.subscribe_job(job_id);

    let Some(job) = state.job_registry.get(&job_id) else {
        tracing::warn!(job_id = %job_id, "WebSocket connection rejected: unknown job");
        state.event_publisher.unregister_job(&job_id);
        let _ = sender.close().await;
        return;
    };

    tracing::info!(job_id = %job_id, "WebSocket connected");

    if let Some(status) = job.last_progress.clone() {
        let snapshot = StorybookEvent::Progress { job_id, status };
        if !send_event(&mut sender, &snapshot).await {
            return;
        }
    }

    if let Some(event) = terminal_event(&job) {
        state.event_publisher.unregister_job(&job_id);
        send_event(&mut sender, &event).await;
        let _ = sender.close().await;
        tracing::info!(job_id = %job_id, "WebSocket closed, job already finished");
        return;
    }

    // 事件转发任务，收到结束事件后关闭连接
    let forward_task = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    let terminal = event.is_terminal();
                    if !send_event(&mut sender, &event).await {
                        break;
                    }
                    if terminal {
                        let _ = sender.close().await;
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(job_id = %job_id, skipped = skipped, "WebSocket subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // 接收客户端消息（心跳）
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!(job_id = %job_id, "WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(job_id = %job_id, error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    tracing::info!(job_id = %job_id, "WebSocket disconnected");
}

async fn handle_global_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut event_rx = state.event_publisher.subscribe_global();

    tracing::info!("Global WebSocket connected");

    let forward_task = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    if !send_event(&mut sender, &event).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "Global WebSocket subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!("Global WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Global WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    tracing::info!("Global WebSocket disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::JobOutcome;
    use crate::domain::storybook::{BookId, ImageUrlSet, StoryRequest};

    fn job() -> StorybookJob {
        StorybookJob::new(StoryRequest::new("honesty", "a fox").unwrap(), None)
    }

    #[test]
    fn test_running_job_has_no_terminal_event() {
        let mut running = job();
        running.state = JobState::Running;
        assert!(terminal_event(&running).is_none());
    }

    #[test]
    fn test_finished_jobs_replay_terminal_event() {
        let mut failed = job();
        failed.state = JobState::Failed;
        failed.error_message = Some("boom".to_string());
        match terminal_event(&failed) {
            Some(StorybookEvent::JobFailed { error, .. }) => assert_eq!(error, "boom"),
            other => panic!("unexpected: {:?}", other),
        }

        let mut completed = job();
        completed.state = JobState::Completed;
        completed.outcome = Some(JobOutcome {
            book_id: BookId::new(3),
            title: "T".to_string(),
            story: "S".to_string(),
            images: ImageUrlSet::new(),
            skipped: Vec::new(),
        });
        let event = terminal_event(&completed).unwrap();
        assert!(event.is_terminal());
        assert_eq!(event.job_id(), completed.job_id);
    }
}
