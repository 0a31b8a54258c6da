//! Progress Sink - 进度回调
//!
//! 编排器每个阶段开始和结束时各调用一次

use crate::domain::storybook::ProgressStatus;

/// 进度接收方
pub trait ProgressSink: Send + Sync {
    fn report(&self, status: ProgressStatus);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressStatus) + Send + Sync,
{
    fn report(&self, status: ProgressStatus) {
        self(status)
    }
}

/// 丢弃所有进度
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn report(&self, _status: ProgressStatus) {}
}
