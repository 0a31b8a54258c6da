//! Storybook Context - 进度状态
//!
//! 每个阶段开始和结束时各发出一次，不持久化

use serde::{Serialize, Serializer};

use super::{Slot, Stage, TOTAL_STEPS};

/// 进度附带的页面标记：页码数字或 "cover"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    Page(u8),
    Cover,
}

impl From<Slot> for PageMarker {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::Page(page) => PageMarker::Page(page),
            Slot::Cover => PageMarker::Cover,
        }
    }
}

impl Serialize for PageMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageMarker::Page(page) => serializer.serialize_u8(*page),
            PageMarker::Cover => serializer.serialize_str("cover"),
        }
    }
}

/// 阶段附加数据
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageMarker>,
}

impl ProgressData {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            page: None,
        }
    }

    pub fn page(marker: impl Into<PageMarker>) -> Self {
        Self {
            text: None,
            page: Some(marker.into()),
        }
    }
}

/// 进度状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressStatus {
    pub step: u8,
    pub total_steps: u8,
    pub message: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ProgressData>,
}

impl ProgressStatus {
    /// 阶段开始
    pub fn started(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            step: stage.index(),
            total_steps: TOTAL_STEPS,
            message: message.into(),
            completed: false,
            data: None,
        }
    }

    /// 阶段结束（无论成败）
    pub fn finished(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            completed: true,
            ..Self::started(stage, message)
        }
    }

    pub fn with_data(mut self, data: ProgressData) -> Self {
        self.data = Some(data);
        self
    }
}
