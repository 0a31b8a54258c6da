//! Storybook Commands - 绘本生成命令

use serde::Serialize;
use uuid::Uuid;

use crate::application::ports::{JobOutcome, JobState};
use crate::domain::storybook::{
    BookId, ImageUrlSet, SkippedSlot, StoryRequest, StoryText, Title,
};

/// 同步执行完整流水线
#[derive(Debug, Clone)]
pub struct CreateStorybook {
    pub request: StoryRequest,
    /// 外部认证层提供，缺失时在故事生成后硬失败
    pub user_id: Option<String>,
}

/// 流水线成功结果
///
/// 单页失败不影响成功标记，只体现为空槽位
#[derive(Debug, Clone, Serialize)]
pub struct StorybookResult {
    pub book_id: BookId,
    pub title: Title,
    pub story: StoryText,
    pub images: ImageUrlSet,
    pub skipped: Vec<SkippedSlot>,
}

impl From<StorybookResult> for JobOutcome {
    fn from(result: StorybookResult) -> Self {
        Self {
            book_id: result.book_id,
            title: result.title.as_str().to_string(),
            story: result.story.into_inner(),
            images: result.images,
            skipped: result.skipped,
        }
    }
}

/// 提交后台任务
#[derive(Debug, Clone)]
pub struct SubmitStorybook {
    pub theme: Option<String>,
    pub tags: Vec<String>,
    pub character: String,
    pub user_id: Option<String>,
}

/// 提交后台任务响应
#[derive(Debug, Clone)]
pub struct SubmitStorybookResponse {
    pub job_id: Uuid,
    pub state: JobState,
}
