//! Title Extractor - 书名抽取
//!
//! 调用文本服务抽取或拟定书名，失败、超时或返回空时回退到本地规则

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{CompletionRequest, GenerationError, SamplingParams, TextGeneratorPort};
use crate::domain::storybook::{StoryText, Title};
use crate::domain::{fallback_title, truncate_title};

const TITLE_SYSTEM_PROMPT: &str = "You are an assistant that extracts the title of a story, \
or writes a new title based on the story when none is given. When writing a new title, make \
it catchy and short. Return only the title, nothing else.";

/// 发送给服务的故事摘录长度（字符）
const EXCERPT_CHARS: usize = 1500;

/// Title Extractor
pub struct TitleExtractor {
    text_generator: Arc<dyn TextGeneratorPort>,
    params: SamplingParams,
    timeout: Option<Duration>,
}

impl TitleExtractor {
    pub fn new(text_generator: Arc<dyn TextGeneratorPort>) -> Self {
        Self {
            text_generator,
            params: SamplingParams::title(),
            timeout: None,
        }
    }

    pub fn with_params(mut self, params: SamplingParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// 总是返回一个非空书名
    pub async fn extract(&self, story: &StoryText) -> Title {
        match self.request_title(story).await {
            Ok(title) => title,
            Err(reason) => {
                let title = fallback_title(story);
                tracing::warn!(
                    error = %reason,
                    fallback = %title,
                    "Title extraction failed, using fallback"
                );
                title
            }
        }
    }

    async fn request_title(&self, story: &StoryText) -> Result<Title, GenerationError> {
        let request = CompletionRequest {
            system: TITLE_SYSTEM_PROMPT.to_string(),
            user: format!("Get the title for this story: {}...", excerpt(story)),
            params: self.params.clone(),
        };

        let call = self.text_generator.complete(request);
        let raw = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(GenerationError::Timeout))?,
            None => call.await?,
        };

        let cleaned = clean_title(&raw);
        Title::new(truncate_title(cleaned))
            .map_err(|_| GenerationError::EmptyResponse("no title returned".to_string()))
    }
}

fn excerpt(story: &StoryText) -> String {
    story.as_str().chars().take(EXCERPT_CHARS).collect()
}

/// 去掉首尾空白和成对的引号
fn clean_title(raw: &str) -> &str {
    let trimmed = raw.trim();
    ['"', '\'', '“']
        .iter()
        .find_map(|open| {
            let close = if *open == '“' { '”' } else { *open };
            trimmed
                .strip_prefix(*open)
                .and_then(|rest| rest.strip_suffix(close))
        })
        .map(str::trim)
        .unwrap_or(trimmed)
}
