//! Stage Executor - 单阶段执行
//!
//! 每个阶段调用一次外部生成服务，不重试。
//! 失败以 [`StageFailure`] 返回，不会越过本边界。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::application::ports::{
    CompletionRequest, GenerationError, ImageGeneratorPort, ImageQuality, ImageRequest, ImageSize,
    SamplingParams, TextGeneratorPort,
};

/// 插图固定为横版 1536x1024，与阶段提示词一致
const ILLUSTRATION_SIZE: ImageSize = ImageSize::Landscape;
const ILLUSTRATION_QUALITY: ImageQuality = ImageQuality::High;
use crate::domain::storybook::{ImageData, Stage, StoryRequest, StoryText};
use crate::domain::{build_stage_prompt, story_system_prompt, story_user_prompt};

/// 阶段失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} failed: {reason}")]
pub struct StageFailure {
    pub stage: Stage,
    pub reason: String,
}

impl StageFailure {
    pub fn new(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

/// 阶段产出
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagePayload {
    Text(StoryText),
    Image(ImageData),
}

impl StagePayload {
    pub fn into_story(self) -> Option<StoryText> {
        match self {
            StagePayload::Text(story) => Some(story),
            StagePayload::Image(_) => None,
        }
    }

    pub fn into_image(self) -> Option<ImageData> {
        match self {
            StagePayload::Image(image) => Some(image),
            StagePayload::Text(_) => None,
        }
    }
}

pub type StageResult = Result<StagePayload, StageFailure>;

/// Stage Executor 配置
#[derive(Debug, Clone)]
pub struct StageExecutorConfig {
    pub story_params: SamplingParams,
    /// 单次外部调用的超时，None 表示不限制
    pub stage_timeout: Option<Duration>,
}

impl Default for StageExecutorConfig {
    fn default() -> Self {
        Self {
            story_params: SamplingParams::story(),
            stage_timeout: None,
        }
    }
}

/// Stage Executor
pub struct StageExecutor {
    text_generator: Arc<dyn TextGeneratorPort>,
    image_generator: Arc<dyn ImageGeneratorPort>,
    /// 版式线框图，页面阶段作为图 1 发送
    layout_reference: Option<ImageData>,
    config: StageExecutorConfig,
}

impl StageExecutor {
    pub fn new(
        text_generator: Arc<dyn TextGeneratorPort>,
        image_generator: Arc<dyn ImageGeneratorPort>,
        config: StageExecutorConfig,
    ) -> Self {
        Self {
            text_generator,
            image_generator,
            layout_reference: None,
            config,
        }
    }

    pub fn with_layout_reference(mut self, layout: Option<ImageData>) -> Self {
        self.layout_reference = layout.filter(|image| !image.is_empty());
        self
    }

    /// 按阶段执行
    ///
    /// 故事阶段需要原始请求，图片阶段需要故事正文和可选的参考图
    pub async fn execute(
        &self,
        stage: Stage,
        request: &StoryRequest,
        story: Option<&StoryText>,
        reference: Option<&ImageData>,
    ) -> StageResult {
        match (stage, story) {
            (Stage::Story, _) => self.generate_story(request).await.map(StagePayload::Text),
            (_, Some(story)) => self
                .generate_illustration(stage, story, reference)
                .await
                .map(StagePayload::Image),
            (_, None) => Err(StageFailure::new(stage, "story text is required")),
        }
    }

    /// 第 1 阶段：生成故事正文
    async fn generate_story(&self, request: &StoryRequest) -> Result<StoryText, StageFailure> {
        let completion = CompletionRequest {
            system: story_system_prompt(),
            user: story_user_prompt(request),
            params: self.config.story_params.clone(),
        };

        let text = self
            .bounded(Stage::Story, self.text_generator.complete(completion))
            .await?;

        let story = StoryText::new(text);
        if story.is_empty() {
            return Err(StageFailure::new(Stage::Story, "no story text returned"));
        }

        tracing::debug!(chars = story.len(), "Story text generated");
        Ok(story)
    }

    /// 第 2..=12 阶段：生成插图或封面
    ///
    /// 有参考图时走 edit，否则走 generate
    async fn generate_illustration(
        &self,
        stage: Stage,
        story: &StoryText,
        reference: Option<&ImageData>,
    ) -> Result<ImageData, StageFailure> {
        if !stage.is_image_stage() {
            return Err(StageFailure::new(stage, "not an image stage"));
        }

        let request = ImageRequest {
            prompt: build_stage_prompt(stage, story),
            size: ILLUSTRATION_SIZE,
            quality: ILLUSTRATION_QUALITY,
        };
        let references = self.references_for(stage, reference);

        tracing::debug!(
            stage = %stage,
            references = references.len(),
            "Requesting illustration"
        );

        let image = if references.is_empty() {
            self.bounded(stage, self.image_generator.generate(request))
                .await?
        } else {
            self.bounded(stage, self.image_generator.edit(references, request))
                .await?
        };

        if image.is_empty() {
            return Err(StageFailure::new(stage, "no image data received"));
        }

        tracing::debug!(stage = %stage, bytes = image.len(), "Illustration generated");
        Ok(image)
    }

    /// 参考图顺序：页面阶段 [版式, 第 1 页]，封面只用第 1 页
    pub fn references_for(&self, stage: Stage, reference: Option<&ImageData>) -> Vec<ImageData> {
        match stage {
            Stage::Story => Vec::new(),
            Stage::Page(_) => self
                .layout_reference
                .iter()
                .chain(reference)
                .cloned()
                .collect(),
            Stage::Cover => reference.into_iter().cloned().collect(),
        }
    }

    async fn bounded<T, F>(&self, stage: Stage, call: F) -> Result<T, StageFailure>
    where
        F: Future<Output = Result<T, GenerationError>>,
    {
        let result = match self.config.stage_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(GenerationError::Timeout)),
            None => call.await,
        };
        result.map_err(|e| StageFailure::new(stage, e.to_string()))
    }
}
