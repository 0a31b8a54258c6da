//! Fake Generation Client - 本地假生成服务
//!
//! 不访问网络：固定的十段故事、固定书名、1x1 PNG。
//! 用于本地开发和不配置 API key 的演示环境。

use async_trait::async_trait;
use std::time::Duration;

use crate::application::ports::{
    CompletionRequest, GenerationError, ImageGeneratorPort, ImageRequest, TextGeneratorPort,
};
use crate::domain::storybook::ImageData;

const FAKE_TITLE: &str = "The Brave Little Turtle";

const FAKE_STORY: &str = "The Brave Little Turtle

Tilly the turtle lived by a quiet pond at the edge of a green meadow.

Every morning she watched the ducks race across the water and wished she could be quick too.

One day a small rabbit named Pip fell into the pond and could not swim back.

The ducks flapped and quacked, but nobody knew how to reach him.

Tilly paddled slowly and steadily toward Pip, never stopping once.

She let Pip climb onto her shell and carried him to the shore.

Pip hugged her and said, \"You were slow, but you never gave up!\"

The ducks cheered, and the whole meadow came to thank Tilly.

That evening Tilly smiled at her reflection in the calm water.

Being steady and kind, she learned, is a kind of courage too.";

/// 1x1 透明 PNG
const FAKE_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// 书名请求的 max_tokens 上限，超过则视为故事请求
const TITLE_MAX_TOKENS: u32 = 64;

/// Fake 客户端配置
#[derive(Debug, Clone)]
pub struct FakeGenerationConfig {
    /// 模拟每次调用的延迟
    pub latency: Duration,
}

impl Default for FakeGenerationConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(200),
        }
    }
}

/// Fake 生成客户端
pub struct FakeGenerationClient {
    config: FakeGenerationConfig,
}

impl FakeGenerationClient {
    pub fn new(config: FakeGenerationConfig) -> Self {
        tracing::info!(
            latency_ms = config.latency.as_millis() as u64,
            "FakeGenerationClient initialized"
        );
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeGenerationConfig::default())
    }

    async fn simulate_latency(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }
}

#[async_trait]
impl TextGeneratorPort for FakeGenerationClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationError> {
        self.simulate_latency().await;

        let text = if request.params.max_tokens <= TITLE_MAX_TOKENS {
            FAKE_TITLE
        } else {
            FAKE_STORY
        };

        tracing::debug!(
            max_tokens = request.params.max_tokens,
            "FakeGenerationClient: returning canned text"
        );
        Ok(text.to_string())
    }
}

#[async_trait]
impl ImageGeneratorPort for FakeGenerationClient {
    async fn generate(&self, request: ImageRequest) -> Result<ImageData, GenerationError> {
        self.simulate_latency().await;
        tracing::debug!(
            prompt_len = request.prompt.len(),
            "FakeGenerationClient: returning fixed image"
        );
        Ok(ImageData::new(FAKE_PNG))
    }

    async fn edit(
        &self,
        references: Vec<ImageData>,
        request: ImageRequest,
    ) -> Result<ImageData, GenerationError> {
        self.simulate_latency().await;
        tracing::debug!(
            prompt_len = request.prompt.len(),
            references = references.len(),
            "FakeGenerationClient: returning fixed image"
        );
        Ok(ImageData::new(FAKE_PNG))
    }
}
