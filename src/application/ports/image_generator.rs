//! Image Generator Port - 图片生成服务抽象
//!
//! 两种操作:
//! - generate: 纯文本提示词生成
//! - edit: 提示词 + 参考图片生成

use async_trait::async_trait;

use super::GenerationError;
use crate::domain::storybook::ImageData;

/// 输出尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    Square,
    /// 1536x1024
    #[default]
    Landscape,
    Portrait,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Square => "1024x1024",
            ImageSize::Landscape => "1536x1024",
            ImageSize::Portrait => "1024x1536",
        }
    }
}

/// 输出质量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageQuality {
    Low,
    Medium,
    #[default]
    High,
}

impl ImageQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageQuality::Low => "low",
            ImageQuality::Medium => "medium",
            ImageQuality::High => "high",
        }
    }
}

/// 图片请求
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub size: ImageSize,
    pub quality: ImageQuality,
}

/// Image Generator Port
#[async_trait]
pub trait ImageGeneratorPort: Send + Sync {
    /// 仅凭提示词生成一张图片
    async fn generate(&self, request: ImageRequest) -> Result<ImageData, GenerationError>;

    /// 基于参考图片生成一张图片
    ///
    /// `references` 按顺序作为图 1、图 2 ... 发送，调用方保证非空
    async fn edit(
        &self,
        references: Vec<ImageData>,
        request: ImageRequest,
    ) -> Result<ImageData, GenerationError>;
}
