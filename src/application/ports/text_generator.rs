//! Text Generator Port - 文本补全服务抽象
//!
//! 故事正文和书名抽取都通过它调用外部对话补全服务

use async_trait::async_trait;

use super::GenerationError;

/// 采样参数
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    /// 覆盖适配器默认模型
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: Option<f32>,
}

impl SamplingParams {
    /// 故事正文：高随机性，较长输出
    pub fn story() -> Self {
        Self {
            model: None,
            temperature: 1.0,
            max_tokens: 2048,
            top_p: Some(1.0),
        }
    }

    /// 书名抽取：短输出
    pub fn title() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_tokens: 30,
            top_p: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// 补全请求
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// 系统消息
    pub system: String,
    /// 用户消息
    pub user: String,
    pub params: SamplingParams,
}

/// Text Generator Port
#[async_trait]
pub trait TextGeneratorPort: Send + Sync {
    /// 返回第一个候选的文本内容
    ///
    /// 服务返回空内容时报 [`GenerationError::EmptyResponse`]
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationError>;
}
