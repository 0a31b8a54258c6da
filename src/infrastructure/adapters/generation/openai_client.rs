//! OpenAI Client - 调用 OpenAI 兼容的 HTTP 接口
//!
//! 同时实现 TextGeneratorPort 与 ImageGeneratorPort
//!
//! 接口:
//! POST {base_url}/chat/completions   (JSON)
//! POST {base_url}/images/generations (JSON)
//! POST {base_url}/images/edits       (multipart, 多个 image[] 字段)
//!
//! 图片以 b64_json 返回，在这里解码为字节，应用层只看到 ImageData

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    CompletionRequest, GenerationError, ImageGeneratorPort, ImageRequest, TextGeneratorPort,
};
use crate::domain::storybook::ImageData;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageGenerationBody<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    b64_json: Option<String>,
}

/// OpenAI 客户端配置
#[derive(Debug, Clone)]
pub struct OpenAiClientConfig {
    /// API 基础 URL，不带结尾的 /
    pub base_url: String,
    pub api_key: String,
    /// 请求未指定模型时使用的文本模型
    pub text_model: String,
    pub image_model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for OpenAiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            text_model: "gpt-4.5-preview".to_string(),
            image_model: "gpt-image-1".to_string(),
            timeout_secs: 300,
        }
    }
}

impl OpenAiClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_models(mut self, text_model: impl Into<String>, image_model: impl Into<String>) -> Self {
        self.text_model = text_model.into();
        self.image_model = image_model.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// OpenAI HTTP 客户端
pub struct OpenAiClient {
    client: Client,
    config: OpenAiClientConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiClientConfig) -> Result<Self, GenerationError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::ConfigurationError(
                "API key is not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, GenerationError> {
        let response = builder
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        Ok(response)
    }

    async fn read_image(response: reqwest::Response) -> Result<ImageData, GenerationError> {
        let body: ImageResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        decode_first_image(body)
    }
}

fn map_request_error(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Timeout
    } else if e.is_connect() {
        GenerationError::NetworkError(format!("Cannot connect to generation service: {}", e))
    } else {
        GenerationError::NetworkError(e.to_string())
    }
}

fn first_content(body: ChatCompletionResponse) -> Result<String, GenerationError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| GenerationError::EmptyResponse("No content in completion".to_string()))
}

fn decode_first_image(body: ImageResponse) -> Result<ImageData, GenerationError> {
    let encoded = body
        .data
        .into_iter()
        .next()
        .and_then(|datum| datum.b64_json)
        .filter(|b64| !b64.is_empty())
        .ok_or_else(|| GenerationError::EmptyResponse("No image data returned".to_string()))?;

    let bytes = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| GenerationError::InvalidResponse(format!("Invalid base64 image: {}", e)))?;

    Ok(ImageData::new(bytes))
}

#[async_trait]
impl TextGeneratorPort for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationError> {
        let model = request
            .params
            .model
            .as_deref()
            .unwrap_or(&self.config.text_model);

        let body = ChatCompletionBody {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.params.temperature,
            max_tokens: request.params.max_tokens,
            top_p: request.params.top_p,
        };

        tracing::debug!(
            model = %model,
            system_len = request.system.len(),
            user_len = request.user.len(),
            "Sending chat completion request"
        );

        let response = self
            .send(self.client.post(self.url("chat/completions")).json(&body))
            .await?;

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        first_content(body)
    }
}

#[async_trait]
impl ImageGeneratorPort for OpenAiClient {
    async fn generate(&self, request: ImageRequest) -> Result<ImageData, GenerationError> {
        let body = ImageGenerationBody {
            model: &self.config.image_model,
            prompt: &request.prompt,
            size: request.size.as_str(),
            quality: request.quality.as_str(),
            n: 1,
        };

        tracing::debug!(
            model = %self.config.image_model,
            prompt_len = request.prompt.len(),
            "Sending image generation request"
        );

        let response = self
            .send(self.client.post(self.url("images/generations")).json(&body))
            .await?;

        let image = Self::read_image(response).await?;
        tracing::info!(size = image.len(), "Image generated");
        Ok(image)
    }

    async fn edit(
        &self,
        references: Vec<ImageData>,
        request: ImageRequest,
    ) -> Result<ImageData, GenerationError> {
        let reference_count = references.len();
        let mut form = Form::new()
            .text("model", self.config.image_model.clone())
            .text("prompt", request.prompt.clone())
            .text("size", request.size.as_str())
            .text("quality", request.quality.as_str());

        for (i, reference) in references.into_iter().enumerate() {
            let part = Part::bytes(reference.into_bytes().to_vec())
                .file_name(format!("image-{}.png", i + 1))
                .mime_str("image/png")
                .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
            form = form.part("image[]", part);
        }

        tracing::debug!(
            model = %self.config.image_model,
            prompt_len = request.prompt.len(),
            references = reference_count,
            "Sending image edit request"
        );

        let response = self
            .send(self.client.post(self.url("images/edits")).multipart(form))
            .await?;

        let image = Self::read_image(response).await?;
        tracing::info!(size = image.len(), references = reference_count, "Image edited");
        Ok(image)
    }
}
