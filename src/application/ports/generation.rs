//! Generation Errors - 生成服务错误
//!
//! 文本和图片生成端口共用

use thiserror::Error;

/// 生成服务错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}
