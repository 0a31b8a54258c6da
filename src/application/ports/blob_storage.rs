//! Blob Storage Port - 对象存储抽象
//!
//! 按 bucket + 路径写入，重复写入同一路径时覆盖

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::storybook::ImageData;

/// 对象存储错误
#[derive(Debug, Error)]
pub enum BlobStorageError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Upload rejected: {0}")]
    Rejected(String),
}

/// Blob Storage Port
#[async_trait]
pub trait BlobStoragePort: Send + Sync {
    /// 写入对象（upsert）
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: &ImageData,
        content_type: &str,
    ) -> Result<(), BlobStorageError>;

    /// 对象的公开访问 URL
    fn public_url(&self, bucket: &str, path: &str) -> String;
}
