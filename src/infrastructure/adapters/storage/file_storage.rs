//! File Storage - 文件系统对象存储实现
//!
//! 实现 BlobStoragePort trait
//!
//! 布局: {root_dir}/{bucket}/{path}
//! 公开 URL: {public_base_url}/storage/{bucket}/{path}，由 HTTP 层的静态文件服务提供

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::application::ports::{BlobStorageError, BlobStoragePort};
use crate::domain::storybook::ImageData;

/// 静态文件服务挂载的路由前缀
pub const STORAGE_ROUTE: &str = "/storage";

/// 文件系统对象存储
pub struct FileBlobStorage {
    /// 存储根目录
    root_dir: PathBuf,
    /// 公开访问的 Base URL，不带结尾的 /
    public_base_url: String,
}

impl FileBlobStorage {
    /// 创建新的文件存储
    pub async fn new(
        root_dir: impl AsRef<Path>,
        public_base_url: impl Into<String>,
    ) -> Result<Self, BlobStorageError> {
        let root_dir = root_dir.as_ref().to_path_buf();

        fs::create_dir_all(&root_dir)
            .await
            .map_err(|e| BlobStorageError::IoError(e.to_string()))?;

        Ok(Self {
            root_dir,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// 对象在磁盘上的位置
    ///
    /// bucket 和 path 只允许普通路径段
    pub fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf, BlobStorageError> {
        let bucket = validate_relative(bucket)?;
        let path = validate_relative(path)?;
        Ok(self.root_dir.join(bucket).join(path))
    }
}

fn validate_relative(value: &str) -> Result<&Path, BlobStorageError> {
    let candidate = Path::new(value);
    let is_plain = !value.trim().is_empty()
        && candidate
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

    if is_plain {
        Ok(candidate)
    } else {
        Err(BlobStorageError::InvalidPath(value.to_string()))
    }
}

#[async_trait]
impl BlobStoragePort for FileBlobStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: &ImageData,
        content_type: &str,
    ) -> Result<(), BlobStorageError> {
        if data.is_empty() {
            return Err(BlobStorageError::Rejected("empty object".to_string()));
        }

        let object_path = self.object_path(bucket, path)?;
        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| BlobStorageError::IoError(e.to_string()))?;
        }

        fs::write(&object_path, data.as_bytes())
            .await
            .map_err(|e| BlobStorageError::IoError(e.to_string()))?;

        tracing::debug!(
            "Stored object: bucket={}, path={}, content_type={}, size={} bytes",
            bucket,
            path,
            content_type,
            data.len()
        );

        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}{}/{}/{}",
            self.public_base_url, STORAGE_ROUTE, bucket, path
        )
    }
}
