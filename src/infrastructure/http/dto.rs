//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Storybook DTOs
// ============================================================================

/// 创建绘本请求，theme 与 tags 二选一
#[derive(Debug, Deserialize)]
pub struct CreateStorybookRequest {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub character: String,
}

#[derive(Debug, Serialize)]
pub struct CreateStorybookResponse {
    pub job_id: Uuid,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct StorybookStatusRequest {
    pub job_id: Uuid,
}
