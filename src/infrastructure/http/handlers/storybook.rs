//! Storybook Handlers

use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;

use super::user_id_from;
use crate::application::{GetStorybookJob, JobResponse, SubmitStorybook};
use crate::infrastructure::http::dto::{
    ApiResponse, CreateStorybookRequest, CreateStorybookResponse, StorybookStatusRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 提交绘本任务，立即返回 job_id
pub async fn create_storybook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateStorybookRequest>,
) -> Result<Json<ApiResponse<CreateStorybookResponse>>, ApiError> {
    let user_id = user_id_from(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing user id".to_string()))?;

    let cmd = SubmitStorybook {
        theme: req.theme,
        tags: req.tags,
        character: req.character,
        user_id: Some(user_id),
    };

    let result = state.submit_storybook_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(CreateStorybookResponse {
        job_id: result.job_id,
        status: result.state.as_str().to_string(),
    })))
}

/// 查询任务快照
pub async fn storybook_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StorybookStatusRequest>,
) -> Result<Json<ApiResponse<JobResponse>>, ApiError> {
    let job = state
        .get_storybook_job_handler
        .handle(GetStorybookJob { job_id: req.job_id })
        .await?;

    Ok(Json(ApiResponse::success(job)))
}
