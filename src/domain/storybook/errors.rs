//! Storybook Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorybookError {
    #[error("主题不能为空")]
    EmptyTheme,

    #[error("角色描述不能为空")]
    EmptyCharacter,

    #[error("用户 ID 不能为空")]
    MissingUserId,

    #[error("无效的标题: {0}")]
    InvalidTitle(String),
}
