//! Domain Layer - 领域层
//!
//! 包含:
//! - Storybook Context: 绘本生成的值对象、阶段模型与进度
//! - 提示词构造器与书名回退规则（纯函数）

pub mod storybook;

mod prompt_builder;
mod title;

pub use prompt_builder::{build_stage_prompt, story_system_prompt, story_user_prompt};
pub use title::{fallback_title, truncate_title};
