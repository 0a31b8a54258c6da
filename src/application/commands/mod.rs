//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：绘本生成与后台任务提交

mod storybook_commands;

pub mod handlers;

pub use storybook_commands::*;
