//! Storybook Context - 绘本限界上下文
//!
//! 职责:
//! - 故事请求、故事正文、书名等值对象
//! - 12 阶段模型与图片槽位
//! - 进度状态与图片 URL 集合

mod errors;
mod image_set;
mod progress;
mod stage;
mod value_objects;

pub use errors::StorybookError;
pub use image_set::{ImageUrlSet, SkippedSlot, SlotOutcome};
pub use progress::{PageMarker, ProgressData, ProgressStatus};
pub use stage::{Slot, Stage, PAGE_COUNT, TOTAL_STEPS};
pub use value_objects::{BookId, ImageData, StoryRequest, StoryText, Title, UserId};
