//! Storybook Context - 阶段与槽位
//!
//! 12 个有序阶段:
//! - 1: 故事文本
//! - 2..=11: 第 1..=10 页插图
//! - 12: 封面

use serde::{Deserialize, Serialize};

/// 总阶段数
pub const TOTAL_STEPS: u8 = 12;

/// 故事页数（每页一段）
pub const PAGE_COUNT: u8 = 10;

/// 流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// 生成故事文本
    Story,
    /// 生成第 n 页插图（1..=10）
    Page(u8),
    /// 生成封面
    Cover,
}

impl Stage {
    /// 按阶段编号（1..=12）构造
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Stage::Story),
            2..=11 => Some(Stage::Page(index - 1)),
            12 => Some(Stage::Cover),
            _ => None,
        }
    }

    /// 阶段编号（1..=12）
    pub fn index(&self) -> u8 {
        match self {
            Stage::Story => 1,
            Stage::Page(page) => page + 1,
            Stage::Cover => TOTAL_STEPS,
        }
    }

    /// 该阶段产出的图片槽位，故事阶段没有
    pub fn slot(&self) -> Option<Slot> {
        match self {
            Stage::Story => None,
            Stage::Page(page) => Some(Slot::Page(*page)),
            Stage::Cover => Some(Slot::Cover),
        }
    }

    pub fn is_image_stage(&self) -> bool {
        !matches!(self, Stage::Story)
    }

    /// 所有阶段，按执行顺序
    pub fn all() -> impl Iterator<Item = Stage> {
        (1..=TOTAL_STEPS).filter_map(Stage::from_index)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Story => write!(f, "story"),
            Stage::Page(page) => write!(f, "page {}", page),
            Stage::Cover => write!(f, "cover"),
        }
    }
}

/// 输出图片槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Cover,
    Page(u8),
}

impl Slot {
    /// 书籍记录中的列名（cover / image1..image10）
    pub fn column(&self) -> String {
        match self {
            Slot::Cover => "cover".to_string(),
            Slot::Page(page) => format!("image{}", page),
        }
    }

    /// 存储路径中的名称（cover / page1..page10）
    pub fn storage_name(&self) -> String {
        match self {
            Slot::Cover => "cover".to_string(),
            Slot::Page(page) => format!("page{}", page),
        }
    }

    /// 所有槽位：封面在前，随后第 1..=10 页
    pub fn all() -> impl Iterator<Item = Slot> {
        std::iter::once(Slot::Cover).chain((1..=PAGE_COUNT).map(Slot::Page))
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}
