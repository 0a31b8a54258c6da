//! Storybook Context - 图片 URL 集合

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::{Slot, PAGE_COUNT};

/// 单个槽位的处理结果
///
/// 单页失败只影响该槽位，不中断流水线
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    /// 已上传并写回书籍记录
    Stored(String),
    /// 跳过（生成、上传或写回失败）
    Skipped(String),
}

impl SlotOutcome {
    pub fn url(&self) -> Option<&str> {
        match self {
            SlotOutcome::Stored(url) => Some(url),
            SlotOutcome::Skipped(_) => None,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, SlotOutcome::Stored(_))
    }
}

/// 被跳过的槽位及原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSlot {
    pub slot: String,
    pub reason: String,
}

/// 槽位 -> 可空 URL
///
/// 只有在流水线全部成功时才完整，否则缺失的槽位为 None
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageUrlSet {
    cover: Option<String>,
    pages: [Option<String>; PAGE_COUNT as usize],
}

impl ImageUrlSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::Cover => self.cover.as_deref(),
            Slot::Page(page) => Self::page_index(page)
                .and_then(|i| self.pages[i].as_deref()),
        }
    }

    /// 设置槽位 URL，页码越界时忽略
    pub fn set(&mut self, slot: Slot, url: Option<String>) {
        match slot {
            Slot::Cover => self.cover = url,
            Slot::Page(page) => {
                if let Some(i) = Self::page_index(page) {
                    self.pages[i] = url;
                }
            }
        }
    }

    /// 记录槽位结果，返回更新后的集合
    pub fn with_outcome(mut self, slot: Slot, outcome: &SlotOutcome) -> Self {
        self.set(slot, outcome.url().map(str::to_string));
        self
    }

    pub fn cover(&self) -> Option<&str> {
        self.cover.as_deref()
    }

    pub fn page(&self, page: u8) -> Option<&str> {
        self.get(Slot::Page(page))
    }

    pub fn is_complete(&self) -> bool {
        Slot::all().all(|slot| self.get(slot).is_some())
    }

    pub fn missing_slots(&self) -> Vec<Slot> {
        Slot::all().filter(|slot| self.get(*slot).is_none()).collect()
    }

    pub fn stored_count(&self) -> usize {
        Slot::all().filter(|slot| self.get(*slot).is_some()).count()
    }

    fn page_index(page: u8) -> Option<usize> {
        if (1..=PAGE_COUNT).contains(&page) {
            Some(page as usize - 1)
        } else {
            None
        }
    }
}

/// 序列化为 {cover, page1..page10}
impl Serialize for ImageUrlSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + PAGE_COUNT as usize))?;
        map.serialize_entry("cover", &self.cover)?;
        for (i, url) in self.pages.iter().enumerate() {
            map.serialize_entry(&format!("page{}", i + 1), url)?;
        }
        map.end()
    }
}
