//! Storybook Context - Value Objects

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::StorybookError;

/// 故事生成请求
///
/// 不变量:
/// - theme / character 均非空（去除首尾空白后）
/// - 创建后不可变，整个流水线只消费一次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRequest {
    theme: String,
    character: String,
}

impl StoryRequest {
    pub fn new(
        theme: impl Into<String>,
        character: impl Into<String>,
    ) -> Result<Self, StorybookError> {
        let theme = theme.into().trim().to_string();
        let character = character.into().trim().to_string();
        if theme.is_empty() {
            return Err(StorybookError::EmptyTheme);
        }
        if character.is_empty() {
            return Err(StorybookError::EmptyCharacter);
        }
        Ok(Self { theme, character })
    }

    /// 从标签列表构造主题（以 ", " 连接）
    pub fn from_tags<S: AsRef<str>>(
        tags: &[S],
        character: impl Into<String>,
    ) -> Result<Self, StorybookError> {
        let theme = tags
            .iter()
            .map(|t| t.as_ref().trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        Self::new(theme, character)
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn character(&self) -> &str {
        &self.character
    }
}

/// 生成的故事正文（第 1 阶段产出，之后只读）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryText(String);

impl StoryText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// 第一行非空白文本（保留原始内容，仅去掉行尾 `\r`）
    pub fn first_non_blank_line(&self) -> Option<&str> {
        self.0
            .split('\n')
            .map(|line| line.trim_end_matches('\r'))
            .find(|line| !line.trim().is_empty())
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for StoryText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 书名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title(String);

impl Title {
    pub const MAX_CHARS: usize = 100;

    /// 故事没有任何非空行时的书名
    pub const UNTITLED: &'static str = "Untitled Story";

    pub fn new(title: impl Into<String>) -> Result<Self, StorybookError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(StorybookError::InvalidTitle("标题不能为空".to_string()));
        }
        Ok(Self(title))
    }

    pub fn untitled() -> Self {
        Self(Self::UNTITLED.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Title {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 书籍 ID（由存储层在插入时分配）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(i64);

impl BookId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 用户 ID（由外部认证服务提供的不透明字符串）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Result<Self, StorybookError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(StorybookError::MissingUserId);
        }
        Ok(Self(id))
    }

    /// 缺失或空白的用户 ID 都视为 None
    pub fn parse(id: Option<&str>) -> Option<Self> {
        id.and_then(|s| Self::new(s).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 图片数据
///
/// 内部边界上始终是不透明的字节缓冲，只在外部适配器处编解码。
/// clone 只增加引用计数。
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData(Bytes);

impl ImageData {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ImageData({} bytes)", self.0.len())
    }
}
