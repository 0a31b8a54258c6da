//! 书名回退规则
//!
//! 书名抽取服务失败时使用：取故事第一行非空文本，超长则截断。

use super::storybook::{StoryText, Title};

const ELLIPSIS: &str = "...";

/// 从故事正文推导书名
///
/// 只用空白判断哪一行非空，选中的行原样保留。
pub fn fallback_title(story: &StoryText) -> Title {
    let line = story.first_non_blank_line().unwrap_or(Title::UNTITLED);

    Title::new(truncate_title(line)).unwrap_or_else(|_| Title::untitled())
}

/// 按字符数截断到 [`Title::MAX_CHARS`] 以内
pub fn truncate_title(title: &str) -> String {
    if title.chars().count() <= Title::MAX_CHARS {
        return title.to_string();
    }
    let keep = Title::MAX_CHARS - ELLIPSIS.len();
    let mut truncated: String = title.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_line_is_title() {
        let story = StoryText::new("\n\nThe Brave Turtle\nOnce upon a time");
        assert_eq!(fallback_title(&story).as_str(), "The Brave Turtle");
    }

    #[test]
    fn test_chosen_line_is_not_trimmed() {
        let story = StoryText::new("   Judul Cerita\nIsi");
        assert_eq!(fallback_title(&story).as_str(), "   Judul Cerita");
    }

    #[test]
    fn test_blank_story_is_untitled() {
        assert_eq!(fallback_title(&StoryText::new("")).as_str(), Title::UNTITLED);
        assert_eq!(fallback_title(&StoryText::new(" \n\t\n")).as_str(), Title::UNTITLED);
    }

    #[test]
    fn test_long_line_is_truncated() {
        let story = StoryText::new("a".repeat(150));
        let title = fallback_title(&story);
        assert_eq!(title.as_str().chars().count(), 100);
        assert!(title.as_str().ends_with("..."));
        assert_eq!(&title.as_str()[..97], "a".repeat(97));
    }

    #[test]
    fn test_exactly_max_is_kept() {
        let line = "b".repeat(100);
        assert_eq!(truncate_title(&line), line);
    }

    #[test]
    fn test_truncate_counts_chars() {
        let line = "龟".repeat(120);
        let truncated = truncate_title(&line);
        assert_eq!(truncated.chars().count(), 100);
    }
}
