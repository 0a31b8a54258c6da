//! 提示词构造器
//!
//! 纯函数：同样的输入总是得到同样的文本。
//!
//! 每个阶段的提示词都是同一份分步协议:
//! - 第 1..=12 步清单，已完成的步骤标记 `✅`，当前步骤标记 `[NOW]`
//! - 图片阶段共享的构图标准
//! - 只返回所要求产物的说明
//! - 图片阶段在末尾附上完整故事正文

use super::storybook::{Stage, StoryRequest, StoryText, PAGE_COUNT, TOTAL_STEPS};

const PREAMBLE: &str = "You are a **storyteller** who knows how young children read and \
understand the text and pictures of a short story to take away its moral. Your goal is to \
create a short illustrated storybook made of 10 landscape story pages (one paragraph per \
page) and 1 landscape cover page, about a character chosen by the user, carrying a moral \
message chosen by the user. You will do this step by step through prompt chaining. The \
instructions and details follow.";

const STORY_CRITERIA: &str = "\t- **Theme**: [from the user input]\n\
\t- **Length**: 150-200 words in 10 paragraphs\n\
\t- **Main character description**: [from the user input]\n\
\t- **Plot (general)**: the main character must interact with at least one other character \
to convey the moral named in the theme.\n\
\t- **Setting**: fit the main character and the plot.";

const IMAGE_CRITERIA: &str = "> From step 2 to 11, use the following image generation criteria:\n\
> - Use the attached wireframe layout (image 1) as the base layout of the illustration: \
visual illustration on the left, paragraph text on the right.\n\
> - Use a small gradient transition between the visual section on the left and the text \
section on the right.\n\
> - Use a serif font for the text section.\n\
> - Use a Disney illustration style.\n\
> - Look at the design from the previous step (image 2) to keep the styling consistent.\n\
> - The image has a landscape ratio (1536 * 1024).";

const COVER_CRITERIA: &str = "\t- Use the attached wireframe layout (image 1) as the base \
layout: title text on top, an illustration of the main character and the setting below it.\n\
\t- Use a serif font for the text.\n\
\t- Use a Disney illustration style.\n\
\t- The image has a landscape ratio (1536 * 1024).";

const COVER_CRITERIA_CURRENT: &str = "\t- Layout: title text on top, an illustration of the \
main character and the setting below it.\n\
\t- Make sure the styling is consistent, one image is attached as an example.\n\
\t- Use a Disney illustration style.\n\
\t- Use a serif font for the text.\n\
\t- The image has a landscape ratio (1536 * 1024).";

const NOTES: &str = "**NOTES:**\n\
- For every instruction, ANSWER ONLY WITH WHAT IS ASKED, with no other information or text.\n\
\t- When asked to write the text in step 1, return only the text!\n\
\t- For steps 2-12, return only the image with no explanation or text at all!\n\
- Always keep the story context in mind.\n\
- Make sure the style of all illustrations is consistent.";

/// 第 1 阶段的系统提示词
pub fn story_system_prompt() -> String {
    render_protocol(Stage::Story)
}

/// 第 1 阶段的用户消息
pub fn story_user_prompt(request: &StoryRequest) -> String {
    format!(
        "Theme: {}\nMain character: {}",
        request.theme(),
        request.character()
    )
}

/// 构造指定阶段的提示词
///
/// 故事阶段返回系统提示词（用户消息见 [`story_user_prompt`]），
/// 图片阶段在协议后附上故事正文。
pub fn build_stage_prompt(stage: Stage, story: &StoryText) -> String {
    match stage {
        Stage::Story => story_system_prompt(),
        _ => format!(
            "{}\n\n**STORY TEXT:**\n{}",
            render_protocol(stage),
            story.as_str()
        ),
    }
}

fn render_protocol(current: Stage) -> String {
    let now = current.index();
    let mut out = String::new();

    out.push_str(PREAMBLE);
    out.push_str("\n\n**INSTRUCTIONS:**\n");
    out.push_str(&format!(
        "Create a short storybook that puts appealing visuals for toddlers first, step by \
step. You are now working on step {}:\n",
        now
    ));

    for step in 1..=TOTAL_STEPS {
        let marker = step_marker(step, now);

        match step {
            1 => {
                if step == now {
                    out.push_str(&format!(
                        "1. {}Write a short fairy tale script with its title that follows \
these criteria:\n{}\n",
                        marker, STORY_CRITERIA
                    ));
                } else {
                    out.push_str(&format!(
                        "1. {}Write a short fairy tale script with its title. (Already \
included in this prompt)\n",
                        marker
                    ));
                }
                // 封面阶段不再重复分页构图标准
                if current != Stage::Cover {
                    out.push('\n');
                    out.push_str(IMAGE_CRITERIA);
                    out.push_str("\n\n");
                }
            }
            2 => out.push_str(&format!(
                "2. {}For each of the {} paragraphs, create a visual illustration that \
depicts the situation in that paragraph. We start with paragraph 1, using the image \
criteria above.\n",
                marker, PAGE_COUNT
            )),
            12 => {
                let criteria = if step == now {
                    COVER_CRITERIA_CURRENT
                } else {
                    COVER_CRITERIA
                };
                out.push_str(&format!(
                    "\n12. {}Once all {} illustrations are done, create an appealing cover \
for the story using the following image criteria:\n{}\n",
                    marker, PAGE_COUNT, criteria
                ));
            }
            n => out.push_str(&format!(
                "{}. {}Next, create a visual illustration for paragraph {}, with the image \
criteria above, same as before.\n",
                n,
                marker,
                n - 1
            )),
        }
    }

    out.push('\n');
    out.push_str(NOTES);
    out
}

fn step_marker(step: u8, now: u8) -> &'static str {
    if step < now {
        "✅ "
    } else if step == now {
        "[NOW] "
    } else {
        ""
    }
}
