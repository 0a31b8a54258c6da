//! Generation Adapter - 文本与图片生成服务实现

mod fake_client;
mod openai_client;

pub use fake_client::{FakeGenerationClient, FakeGenerationConfig};
pub use openai_client::{OpenAiClient, OpenAiClientConfig};
