//! Pictale - 儿童绘本生成服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 一次运行 12 个阶段：故事正文、10 页插图、封面。
//!
//! 领域层 (domain/):
//! - Storybook Context: 值对象、阶段模型、进度、图片 URL 集合
//! - 提示词构造器与书名回退规则
//!
//! 应用层 (application/):
//! - Ports: 端口定义（TextGenerator, ImageGenerator, BookRepository, BlobStorage, JobRegistry）
//! - Services: StageExecutor, TitleExtractor, BookPersistence
//! - Commands: 流水线编排器与后台任务提交
//! - Queries: 书籍与任务查询
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: JobRegistry 内存实现
//! - Worker: StorybookWorker 后台流水线
//! - Persistence: SQLite 存储
//! - Adapters: OpenAI 兼容客户端、Fake 客户端、文件对象存储
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
