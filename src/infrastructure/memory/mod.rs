//! Memory Layer - In-Memory State Management
//!
//! 实现 JobRegistry，管理后台绘本任务的内存状态

mod job_registry;

pub use job_registry::InMemoryJobRegistry;
