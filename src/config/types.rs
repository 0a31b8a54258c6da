//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 生成服务配置
    #[serde(default)]
    pub generation: GenerationConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 图片存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 流水线配置
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 公开访问的 Base URL
    /// 如果未设置，则使用 http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 获取公开的 Base URL
    pub fn public_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| {
                let host = if self.host == "0.0.0.0" {
                    "localhost"
                } else {
                    &self.host
                };
                format!("http://{}:{}", host, self.port)
            })
    }
}

/// 生成服务提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProvider {
    /// OpenAI 兼容 HTTP 接口
    #[default]
    OpenAi,
    /// 本地假实现，不需要 API key
    Fake,
}

/// 生成服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub provider: GenerationProvider,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_generation_base_url")]
    pub base_url: String,

    /// 故事正文模型
    #[serde(default = "default_story_model")]
    pub story_model: String,

    /// 书名抽取模型
    #[serde(default = "default_title_model")]
    pub title_model: String,

    /// 图片模型
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// HTTP 请求超时时间（秒）
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

fn default_generation_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_story_model() -> String {
    "gpt-4.5-preview".to_string()
}

fn default_title_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_image_model() -> String {
    "gpt-image-1".to_string()
}

fn default_generation_timeout() -> u64 {
    300
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: GenerationProvider::default(),
            api_key: None,
            base_url: default_generation_base_url(),
            story_model: default_story_model(),
            title_model: default_title_model(),
            image_model: default_image_model(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

impl GenerationConfig {
    /// 非空的 API key
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/pictale.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// 图片存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 存储根目录，每个 bucket 一个子目录
    #[serde(default = "default_storage_root")]
    pub root_dir: PathBuf,

    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// 图片公开 URL 的前缀，未设置时使用 server.public_base_url()
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data/storage")
}

fn default_bucket() -> String {
    "storybooks".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: default_storage_root(),
            bucket: default_bucket(),
            public_base_url: None,
        }
    }
}

/// 流水线配置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// 版式线框图（PNG），页面阶段作为第一张参考图
    #[serde(default)]
    pub layout_reference_path: Option<PathBuf>,

    /// 单阶段超时（秒），0 表示不限制
    #[serde(default = "default_stage_timeout")]
    pub stage_timeout_secs: u64,

    /// 同时运行的流水线数量
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// 待执行任务队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 内存中保留的已结束任务数量
    #[serde(default = "default_retained_jobs")]
    pub retained_jobs: usize,
}

fn default_stage_timeout() -> u64 {
    600
}

fn default_max_concurrent_jobs() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    64
}

fn default_retained_jobs() -> usize {
    100
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            layout_reference_path: None,
            stage_timeout_secs: default_stage_timeout(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
            queue_capacity: default_queue_capacity(),
            retained_jobs: default_retained_jobs(),
        }
    }
}

impl PipelineConfig {
    pub fn stage_timeout(&self) -> Option<Duration> {
        (self.stage_timeout_secs > 0).then(|| Duration::from_secs(self.stage_timeout_secs))
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
