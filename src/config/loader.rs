//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, GenerationProvider};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `PICTALE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `PICTALE_SERVER__PORT=8080`
/// - `PICTALE_GENERATION__API_KEY=sk-...`
/// - `PICTALE_GENERATION__PROVIDER=fake`
/// - `PICTALE_STORAGE__BUCKET=storybooks`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("generation.provider", "openai")?
        .set_default("generation.base_url", "https://api.openai.com/v1")?
        .set_default("generation.story_model", "gpt-4.5-preview")?
        .set_default("generation.title_model", "gpt-4o-mini")?
        .set_default("generation.image_model", "gpt-image-1")?
        .set_default("generation.timeout_secs", 300)?
        .set_default("database.path", "data/pictale.db")?
        .set_default("database.max_connections", 5)?
        .set_default("storage.root_dir", "data/storage")?
        .set_default("storage.bucket", "storybooks")?
        .set_default("pipeline.stage_timeout_secs", 600)?
        .set_default("pipeline.max_concurrent_jobs", 2)?
        .set_default("pipeline.queue_capacity", 64)?
        .set_default("pipeline.retained_jobs", 100)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: PICTALE_GENERATION__API_KEY=sk-...
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("PICTALE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub(crate) fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.generation.provider == GenerationProvider::OpenAi {
        if config.generation.api_key().is_none() {
            return Err(ConfigError::ValidationError(
                "generation.api_key is required for the openai provider".to_string(),
            ));
        }
        if config.generation.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "generation.base_url cannot be empty".to_string(),
            ));
        }
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    if config.storage.bucket.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Storage bucket cannot be empty".to_string(),
        ));
    }

    if config.pipeline.max_concurrent_jobs == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.max_concurrent_jobs cannot be 0".to_string(),
        ));
    }

    if config.pipeline.queue_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.queue_capacity cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Public Base URL: {}", config.server.public_base_url());
    tracing::info!("Generation Provider: {:?}", config.generation.provider);
    if config.generation.provider == GenerationProvider::OpenAi {
        tracing::info!("Generation URL: {}", config.generation.base_url);
        tracing::info!(
            "Models: story={}, title={}, image={}",
            config.generation.story_model,
            config.generation.title_model,
            config.generation.image_model
        );
    }
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Storage: {:?} (bucket {})", config.storage.root_dir, config.storage.bucket);
    match &config.pipeline.layout_reference_path {
        Some(path) => tracing::info!("Layout Reference: {:?}", path),
        None => tracing::info!("Layout Reference: none"),
    }
    tracing::info!("Stage Timeout: {}s", config.pipeline.stage_timeout_secs);
    tracing::info!("Max Concurrent Jobs: {}", config.pipeline.max_concurrent_jobs);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
