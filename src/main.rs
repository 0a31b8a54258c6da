//! Pictale - 儿童绘本生成服务
//!
//! 启动顺序: 配置 -> 日志 -> 数据库 -> 生成服务 -> 对象存储 -> Worker -> HTTP

use std::sync::Arc;

use anyhow::Context;
use pictale::application::{
    BookPersistence, CreateStorybookHandler, ImageGeneratorPort, SamplingParams, StageExecutor,
    StageExecutorConfig, TextGeneratorPort, TitleExtractor,
};
use pictale::config::{load_config, print_config, AppConfig, GenerationProvider};
use pictale::domain::storybook::ImageData;
use pictale::infrastructure::adapters::{
    FakeGenerationClient, FileBlobStorage, OpenAiClient, OpenAiClientConfig,
};
use pictale::infrastructure::events::EventPublisher;
use pictale::infrastructure::http::{AppState, HttpServer, ServerConfig};
use pictale::infrastructure::memory::InMemoryJobRegistry;
use pictale::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteBookRepository,
};
use pictale::infrastructure::worker::{StorybookWorker, StorybookWorkerConfig};
use tokio::sync::mpsc;

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},pictale={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// 按配置选择生成服务
fn build_generators(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn TextGeneratorPort>, Arc<dyn ImageGeneratorPort>)> {
    let generation = &config.generation;
    match generation.provider {
        GenerationProvider::OpenAi => {
            let client_config = OpenAiClientConfig::new(
                &generation.base_url,
                generation.api_key().unwrap_or_default(),
            )
            .with_models(&generation.story_model, &generation.image_model)
            .with_timeout(generation.timeout_secs);
            let client = Arc::new(OpenAiClient::new(client_config)?);
            let text: Arc<dyn TextGeneratorPort> = client.clone();
            let image: Arc<dyn ImageGeneratorPort> = client;
            Ok((text, image))
        }
        GenerationProvider::Fake => {
            tracing::warn!("Using fake generation client, no external calls will be made");
            let client = Arc::new(FakeGenerationClient::with_defaults());
            let text: Arc<dyn TextGeneratorPort> = client.clone();
            let image: Arc<dyn ImageGeneratorPort> = client;
            Ok((text, image))
        }
    }
}

/// 读取版式线框图
async fn load_layout_reference(config: &AppConfig) -> anyhow::Result<Option<ImageData>> {
    let Some(path) = &config.pipeline.layout_reference_path else {
        return Ok(None);
    };
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read layout reference {:?}", path))?;
    tracing::info!(path = ?path, size = bytes.len(), "Layout reference loaded");
    Ok(Some(ImageData::new(bytes)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Pictale - 儿童绘本生成服务");
    print_config(&config);

    // 确保数据目录存在
    tokio::fs::create_dir_all(&config.storage.root_dir).await?;
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;
    let book_repo = Arc::new(SqliteBookRepository::new(pool));

    // 对象存储
    let public_base_url = config
        .storage
        .public_base_url
        .clone()
        .unwrap_or_else(|| config.server.public_base_url());
    let blob_storage = Arc::new(FileBlobStorage::new(&config.storage.root_dir, public_base_url).await?);

    // 生成服务与流水线部件
    let (text_generator, image_generator) = build_generators(&config)?;
    let stage_timeout = config.pipeline.stage_timeout();

    let executor_config = StageExecutorConfig {
        story_params: SamplingParams::story().with_model(&config.generation.story_model),
        stage_timeout,
    };
    let executor = StageExecutor::new(text_generator.clone(), image_generator, executor_config)
        .with_layout_reference(load_layout_reference(&config).await?);

    let title_extractor = TitleExtractor::new(text_generator)
        .with_params(SamplingParams::title().with_model(&config.generation.title_model))
        .with_timeout(stage_timeout);

    let persistence = BookPersistence::new(
        book_repo.clone(),
        blob_storage,
        config.storage.bucket.clone(),
    );

    let pipeline = Arc::new(CreateStorybookHandler::new(
        Arc::new(executor),
        Arc::new(title_extractor),
        Arc::new(persistence),
    ));

    // 任务队列、登记表与事件
    let (job_tx, job_rx) = mpsc::channel(config.pipeline.queue_capacity.max(1));
    let job_registry =
        InMemoryJobRegistry::new(job_tx).with_retention(config.pipeline.retained_jobs).arc();
    let event_publisher = Arc::new(EventPublisher::new());

    // 启动 Worker
    let worker = StorybookWorker::new(
        StorybookWorkerConfig {
            max_concurrent: config.pipeline.max_concurrent_jobs,
        },
        job_rx,
        job_registry.clone(),
        pipeline,
        event_publisher.clone(),
    );
    tokio::spawn(worker.run());

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(
        &config.server.host,
        config.server.port,
        &config.storage.root_dir,
    );
    let state = AppState::new(job_registry, book_repo, event_publisher);
    let server = HttpServer::new(server_config, state);

    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
