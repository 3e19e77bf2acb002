mod settings;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use kasrisk_api::server::{AppState, start_server};
use kasrisk_cache::SnapshotCache;
use kasrisk_core::common::time::RealTimeProvider;
use kasrisk_core::config::LoggingConfig;
use kasrisk_core::market::port::SentimentProvider;
use kasrisk_feed::alternative::AlternativeMeProvider;
use kasrisk_feed::coingecko::CoinGeckoProvider;
use kasrisk_manager::refresh::RefreshService;
use kasrisk_pipeline::RiskPipeline;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const CONFIG_PATH: &str = "config.toml";

/// # Summary
/// 初始化全局日志：标准输出，另可按天滚动写入文件。
///
/// # Returns
/// 启用文件日志时返回后台写线程的守卫，须持有到进程退出。
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    // RUST_LOG 优先于配置文件
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &config.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "kasrisk.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    guard
}

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化所有具体实现组件并通过 `Arc<dyn Trait>` 注入到 RefreshService 与 API 层。
///
/// # Logic
/// 1. 加载分层配置并初始化全局日志。
/// 2. 实例化基础设施层（行情源、情绪源、快照缓存）。
/// 3. 构造计算管道与刷新服务，启动周期刷新。
/// 4. 启动 HTTP 服务，收到退出信号后结束。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 配置与日志
    let mut config = settings::load_config(Path::new(CONFIG_PATH))?;
    let _log_guard = init_logging(&config.logging);
    info!("kasrisk starting...");
    if let Err(e) =
        settings::apply_port_override(&mut config, std::env::var("PORT").ok().as_deref())
    {
        warn!("Ignoring {}", e);
    }

    // reqwest 使用 rustls-no-provider，须在创建客户端前安装进程级加密后端
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("A rustls crypto provider was already installed");
    }

    // 2. 实例化基础设施层
    let timeout = Duration::from_secs(config.feed.timeout_secs);
    let prices = Arc::new(CoinGeckoProvider::new(
        config.feed.price_base_url.clone(),
        timeout,
    )?);
    let sentiment: Option<Arc<dyn SentimentProvider>> = if config.feed.sentiment_enabled {
        Some(Arc::new(AlternativeMeProvider::new(
            config.feed.sentiment_base_url.clone(),
            timeout,
        )?))
    } else {
        info!("Sentiment feed disabled, every row uses the neutral reading");
        None
    };
    let cache = Arc::new(SnapshotCache::new());

    // 3. 计算管道与刷新服务
    let pipeline = RiskPipeline::new(config.pipeline)?;
    let refresher = RefreshService::new(
        prices,
        sentiment,
        cache.clone(),
        pipeline,
        config.feed.asset(),
        config.feed.history_days,
        Arc::new(RealTimeProvider),
    );
    let scheduler = refresher
        .clone()
        .spawn_scheduler(Duration::from_secs(config.schedule.refresh_interval_secs));

    // 4. HTTP 服务
    let state = AppState {
        reader: cache,
        refresher,
    };
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    tokio::select! {
        res = start_server(state, &bind_addr, config.server.static_dir.as_deref()) => res?,
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("Shutdown signal received. Exiting...");
        }
    }

    scheduler.abort();
    Ok(())
}
