use chrono::{DateTime, NaiveDate, Utc};
use kasrisk_cache::SnapshotCache;
use kasrisk_core::cache::entity::RefreshFailure;
use kasrisk_core::common::time::TimeProvider;
use kasrisk_core::common::{Asset, DateRange};
use kasrisk_core::market::port::{PriceSeriesProvider, SentimentProvider};
use kasrisk_core::risk::entity::Snapshot;
use kasrisk_core::risk::error::{ErrorKind, PipelineError};
use kasrisk_pipeline::RiskPipeline;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// # Summary
/// 刷新流程的统一错误类型。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RefreshError {
    // 抓取或计算失败，缓存保持原状
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    // 已有一次刷新正在进行
    #[error("Refresh already in progress")]
    InFlight,
}

impl RefreshError {
    /// 管道错误的类别标签，InFlight 没有类别
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            RefreshError::Pipeline(e) => Some(e.kind()),
            RefreshError::InFlight => None,
        }
    }
}

/// # Summary
/// 一次成功刷新的摘要。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshReport {
    // 新快照的最新数据日期
    pub as_of: NaiveDate,
    pub row_count: usize,
    pub weighted_risk: f64,
    pub computed_at: DateTime<Utc>,
    // 使用中性情绪默认值的行数
    pub sentiment_fallback_rows: usize,
}

impl RefreshReport {
    fn from_snapshot(snapshot: &Snapshot) -> Self {
        let latest = snapshot.latest();
        Self {
            as_of: latest.date,
            row_count: latest.row_count,
            weighted_risk: latest.weighted_risk,
            computed_at: snapshot.computed_at(),
            sentiment_fallback_rows: snapshot
                .rows()
                .iter()
                .filter(|r| r.sentiment_fallback)
                .count(),
        }
    }
}

/// # Summary
/// 刷新服务，系统唯一的快照写入者。
/// 编译期只依赖 `kasrisk-core` 中的端口定义，数据源通过构造函数注入。
///
/// # Invariants
/// - 同一时刻最多只有一次刷新在执行，第二个并发请求立即返回 `InFlight`。
/// - 刷新是全有或全无的：只有完整且通过校验的快照才会写入缓存。
pub struct RefreshService {
    // 价格序列数据源
    prices: Arc<dyn PriceSeriesProvider>,
    // 情绪数据源，未配置时所有行使用中性默认值
    sentiment: Option<Arc<dyn SentimentProvider>>,
    // 快照缓存 (写端)
    cache: Arc<SnapshotCache>,
    pipeline: RiskPipeline,
    asset: Asset,
    // 每次刷新回溯的天数
    history_days: u32,
    clock: Arc<dyn TimeProvider>,
    // 单写者闸门
    gate: Mutex<()>,
}

impl RefreshService {
    /// # Summary
    /// 创建 RefreshService 实例。
    ///
    /// # Arguments
    /// * `prices`: 价格序列数据源。
    /// * `sentiment`: 可选的情绪数据源。
    /// * `cache`: 快照缓存。
    /// * `pipeline`: 已校验配置的计算管道。
    /// * `asset`: 被评估的资产。
    /// * `history_days`: 回溯天数。
    /// * `clock`: 时间供给器。
    ///
    /// # Returns
    /// 可共享的服务实例。
    pub fn new(
        prices: Arc<dyn PriceSeriesProvider>,
        sentiment: Option<Arc<dyn SentimentProvider>>,
        cache: Arc<SnapshotCache>,
        pipeline: RiskPipeline,
        asset: Asset,
        history_days: u32,
        clock: Arc<dyn TimeProvider>,
    ) -> Arc<Self> {
        Arc::new(Self {
            prices,
            sentiment,
            cache,
            pipeline,
            asset,
            history_days,
            clock,
            gate: Mutex::new(()),
        })
    }

    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    /// 当前是否有刷新正在执行
    pub fn is_refreshing(&self) -> bool {
        self.gate.try_lock().is_err()
    }

    /// # Summary
    /// 执行一次完整的刷新。
    ///
    /// # Logic
    /// 1. 尝试获取单写者闸门，失败返回 `InFlight`。
    /// 2. 以当前时间为终点抓取价格与情绪序列。
    /// 3. 运行计算管道。
    /// 4. 成功时原子替换快照；失败时记录失败并保留旧快照。
    ///
    /// # Returns
    /// 成功返回刷新摘要，失败返回 RefreshError。
    pub async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        let _guard = self.gate.try_lock().map_err(|_| RefreshError::InFlight)?;
        let now = self.clock.now();
        info!(
            "Refreshing risk snapshot for {}/{} ({} days)",
            self.asset.id, self.asset.vs_currency, self.history_days
        );

        match self.run_once(now).await {
            Ok(snapshot) => {
                let report = RefreshReport::from_snapshot(&snapshot);
                self.cache.replace(snapshot);
                info!(
                    "Refresh finished: {} rows up to {}, weighted_risk={:.4}",
                    report.row_count, report.as_of, report.weighted_risk
                );
                Ok(report)
            }
            Err(e) => {
                error!("Refresh failed [{}]: {}", e.kind(), e);
                self.cache.record_failure(RefreshFailure::from_error(now, &e));
                Err(e.into())
            }
        }
    }

    /// 抓取全部输入并运行管道，不触碰缓存
    async fn run_once(&self, now: DateTime<Utc>) -> Result<Snapshot, PipelineError> {
        let range = DateRange::trailing_days(now, self.history_days);

        let prices = self
            .prices
            .fetch_price_series(&self.asset, range)
            .await
            .map_err(|e| PipelineError::DataUnavailable(format!("price feed: {}", e)))?;

        let sentiment = match &self.sentiment {
            Some(provider) => Some(
                provider
                    .fetch_sentiment_series(range)
                    .await
                    .map_err(|e| PipelineError::DataUnavailable(format!("sentiment feed: {}", e)))?,
            ),
            None => None,
        };

        self.pipeline.run(&prices, sentiment.as_deref(), now)
    }

    /// # Summary
    /// 启动周期刷新后台协程。
    ///
    /// # Logic
    /// 1. 首个 tick 立即触发，之后按 `interval` 周期执行。
    /// 2. 错过的 tick 不补跑，失败只记录日志，不终止循环。
    /// 3. 周期下限为 1 秒。
    ///
    /// # Arguments
    /// * `interval`: 刷新周期。
    ///
    /// # Returns
    /// 后台协程句柄，调用方可 abort 以停止调度。
    pub fn spawn_scheduler(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        // 周期为 0 时 tokio interval 会 panic
        let interval = interval.max(Duration::from_secs(1));
        info!("Starting refresh scheduler (every {:?})", interval);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                // 失败已在 refresh 内记录
                if let Err(RefreshError::InFlight) = self.refresh().await {
                    info!("Scheduled refresh skipped, another refresh is in progress");
                }
            }
        })
    }
}
