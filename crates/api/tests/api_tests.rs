use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use kasrisk_api::server::{AppState, build_router};
use kasrisk_api::types::{
    ApiResponse, HistoryPointResponse, LatestSummaryResponse, LegacyDataResponse,
    RefreshResponse, StatusResponse,
};
use kasrisk_cache::SnapshotCache;
use kasrisk_core::common::time::FakeClockProvider;
use kasrisk_core::common::{Asset, DateRange};
use kasrisk_core::config::PipelineSettings;
use kasrisk_core::market::entity::RawSeriesPoint;
use kasrisk_core::market::error::MarketError;
use kasrisk_core::market::port::PriceSeriesProvider;
use kasrisk_manager::refresh::RefreshService;
use kasrisk_pipeline::RiskPipeline;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::Notify;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
}

fn daily_points(days: u32) -> Vec<RawSeriesPoint> {
    (0..days)
        .map(|i| RawSeriesPoint {
            time: now() - ChronoDuration::days(i64::from(days - i)),
            price: 0.1 + f64::from(i % 7) * 0.02,
            volume: Some(5_000.0 + f64::from(i) * 10.0),
            market_cap: Some(2.0e9 + f64::from(i) * 1.0e6),
        })
        .collect()
}

/// 按顺序返回预设结果的价格数据源
struct ScriptedPrices {
    responses: Mutex<VecDeque<Result<Vec<RawSeriesPoint>, MarketError>>>,
    hold: Option<Arc<Notify>>,
}

#[async_trait]
impl PriceSeriesProvider for ScriptedPrices {
    async fn fetch_price_series(
        &self,
        _asset: &Asset,
        _range: DateRange,
    ) -> Result<Vec<RawSeriesPoint>, MarketError> {
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(MarketError::NotFound))
    }
}

struct TestServer {
    base: String,
    refresher: Arc<RefreshService>,
    client: reqwest::Client,
}

// 帮助函数：在随机端口启动测试服务器
async fn spawn_test_server(
    responses: Vec<Result<Vec<RawSeriesPoint>, MarketError>>,
    hold: Option<Arc<Notify>>,
    static_dir: Option<&str>,
) -> Result<TestServer> {
    drop(rustls::crypto::ring::default_provider().install_default());
    drop(
        tracing_subscriber::fmt()
            .with_env_filter("kasrisk_api=debug,kasrisk_manager=debug")
            .with_test_writer()
            .try_init(),
    );

    let prices = Arc::new(ScriptedPrices {
        responses: Mutex::new(responses.into()),
        hold,
    });
    let cache = Arc::new(SnapshotCache::new());
    let refresher = RefreshService::new(
        prices,
        None,
        cache.clone(),
        RiskPipeline::new(PipelineSettings::default())?,
        Asset {
            id: "kaspa".to_string(),
            vs_currency: "usd".to_string(),
        },
        365,
        Arc::new(FakeClockProvider::new(now())),
    );
    let state = AppState {
        reader: cache,
        refresher: refresher.clone(),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base = format!("http://{}", listener.local_addr()?);
    let app = build_router(state, static_dir);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("test server stopped: {}", e);
        }
    });

    Ok(TestServer {
        base,
        refresher,
        client: reqwest::Client::new(),
    })
}

#[tokio::test]
async fn test_unavailable_before_first_refresh() -> Result<()> {
    let server = spawn_test_server(vec![], None, None).await?;

    for path in ["/api/v1/risk/latest", "/api/v1/risk/history?timeframe=1w", "/data"] {
        let res = server.client.get(format!("{}{}", server.base, path)).send().await?;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE, "{}", path);
        let body: Value = res.json().await?;
        assert_eq!(body["success"], false);
    }

    let res = server
        .client
        .get(format!("{}/api/v1/risk/status", server.base))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let status: ApiResponse<StatusResponse> = res.json().await?;
    let status = status.data.unwrap();
    assert!(!status.ready);
    assert!(status.last_success.is_none());
    Ok(())
}

#[tokio::test]
async fn test_refresh_then_query_workflow() -> Result<()> {
    let server = spawn_test_server(vec![Ok(daily_points(60))], None, None).await?;

    // 1. 手动刷新
    let res = server
        .client
        .post(format!("{}/api/v1/risk/refresh", server.base))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let report: ApiResponse<RefreshResponse> = res.json().await?;
    let report = report.data.unwrap();
    assert_eq!(report.row_count, 60);
    assert_eq!(report.as_of, "2024-06-29");

    // 2. 最新摘要
    let res = server
        .client
        .get(format!("{}/api/v1/risk/latest", server.base))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let latest: ApiResponse<LatestSummaryResponse> = res.json().await?;
    assert!(latest.success);
    let latest = latest.data.unwrap();
    assert_eq!(latest.date, "2024-06-29");
    assert_eq!(latest.row_count, 60);
    assert!((0.0..=1.0).contains(&latest.weighted_risk));
    assert!(latest.sentiment_fallback);

    // 3. 1w 窗口含边界共 8 行，以快照内最新日期为终点
    let res = server
        .client
        .get(format!("{}/api/v1/risk/history?timeframe=1w", server.base))
        .send()
        .await?;
    let week: ApiResponse<Vec<HistoryPointResponse>> = res.json().await?;
    let week = week.data.unwrap();
    assert_eq!(week.len(), 8);
    assert_eq!(week[0].date, "2024-06-22");
    assert_eq!(week[7].date, "2024-06-29");

    // 4. 无法识别或缺省的 timeframe 返回全序列
    for query in ["?timeframe=bogus", ""] {
        let res = server
            .client
            .get(format!("{}/api/v1/risk/history{}", server.base, query))
            .send()
            .await?;
        let all: ApiResponse<Vec<HistoryPointResponse>> = res.json().await?;
        assert_eq!(all.data.unwrap().len(), 60);
    }

    // 5. 状态
    let res = server
        .client
        .get(format!("{}/api/v1/risk/status", server.base))
        .send()
        .await?;
    let status: ApiResponse<StatusResponse> = res.json().await?;
    let status = status.data.unwrap();
    assert!(status.ready);
    assert_eq!(status.as_of.as_deref(), Some("2024-06-29"));
    assert_eq!(status.last_success, Some(now().to_rfc3339()));
    assert!(status.last_failure.is_none());
    assert!(!status.refreshing);
    Ok(())
}

#[tokio::test]
async fn test_failed_refresh_reports_bad_gateway_and_keeps_snapshot() -> Result<()> {
    let server = spawn_test_server(
        vec![
            Ok(daily_points(30)),
            Err(MarketError::Network("HTTP 429 Too Many Requests".into())),
        ],
        None,
        None,
    )
    .await?;
    let refresh_url = format!("{}/api/v1/risk/refresh", server.base);

    assert_eq!(
        server.client.post(&refresh_url).send().await?.status(),
        StatusCode::OK
    );
    let res = server.client.post(&refresh_url).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = res.json().await?;
    assert!(body["error"].as_str().unwrap().contains("429"));

    // 旧快照仍可读
    let res = server
        .client
        .get(format!("{}/api/v1/risk/latest", server.base))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .client
        .get(format!("{}/api/v1/risk/status", server.base))
        .send()
        .await?;
    let status: ApiResponse<StatusResponse> = res.json().await?;
    let failure = status.data.unwrap().last_failure.unwrap();
    assert_eq!(failure.kind, "data_unavailable");
    Ok(())
}

#[tokio::test]
async fn test_concurrent_refresh_conflict() -> Result<()> {
    let hold = Arc::new(Notify::new());
    let server = spawn_test_server(vec![Ok(daily_points(20))], Some(hold.clone()), None).await?;

    let refresher = server.refresher.clone();
    let first = tokio::spawn(async move { refresher.refresh().await });
    while !server.refresher.is_refreshing() {
        tokio::task::yield_now().await;
    }

    let res = server
        .client
        .post(format!("{}/api/v1/risk/refresh", server.base))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    hold.notify_one();
    assert_eq!(first.await??.row_count, 20);
    Ok(())
}

#[tokio::test]
async fn test_legacy_routes() -> Result<()> {
    let server = spawn_test_server(vec![Ok(daily_points(45))], None, None).await?;

    let res = server.client.get(format!("{}/", server.base)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.text().await?,
        "Welcome to the Kaspa Risk Metrics API! Use the /data endpoint to get metrics."
    );

    server.refresher.refresh().await?;
    let res = server.client.get(format!("{}/data", server.base)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let data: LegacyDataResponse = res.json().await?;
    let last = daily_points(45).pop().unwrap();
    assert_eq!(data.latest_price, last.price);
    assert_eq!(data.latest_volume, last.volume);
    assert_eq!(data.latest_market_cap, last.market_cap);
    assert!(data.max_drawdown <= 0.0);
    assert!(data.volatility.unwrap() > 0.0);
    Ok(())
}

#[tokio::test]
async fn test_static_dir_fallback_and_openapi() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("index.html"), "<h1>dashboard</h1>")?;
    let static_dir = dir.path().to_string_lossy().to_string();
    let server = spawn_test_server(vec![], None, Some(&static_dir)).await?;

    let res = server.client.get(format!("{}/", server.base)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await?, "<h1>dashboard</h1>");

    let res = server
        .client
        .get(format!("{}/api-docs/openapi.json", server.base))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let doc: Value = res.json().await?;
    assert!(doc["paths"]["/api/v1/risk/latest"].is_object());
    assert!(doc["paths"]["/data"].is_object());
    Ok(())
}
