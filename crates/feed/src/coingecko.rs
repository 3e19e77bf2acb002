use crate::http::{build_client, check_status, trim_base};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kasrisk_core::common::{Asset, DateRange};
use kasrisk_core::market::entity::RawSeriesPoint;
use kasrisk_core::market::error::MarketError;
use kasrisk_core::market::port::PriceSeriesProvider;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// CoinGecko 公共 API 地址
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// # Summary
/// CoinGecko 价格序列提供者实现。
///
/// # Invariants
/// - 使用 `market_chart` 接口按日粒度抓取，价格、成交量与市值三组并行数组按毫秒时间戳合并。
/// - `base_url` 可替换，便于指向镜像或本地测试服务。
#[derive(Clone)]
pub struct CoinGeckoProvider {
    // 内部使用的 HTTP 客户端
    client: Client,
    // 不含结尾斜杠的 API 根地址
    base_url: String,
}

impl CoinGeckoProvider {
    /// # Summary
    /// 创建一个新的 CoinGeckoProvider 实例。
    ///
    /// # Arguments
    /// * `base_url`: API 根地址 (例如 `https://api.coingecko.com/api/v3`)。
    /// * `timeout`: 单次请求超时。
    ///
    /// # Returns
    /// HTTP 客户端构建失败时返回 `MarketError::Network`。
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, MarketError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: trim_base(base_url),
        })
    }
}

/// # Summary
/// CoinGecko `market_chart` 响应结构。
///
/// # Invariants
/// - 每个元素都是 `[毫秒时间戳, 数值]` 二元组。
#[derive(Deserialize, Debug)]
pub struct MarketChartResponse {
    prices: Vec<(i64, f64)>,
    #[serde(default)]
    total_volumes: Vec<(i64, Option<f64>)>,
    #[serde(default)]
    market_caps: Vec<(i64, Option<f64>)>,
}

/// # Summary
/// 把 `market_chart` 的三组并行数组合并为原始数据点序列。
///
/// # Logic
/// 1. 以价格数组为主轴，按毫秒时间戳查找同一时刻的成交量与市值。
/// 2. 找不到对应值时保留 None，由 Series Builder 决定整列是否可用。
/// 3. 结果按时间升序排列。
///
/// # Arguments
/// * `resp`: 反序列化后的响应。
///
/// # Returns
/// 价格数组为空返回 NotFound，时间戳越界返回 Parse。
pub fn merge_market_chart(resp: MarketChartResponse) -> Result<Vec<RawSeriesPoint>, MarketError> {
    if resp.prices.is_empty() {
        return Err(MarketError::NotFound);
    }

    let volumes: HashMap<i64, f64> = resp
        .total_volumes
        .into_iter()
        .filter_map(|(ts, v)| v.map(|v| (ts, v)))
        .collect();
    let market_caps: HashMap<i64, f64> = resp
        .market_caps
        .into_iter()
        .filter_map(|(ts, v)| v.map(|v| (ts, v)))
        .collect();

    let mut points = resp
        .prices
        .into_iter()
        .map(|(ts, price)| {
            let time = DateTime::<Utc>::from_timestamp_millis(ts)
                .ok_or_else(|| MarketError::Parse(format!("timestamp {} out of range", ts)))?;
            Ok(RawSeriesPoint {
                time,
                price,
                volume: volumes.get(&ts).copied(),
                market_cap: market_caps.get(&ts).copied(),
            })
        })
        .collect::<Result<Vec<_>, MarketError>>()?;

    points.sort_by_key(|p| p.time);
    Ok(points)
}

#[async_trait]
impl PriceSeriesProvider for CoinGeckoProvider {
    /// # Summary
    /// 从 CoinGecko 抓取资产的日线价格、成交量与市值。
    ///
    /// # Logic
    /// 1. 以区间覆盖的整天数作为 `days` 参数，`interval=daily`。
    /// 2. 发起异步请求并解析并行数组。
    /// 3. 合并为单一序列并裁剪到请求区间内。
    async fn fetch_price_series(
        &self,
        asset: &Asset,
        range: DateRange,
    ) -> Result<Vec<RawSeriesPoint>, MarketError> {
        let url = format!("{}/coins/{}/market_chart", self.base_url, asset.id);
        let days = range.whole_days().max(1).to_string();

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("vs_currency", asset.vs_currency.as_str()),
                ("days", days.as_str()),
                ("interval", "daily"),
            ])
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        let chart: MarketChartResponse = check_status(resp)?
            .json()
            .await
            .map_err(|e| MarketError::Parse(e.to_string()))?;

        let points: Vec<RawSeriesPoint> = merge_market_chart(chart)?
            .into_iter()
            .filter(|p| p.time >= range.start && p.time <= range.end)
            .collect();

        debug!(
            "CoinGecko returned {} points for {}/{} ({} days)",
            points.len(),
            asset.id,
            asset.vs_currency,
            days
        );

        if points.is_empty() {
            return Err(MarketError::NotFound);
        }
        Ok(points)
    }
}
