use crate::http::{build_client, check_status, trim_base};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kasrisk_core::common::DateRange;
use kasrisk_core::market::entity::SentimentPoint;
use kasrisk_core::market::error::MarketError;
use kasrisk_core::market::port::SentimentProvider;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// alternative.me 公共 API 地址
pub const DEFAULT_BASE_URL: &str = "https://api.alternative.me";

/// # Summary
/// alternative.me 加密货币 Fear & Greed 指数提供者。
///
/// # Invariants
/// - 接口按日返回读数，最新的在前；本实现输出按日期升序。
#[derive(Clone)]
pub struct AlternativeMeProvider {
    client: Client,
    base_url: String,
}

impl AlternativeMeProvider {
    /// # Summary
    /// 创建一个新的 AlternativeMeProvider 实例。
    ///
    /// # Arguments
    /// * `base_url`: API 根地址。
    /// * `timeout`: 单次请求超时。
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, MarketError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: trim_base(base_url),
        })
    }
}

/// `/fng/` 响应顶层结构
#[derive(Deserialize, Debug)]
pub struct FngResponse {
    #[serde(default)]
    data: Vec<FngEntry>,
    metadata: Option<FngMetadata>,
}

#[derive(Deserialize, Debug)]
struct FngMetadata {
    error: Option<String>,
}

/// 单条读数，接口把数值与时间戳都编码为字符串
#[derive(Deserialize, Debug)]
struct FngEntry {
    value: String,
    timestamp: String,
}

/// # Summary
/// 把 `/fng/` 响应解析为按日期升序的情绪序列。
///
/// # Logic
/// 1. metadata 中带有错误信息时返回 Unknown。
/// 2. 逐条把字符串读数解析为 0..=100 的整数，把 Unix 秒时间戳转换为 UTC 自然日。
/// 3. 按日期升序排序，同一日期只保留一条。
///
/// # Returns
/// 任一条目无法解析时返回 Parse。
pub fn parse_fng(resp: FngResponse) -> Result<Vec<SentimentPoint>, MarketError> {
    if let Some(meta) = resp.metadata
        && let Some(err) = meta.error
        && !err.is_empty()
    {
        return Err(MarketError::Unknown(err));
    }

    let mut points = resp
        .data
        .into_iter()
        .map(|entry| {
            let index: u8 = entry
                .value
                .trim()
                .parse()
                .map_err(|_| MarketError::Parse(format!("invalid index value `{}`", entry.value)))?;
            if index > 100 {
                return Err(MarketError::Parse(format!("index {} exceeds 100", index)));
            }
            let secs: i64 = entry.timestamp.trim().parse().map_err(|_| {
                MarketError::Parse(format!("invalid timestamp `{}`", entry.timestamp))
            })?;
            let time = DateTime::<Utc>::from_timestamp(secs, 0)
                .ok_or_else(|| MarketError::Parse(format!("timestamp {} out of range", secs)))?;
            Ok(SentimentPoint {
                date: time.date_naive(),
                index,
            })
        })
        .collect::<Result<Vec<_>, MarketError>>()?;

    points.sort_by_key(|p| p.date);
    points.dedup_by_key(|p| p.date);
    Ok(points)
}

#[async_trait]
impl SentimentProvider for AlternativeMeProvider {
    /// # Summary
    /// 抓取区间内每日的 Fear & Greed 读数。
    ///
    /// # Logic
    /// 1. `limit` 取区间整天数加一，覆盖区间两端。
    /// 2. 解析响应并裁剪到区间日期内。
    async fn fetch_sentiment_series(
        &self,
        range: DateRange,
    ) -> Result<Vec<SentimentPoint>, MarketError> {
        let url = format!("{}/fng/", self.base_url);
        let limit = (range.whole_days() + 1).to_string();

        let resp = self
            .client
            .get(&url)
            .query(&[("limit", limit.as_str()), ("format", "json")])
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        let body: FngResponse = check_status(resp)?
            .json()
            .await
            .map_err(|e| MarketError::Parse(e.to_string()))?;

        let (first, last) = (range.start.date_naive(), range.end.date_naive());
        let points: Vec<SentimentPoint> = parse_fng(body)?
            .into_iter()
            .filter(|p| p.date >= first && p.date <= last)
            .collect();

        debug!("alternative.me returned {} sentiment readings", points.len());
        Ok(points)
    }
}
