use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// 上游行情源返回的单个原始数据点。
/// 价格、成交量与市值在上游是并行数组，由数据源适配器按时间戳合并。
///
/// # Invariants
/// - 同一序列内 `time` 单调不减。
/// - `price`、`volume`、`market_cap` 均不为负。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeriesPoint {
    // 采样时间 (UTC)
    pub time: DateTime<Utc>,
    // 价格
    pub price: f64,
    // 24 小时成交量 (上游缺失时为 None)
    pub volume: Option<f64>,
    // 总市值 (上游缺失时为 None)
    pub market_cap: Option<f64>,
}

impl RawSeriesPoint {
    /// 获取该数据点所属的 UTC 自然日
    pub fn date(&self) -> NaiveDate {
        self.time.date_naive()
    }
}

/// # Summary
/// 情绪指数 (Fear & Greed) 的单日读数。
///
/// # Invariants
/// - `index` 位于 0..=100，0 为极度恐惧，100 为极度贪婪。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentPoint {
    // 读数所属日期
    pub date: NaiveDate,
    // 指数值
    pub index: u8,
}
