pub mod time;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 被评估的资产标识，对应上游行情源的资产 ID 与计价货币。
///
/// # Invariants
/// - `id` 必须是上游数据源可识别的资产代码 (例如 CoinGecko 的 `kaspa`)。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    // 资产代码 (例如: kaspa, bitcoin)
    pub id: String,
    // 计价货币 (例如: usd)
    pub vs_currency: String,
}

/// # Summary
/// 历史窗口查询的时间跨度枚举。
///
/// # Invariants
/// - 除 `All` 以外，每个枚举值都对应固定的自然日天数。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Timeframe {
    // 最近 7 天
    Week1,
    // 最近 30 天
    Month1,
    // 最近 90 天
    Month3,
    // 最近 365 天
    Year1,
    // 全部序列
    #[default]
    All,
}

impl Timeframe {
    /// # Summary
    /// 获取该时间跨度回溯的自然日天数。
    ///
    /// # Returns
    /// `All` 返回 None，其余返回对应天数。
    pub fn lookback_days(self) -> Option<i64> {
        match self {
            Timeframe::Week1 => Some(7),
            Timeframe::Month1 => Some(30),
            Timeframe::Month3 => Some(90),
            Timeframe::Year1 => Some(365),
            Timeframe::All => None,
        }
    }

    /// # Summary
    /// 宽松解析：无法识别的取值回退为 `All`。
    ///
    /// # Logic
    /// 1. 先尝试严格解析。
    /// 2. 失败时返回 `Timeframe::All`，对应服务层 "未知参数返回全序列" 的约定。
    ///
    /// # Arguments
    /// * `s`: 原始查询字符串。
    ///
    /// # Returns
    /// 解析后的时间跨度。
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(Timeframe::All)
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1w" | "week1" => Ok(Timeframe::Week1),
            "1m" | "month1" => Ok(Timeframe::Month1),
            "3m" | "month3" => Ok(Timeframe::Month3),
            "1y" | "year1" => Ok(Timeframe::Year1),
            "all" => Ok(Timeframe::All),
            _ => Err(format!("Unknown Timeframe: {}", s)),
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timeframe::Week1 => write!(f, "1w"),
            Timeframe::Month1 => write!(f, "1m"),
            Timeframe::Month3 => write!(f, "3m"),
            Timeframe::Year1 => write!(f, "1y"),
            Timeframe::All => write!(f, "all"),
        }
    }
}

/// # Summary
/// 上游抓取的时间区间 (闭区间)。
///
/// # Invariants
/// - `start <= end`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// # Summary
    /// 以 `end` 为终点向前回溯 `days` 天构造区间。
    ///
    /// # Arguments
    /// * `end`: 区间终点。
    /// * `days`: 回溯天数。
    ///
    /// # Returns
    /// 构造好的区间。
    pub fn trailing_days(end: DateTime<Utc>, days: u32) -> Self {
        Self {
            start: end - Duration::days(i64::from(days)),
            end,
        }
    }

    /// 区间覆盖的整天数 (向上取整)。
    pub fn whole_days(&self) -> i64 {
        let span = self.end - self.start;
        let days = span.num_days();
        if span > Duration::days(days) {
            days + 1
        } else {
            days
        }
    }
}
