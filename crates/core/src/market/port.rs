use crate::common::{Asset, DateRange};
use crate::market::entity::{RawSeriesPoint, SentimentPoint};
use crate::market::error::MarketError;
use async_trait::async_trait;

/// # Summary
/// 价格序列提供者接口（原始数据源）。
///
/// # Invariants
/// - 返回的数据点按时间升序排列。
/// - 成交量与市值若上游未提供，则对应字段为 None，不得伪造。
#[async_trait]
pub trait PriceSeriesProvider: Send + Sync {
    /// # Summary
    /// 获取资产在指定时间区间内的日线价格、成交量与市值序列。
    ///
    /// # Logic
    /// 1. 构建数据源请求。
    /// 2. 执行网络请求并解析响应数据。
    /// 3. 将并行数组按时间戳合并为单一序列。
    ///
    /// # Arguments
    /// * `asset`: 资产标识。
    /// * `range`: 抓取区间。
    ///
    /// # Returns
    /// 成功返回原始数据点列表，失败返回 MarketError。
    async fn fetch_price_series(
        &self,
        asset: &Asset,
        range: DateRange,
    ) -> Result<Vec<RawSeriesPoint>, MarketError>;
}

/// # Summary
/// 情绪指数提供者接口，与价格数据源相互独立。
#[async_trait]
pub trait SentimentProvider: Send + Sync {
    /// # Summary
    /// 获取区间内每日的情绪指数读数。
    ///
    /// # Arguments
    /// * `range`: 抓取区间。
    ///
    /// # Returns
    /// 成功返回按日期排列的读数，失败返回 MarketError。
    async fn fetch_sentiment_series(
        &self,
        range: DateRange,
    ) -> Result<Vec<SentimentPoint>, MarketError>;
}
