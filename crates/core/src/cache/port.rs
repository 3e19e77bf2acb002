use crate::cache::entity::CacheStatus;
use crate::cache::error::CacheError;
use crate::common::Timeframe;
use crate::risk::entity::{HistoryPoint, LatestSummary};

/// # Summary
/// 风险快照的只读查询接口 (Port)，供服务层使用。
///
/// # Invariants
/// - 读操作只观察完整的旧快照或完整的新快照，不会看到中间状态。
/// - 读操作不因写入而阻塞等待管道运行。
pub trait SnapshotReader: Send + Sync {
    /// # Summary
    /// 获取最新一日的摘要。
    ///
    /// # Returns
    /// 存在快照时返回摘要副本，否则返回 `CacheError::Unavailable`。
    fn latest_summary(&self) -> Result<LatestSummary, CacheError>;

    /// # Summary
    /// 获取末尾 N 天的历史序列。
    ///
    /// # Logic
    /// 1. 以快照内最大日期减去时间跨度天数为下界 (含边界) 过滤。
    /// 2. `All` 返回完整序列。
    ///
    /// # Arguments
    /// * `timeframe`: 时间跨度。
    ///
    /// # Returns
    /// 按日期升序的历史点，未就绪时返回 `CacheError::Unavailable`。
    fn historical_window(&self, timeframe: Timeframe) -> Result<Vec<HistoryPoint>, CacheError>;

    /// 获取缓存运行状态
    fn status(&self) -> CacheStatus;
}
