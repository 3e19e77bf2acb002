use chrono::{DateTime, Duration, Utc};
use kasrisk_core::cache::entity::{CacheStatus, RefreshFailure};
use kasrisk_core::cache::error::CacheError;
use kasrisk_core::cache::port::SnapshotReader;
use kasrisk_core::common::Timeframe;
use kasrisk_core::risk::entity::{HistoryPoint, LatestSummary, Snapshot};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

/// # Summary
/// 缓存的两种状态。
#[derive(Debug, Clone)]
pub enum CacheState {
    // 管道从未成功运行
    Empty,
    Ready(Arc<Snapshot>),
}

/// 快照与失败记录，在同一把锁下一起更新
#[derive(Default)]
struct Slots {
    // 当前快照，尚无成功运行时为 None
    current: Option<Arc<Snapshot>>,
    // 最近一次成功之后的失败记录
    last_failure: Option<RefreshFailure>,
}

/// # Summary
/// 基于单个 `RwLock` 的快照缓存实现。
///
/// # Invariants
/// - 写入只交换 `Arc` 指针，临界区内不做任何计算，读者永远不会被管道运行阻塞。
/// - 读者拿到的是完整快照的共享引用，旧快照在最后一个读者释放后才被回收。
/// - 失败不会触碰已缓存的快照；新快照发布与旧失败清除是同一次写入。
pub struct SnapshotCache {
    slots: RwLock<Slots>,
}

impl SnapshotCache {
    /// # Summary
    /// 创建一个空缓存 (状态为 Unavailable)。
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Slots::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Slots> {
        self.slots.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Slots> {
        self.slots.write().unwrap_or_else(|e| e.into_inner())
    }

    /// # Summary
    /// 原子替换当前快照。
    ///
    /// # Logic
    /// 1. 在写锁外完成 `Arc` 分配。
    /// 2. 同一写锁内交换指针并清除上一次的失败记录。
    ///
    /// # Arguments
    /// * `snapshot`: 已通过校验的新快照。
    ///
    /// # Returns
    /// 被替换下来的旧快照 (若存在)。
    pub fn replace(&self, snapshot: Snapshot) -> Option<Arc<Snapshot>> {
        let next = Arc::new(snapshot);
        debug!(
            "Swapping snapshot: {} rows up to {}",
            next.rows().len(),
            next.max_date()
        );
        let mut slots = self.write();
        slots.last_failure = None;
        slots.current.replace(next)
    }

    /// # Summary
    /// 记录一次失败的刷新，快照保持原状。
    pub fn record_failure(&self, failure: RefreshFailure) {
        warn!(
            "Refresh failed ({}): {}, keeping previous snapshot",
            failure.kind, failure.message
        );
        self.write().last_failure = Some(failure);
    }

    /// 获取当前快照的共享引用
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.read().current.clone()
    }

    pub fn state(&self) -> CacheState {
        match self.current() {
            Some(snapshot) => CacheState::Ready(snapshot),
            None => CacheState::Empty,
        }
    }

    /// 最近一次成功刷新的计算时间
    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.current().map(|s| s.computed_at())
    }

    pub fn last_failure(&self) -> Option<RefreshFailure> {
        self.read().last_failure.clone()
    }

    fn require(&self) -> Result<Arc<Snapshot>, CacheError> {
        self.current().ok_or(CacheError::Unavailable)
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}

/// # Summary
/// 从快照中截取末尾时间窗口。
///
/// # Logic
/// 1. `All` 返回完整序列。
/// 2. 其余取 `date >= max_date - N 天` 的行 (含边界)，行已按日期升序，二分定位起点。
pub fn window(snapshot: &Snapshot, timeframe: Timeframe) -> Vec<HistoryPoint> {
    let rows = snapshot.rows();
    let start = match timeframe.lookback_days() {
        Some(days) => {
            let cutoff = snapshot.max_date() - Duration::days(days);
            rows.partition_point(|r| r.date < cutoff)
        }
        None => 0,
    };
    rows.get(start..)
        .unwrap_or_default()
        .iter()
        .map(HistoryPoint::from)
        .collect()
}

impl SnapshotReader for SnapshotCache {
    fn latest_summary(&self) -> Result<LatestSummary, CacheError> {
        Ok(self.require()?.latest().clone())
    }

    fn historical_window(&self, timeframe: Timeframe) -> Result<Vec<HistoryPoint>, CacheError> {
        Ok(window(&*self.require()?, timeframe))
    }

    fn status(&self) -> CacheStatus {
        // 一次读锁内同时取快照与失败记录
        let (snapshot, last_failure) = {
            let slots = self.read();
            (slots.current.clone(), slots.last_failure.clone())
        };
        CacheStatus {
            ready: snapshot.is_some(),
            as_of: snapshot.as_ref().map(|s| s.max_date()),
            computed_at: snapshot.as_ref().map(|s| s.computed_at()),
            row_count: snapshot.as_ref().map_or(0, |s| s.rows().len()),
            last_failure,
        }
    }
}
