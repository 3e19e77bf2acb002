use crate::risk::error::{ErrorKind, PipelineError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// 一次失败刷新的记录。与快照分开保存，不影响已缓存的数据。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshFailure {
    // 失败发生时间
    pub at: DateTime<Utc>,
    // 错误类别
    pub kind: ErrorKind,
    // 错误描述
    pub message: String,
}

impl RefreshFailure {
    /// 从管道错误构造失败记录
    pub fn from_error(at: DateTime<Utc>, err: &PipelineError) -> Self {
        Self {
            at,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// # Summary
/// 快照缓存的运行状态概览。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatus {
    // 是否已有可用快照
    pub ready: bool,
    // 快照最新数据日期
    pub as_of: Option<NaiveDate>,
    // 快照计算时间
    pub computed_at: Option<DateTime<Utc>>,
    // 快照行数
    pub row_count: usize,
    // 最近一次失败 (若在最近一次成功之后发生)
    pub last_failure: Option<RefreshFailure>,
}
