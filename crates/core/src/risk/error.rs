use serde::{Deserialize, Serialize};
use thiserror::Error;

/// # Summary
/// 风险管道错误枚举。任一变体都意味着本次运行整体作废，缓存保持原状。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 历史长度不足不属于错误，由截断窗口或中性默认值就地处理。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    // 上游序列缺失或为空
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),
    // 日期乱序、重复或数值非法
    #[error("Malformed series: {0}")]
    MalformedSeries(String),
    // 指标计算过程中出现非预期结果 (例如非有限值)
    #[error("Computation error: {0}")]
    Computation(String),
    // 管道配置非法 (例如负权重)
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    /// 获取错误的类别标签
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::DataUnavailable(_) => ErrorKind::DataUnavailable,
            PipelineError::MalformedSeries(_) => ErrorKind::MalformedSeries,
            PipelineError::Computation(_) => ErrorKind::Computation,
            PipelineError::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }
}

/// # Summary
/// 错误类别标签，用于对外报告失败原因而不暴露内部细节。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DataUnavailable,
    MalformedSeries,
    Computation,
    InvalidConfig,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::DataUnavailable => write!(f, "data_unavailable"),
            ErrorKind::MalformedSeries => write!(f, "malformed_series"),
            ErrorKind::Computation => write!(f, "computation"),
            ErrorKind::InvalidConfig => write!(f, "invalid_config"),
        }
    }
}
