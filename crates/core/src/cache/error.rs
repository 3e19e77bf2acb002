use thiserror::Error;

/// # Summary
/// 快照缓存域错误枚举。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - `Unavailable` 只表示 "尚无成功运行"，与成功但为空的查询结果严格区分。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    // 管道从未成功运行过
    #[error("Snapshot unavailable: no successful refresh yet")]
    Unavailable,
}
