//! # `kasrisk-cache` - 风险快照缓存
//!
//! 单写多读的内存快照存储，实现 `kasrisk-core` 中的 `SnapshotReader` 端口。

pub mod snapshot;

pub use snapshot::{CacheState, SnapshotCache};
