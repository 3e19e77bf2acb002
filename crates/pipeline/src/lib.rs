//! # `kasrisk-pipeline` - 风险评分计算管道
//!
//! 纯计算层：输入原始价格与情绪序列，输出不可变的 [`Snapshot`](kasrisk_core::risk::entity::Snapshot)。
//! 不做任何 I/O，也不持有任何共享状态。

pub mod aggregate;
pub mod indicator;
pub mod normalize;
pub mod pipeline;
pub mod series;
pub mod window;

pub use pipeline::RiskPipeline;
