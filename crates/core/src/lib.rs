//! # `kasrisk-core` - 领域契约层
//!
//! 定义风险评分系统的实体、错误与端口 (Port)，不包含任何具体实现。
//! 其余 crate 只通过这里的 Trait 与类型彼此协作。

pub mod cache;
pub mod common;
pub mod config;
pub mod market;
pub mod risk;
