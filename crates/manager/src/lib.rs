//! # `kasrisk-manager` - 应用服务层
//!
//! 编排 "抓取 → 计算 → 交换快照" 的刷新流程，并提供周期调度。

pub mod refresh;
