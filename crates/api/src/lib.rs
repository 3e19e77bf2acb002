//! # `kasrisk-api` - HTTP API 网关
//!
//! 使用 `axum` 构建路由与控制器，通过 `utoipa` 自动生成 OpenAPI 3.0 Swagger 文档。
//!
//! ## 架构职责
//! - 只读查询通过 `SnapshotReader` 端口读取缓存快照，从不等待管道运行
//! - 手动刷新请求转交 `RefreshService`
//! - 将领域模型转换为 DTO 返回给前端

pub mod error;
pub mod routes;
pub mod server;
pub mod types;
