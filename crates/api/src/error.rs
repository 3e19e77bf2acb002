//! # API 统一错误处理
//!
//! 将下层各 crate 的错误类型统一映射到 HTTP 状态码与 JSON 响应体。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kasrisk_core::cache::error::CacheError;
use kasrisk_core::risk::error::PipelineError;
use kasrisk_manager::refresh::RefreshError;
use thiserror::Error;

use crate::types::ApiErrorResponse;

/// API 层统一错误枚举
#[derive(Error, Debug)]
pub enum ApiError {
    /// 尚无可用快照 (503)
    #[error("Risk snapshot not available yet")]
    Unavailable,

    /// 已有刷新在执行 (409)
    #[error("{0}")]
    Conflict(String),

    /// 上游数据源失败或返回异常数据 (502)
    #[error("{0}")]
    BadGateway(String),

    /// 下层业务错误 (500)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// 将 `ApiError` 转换为 axum 的 HTTP 响应
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            ApiError::Internal(msg) => {
                // 内部错误只记录日志，不向客户端透传细节
                tracing::error!("Internal API error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ApiErrorResponse::from_msg(message));
        (status, body).into_response()
    }
}

/// 从 `CacheError` 转换
impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Unavailable => ApiError::Unavailable,
        }
    }
}

/// 从 `RefreshError` 转换
impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        match &err {
            RefreshError::InFlight => ApiError::Conflict(err.to_string()),
            RefreshError::Pipeline(
                PipelineError::DataUnavailable(_) | PipelineError::MalformedSeries(_),
            ) => ApiError::BadGateway(err.to_string()),
            RefreshError::Pipeline(_) => ApiError::Internal(err.to_string()),
        }
    }
}
