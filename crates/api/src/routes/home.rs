//! # 根路径与旧版接口
//!
//! `GET /` 与 `GET /data` 沿用早期单文件服务的响应格式，供仍在使用它们的看板调用。

use axum::Json;
use axum::extract::State;

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{ApiErrorResponse, LegacyDataResponse};

/// 欢迎信息 (纯文本)
#[utoipa::path(
    get,
    path = "/",
    tag = "旧版 (Legacy)",
    responses(
        (status = 200, description = "欢迎信息", body = String, content_type = "text/plain")
    )
)]
pub async fn index(State(state): State<AppState>) -> String {
    format!(
        "Welcome to the {} Risk Metrics API! Use the /data endpoint to get metrics.",
        capitalize(&state.refresher.asset().id)
    )
}

/// 最新指标的扁平视图
#[utoipa::path(
    get,
    path = "/data",
    tag = "旧版 (Legacy)",
    responses(
        (status = 200, description = "最新指标", body = LegacyDataResponse),
        (status = 503, description = "尚无成功的刷新", body = ApiErrorResponse)
    )
)]
pub async fn legacy_data(
    State(state): State<AppState>,
) -> Result<Json<LegacyDataResponse>, ApiError> {
    let summary = state.reader.latest_summary()?;
    Ok(Json(LegacyDataResponse::from(&summary)))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::capitalize;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("kaspa"), "Kaspa");
        assert_eq!(capitalize(""), "");
    }
}
