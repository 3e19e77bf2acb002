//! # 风险评分路由控制器
//!
//! 实现 `/api/v1/risk` 路径下的 REST 接口。
//! 查询接口只读取缓存快照，未就绪时返回 503；刷新接口同步执行一次管道运行。

use axum::Json;
use axum::extract::{Query, State};
use kasrisk_core::common::Timeframe;

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{
    ApiErrorResponse, ApiResponse, HistoryPointResponse, HistoryQuery, LatestSummaryResponse,
    RefreshResponse, StatusResponse,
};

/// 获取最新一日的风险摘要
#[utoipa::path(
    get,
    path = "/api/v1/risk/latest",
    tag = "风险 (Risk)",
    responses(
        (status = 200, description = "最新摘要获取成功", body = ApiResponse<LatestSummaryResponse>),
        (status = 503, description = "尚无成功的刷新", body = ApiErrorResponse)
    )
)]
pub async fn get_latest(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<LatestSummaryResponse>>, ApiError> {
    let summary = state.reader.latest_summary()?;
    Ok(Json(ApiResponse::ok(summary.into())))
}

/// 获取末尾时间窗口的历史序列
///
/// 窗口以快照内最新日期为终点 (含边界)。
/// 无法识别的 `timeframe` 返回全序列。
#[utoipa::path(
    get,
    path = "/api/v1/risk/history",
    tag = "风险 (Risk)",
    params(
        ("timeframe" = Option<String>, Query, description = "1w / 1m / 3m / 1y / all，默认 all")
    ),
    responses(
        (status = 200, description = "历史序列获取成功", body = ApiResponse<Vec<HistoryPointResponse>>),
        (status = 503, description = "尚无成功的刷新", body = ApiErrorResponse)
    )
)]
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<HistoryPointResponse>>>, ApiError> {
    let timeframe = query
        .timeframe
        .as_deref()
        .map(Timeframe::parse_lenient)
        .unwrap_or_default();
    let points = state.reader.historical_window(timeframe)?;
    Ok(Json(ApiResponse::ok(
        points.into_iter().map(HistoryPointResponse::from).collect(),
    )))
}

/// 获取快照缓存与刷新任务的运行状态
#[utoipa::path(
    get,
    path = "/api/v1/risk/status",
    tag = "风险 (Risk)",
    responses(
        (status = 200, description = "状态获取成功", body = ApiResponse<StatusResponse>)
    )
)]
pub async fn get_status(State(state): State<AppState>) -> Json<ApiResponse<StatusResponse>> {
    let status = StatusResponse::new(state.reader.status(), state.refresher.is_refreshing());
    Json(ApiResponse::ok(status))
}

/// 立即触发一次刷新
///
/// 请求会等待本次刷新结束。已有刷新在执行时立即返回 409。
#[utoipa::path(
    post,
    path = "/api/v1/risk/refresh",
    tag = "风险 (Risk)",
    responses(
        (status = 200, description = "刷新成功", body = ApiResponse<RefreshResponse>),
        (status = 409, description = "已有刷新在执行", body = ApiErrorResponse),
        (status = 502, description = "上游数据源失败，旧快照保留", body = ApiErrorResponse),
        (status = 500, description = "计算失败", body = ApiErrorResponse)
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RefreshResponse>>, ApiError> {
    let report = state.refresher.refresh().await?;
    Ok(Json(ApiResponse::ok(report.into())))
}
