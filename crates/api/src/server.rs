//! # API 服务启动器
//!
//! 组装 axum 路由、挂载 Swagger UI、配置 CORS 并绑定 TCP 端口对外提供服务。
//! 本模块不直接启动 `main()`, 而是由 `crates/app` 组装依赖后调用。

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_swagger_ui::SwaggerUi;

use kasrisk_core::cache::port::SnapshotReader;
use kasrisk_manager::refresh::RefreshService;

use crate::routes::{home, risk};

// ============================================================
//  共享应用状态
// ============================================================

/// 全局应用状态，通过 axum 的 `State` 提取器注入到每个 Handler 中。
///
/// # Invariants
/// - `reader` 与 `refresher` 背后是同一个快照缓存，生命周期与进程等同。
#[derive(Clone)]
pub struct AppState {
    /// 快照只读端口
    pub reader: Arc<dyn SnapshotReader>,
    /// 刷新服务 (手动刷新与运行状态)
    pub refresher: Arc<RefreshService>,
}

// ============================================================
//  OpenAPI 文档定义
// ============================================================

/// 全局 OpenAPI 文档结构
#[derive(OpenApi)]
#[openapi(
    info(
        title = "kasrisk 风险评分 API",
        version = "0.1.0",
        description = "每日资产风险评分服务。提供最新风险摘要、历史窗口查询、运行状态与手动刷新。",
        license(name = "MIT")
    ),
    tags(
        (name = "风险 (Risk)", description = "风险摘要、历史序列与刷新控制"),
        (name = "旧版 (Legacy)", description = "早期看板使用的根路径与 /data 接口")
    )
)]
pub struct ApiDoc;

// ============================================================
//  服务构建与启动
// ============================================================

/// 构建完整的 axum 应用路由树。
///
/// # Logic
/// 1. 注册风险与旧版接口，并自动收集 OpenAPI 文档。
/// 2. 挂载 Swagger UI。
/// 3. 配置了静态目录时由 `ServeDir` 兜底，此时 `/` 交给静态首页；否则 `/` 返回欢迎文本。
///
/// # Arguments
/// * `state` - 共享状态
/// * `static_dir` - 可选的前端静态资源目录
pub fn build_router(state: AppState, static_dir: Option<&str>) -> Router {
    let mut api_router = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(risk::get_latest))
        .routes(routes!(risk::get_history))
        .routes(routes!(risk::get_status))
        .routes(routes!(risk::refresh))
        .routes(routes!(home::legacy_data));
    if static_dir.is_none() {
        api_router = api_router.routes(routes!(home::index));
    }

    let (router, api) = api_router.with_state(state).split_for_parts();

    // 看板可能部署在其他域名下，允许所有来源
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app: Router =
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api));
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }
    app.layer(cors)
}

/// 构建路由并启动 HTTP 监听。
///
/// # Arguments
/// * `state` - 由 `crates/app` 注入的共享状态
/// * `bind_addr` - 监听的地址与端口，如 `"0.0.0.0:5000"`
/// * `static_dir` - 可选的前端静态资源目录
///
/// # Returns
/// 绑定失败或服务异常退出时返回错误。
pub async fn start_server(
    state: AppState,
    bind_addr: &str,
    static_dir: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(state, static_dir);

    tracing::info!("kasrisk API server listening on {}", bind_addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", bind_addr);
    if let Some(dir) = static_dir {
        tracing::info!("Serving static assets from {}", dir);
    }

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
