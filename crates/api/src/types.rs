//! # DTO (Data Transfer Object) 层
//!
//! 将内部领域模型转化为面向前端 JSON 输出的轻量结构体。
//! 所有 DTO 必须派生 `utoipa::ToSchema` 以自动进入 Swagger 文档。
//! 日期统一输出为 `YYYY-MM-DD`，时间戳统一输出为 RFC 3339 字符串。

use kasrisk_core::cache::entity::{CacheStatus, RefreshFailure};
use kasrisk_core::risk::entity::{CategoryScores, HistoryPoint, LatestSummary};
use kasrisk_manager::refresh::RefreshReport;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================
//  风险评分 DTO
// ============================================================

/// 各类别风险子分数
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryScoresResponse {
    #[schema(example = 0.42)]
    pub volatility: f64,
    #[schema(example = 0.61)]
    pub technical: f64,
    #[schema(example = 0.5)]
    pub sentiment: f64,
    /// 缺少成交量或市值数据时为 null
    #[schema(example = 0.37)]
    pub network: Option<f64>,
    #[schema(example = 0.55)]
    pub valuation: f64,
}

impl From<CategoryScores> for CategoryScoresResponse {
    fn from(c: CategoryScores) -> Self {
        Self {
            volatility: c.volatility,
            technical: c.technical,
            sentiment: c.sentiment,
            network: c.network,
            valuation: c.valuation,
        }
    }
}

/// 最新一日风险摘要 DTO - 对应仪表盘顶部的核心指标卡片
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LatestSummaryResponse {
    /// 数据日期
    #[schema(example = "2024-06-30")]
    pub date: String,
    /// 收盘价
    #[schema(example = 0.1523)]
    pub price: f64,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    /// 综合风险分数 [0,1]
    #[schema(example = 0.48)]
    pub weighted_risk: f64,
    pub categories: CategoryScoresResponse,
    pub volatility_30d: Option<f64>,
    #[schema(example = 57.3)]
    pub rsi: f64,
    pub ma_50: f64,
    pub ma_200: f64,
    pub nvt_ratio: Option<f64>,
    pub price_to_ma200_ratio: f64,
    /// 恐惧贪婪指数 [0,100]
    #[schema(example = 62)]
    pub fear_greed_index: u8,
    pub fear_greed_risk: f64,
    /// 当日情绪数据缺失并使用了中性默认值
    pub sentiment_fallback: bool,
    pub price_risk: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// 全序列日收益率的样本标准差
    pub realized_volatility: Option<f64>,
    /// 全序列最大回撤 (非正数)
    #[schema(example = -0.64)]
    pub max_drawdown: f64,
    /// 快照行数
    #[schema(example = 365)]
    pub row_count: usize,
    /// 快照计算时间
    #[schema(example = "2024-06-30T12:00:00+00:00")]
    pub computed_at: String,
}

impl From<LatestSummary> for LatestSummaryResponse {
    fn from(s: LatestSummary) -> Self {
        Self {
            date: s.date.to_string(),
            price: s.price,
            volume: s.volume,
            market_cap: s.market_cap,
            weighted_risk: s.weighted_risk,
            categories: s.categories.into(),
            volatility_30d: s.volatility_30d,
            rsi: s.rsi,
            ma_50: s.ma_50,
            ma_200: s.ma_200,
            nvt_ratio: s.nvt_ratio,
            price_to_ma200_ratio: s.price_to_ma200_ratio,
            fear_greed_index: s.fear_greed_index,
            fear_greed_risk: s.fear_greed_risk,
            sentiment_fallback: s.sentiment_fallback,
            price_risk: s.price_risk,
            min_price: s.min_price,
            max_price: s.max_price,
            realized_volatility: s.realized_volatility,
            max_drawdown: s.max_drawdown,
            row_count: s.row_count,
            computed_at: s.computed_at.to_rfc3339(),
        }
    }
}

/// 历史窗口中的单点 DTO - 对应图表的一个数据点
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryPointResponse {
    #[schema(example = "2024-06-30")]
    pub date: String,
    pub price: f64,
    pub weighted_risk: f64,
    pub volatility_30d: Option<f64>,
    pub rsi: f64,
    pub ma_50: f64,
    pub ma_200: f64,
    pub nvt_ratio: Option<f64>,
    pub fear_greed_index: u8,
    pub volume: Option<f64>,
}

impl From<HistoryPoint> for HistoryPointResponse {
    fn from(p: HistoryPoint) -> Self {
        Self {
            date: p.date.to_string(),
            price: p.price,
            weighted_risk: p.weighted_risk,
            volatility_30d: p.volatility_30d,
            rsi: p.rsi,
            ma_50: p.ma_50,
            ma_200: p.ma_200,
            nvt_ratio: p.nvt_ratio,
            fear_greed_index: p.fear_greed_index,
            volume: p.volume,
        }
    }
}

/// 历史窗口查询参数
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct HistoryQuery {
    /// 1w / 1m / 3m / 1y / all，缺省或无法识别时返回全序列
    pub timeframe: Option<String>,
}

// ============================================================
//  运行状态 DTO
// ============================================================

/// 最近一次失败刷新
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshFailureResponse {
    #[schema(example = "2024-06-30T13:00:00+00:00")]
    pub at: String,
    /// 错误类别 (data_unavailable, malformed_series, computation, invalid_config)
    #[schema(example = "data_unavailable")]
    pub kind: String,
    pub message: String,
}

impl From<RefreshFailure> for RefreshFailureResponse {
    fn from(f: RefreshFailure) -> Self {
        Self {
            at: f.at.to_rfc3339(),
            kind: f.kind.to_string(),
            message: f.message,
        }
    }
}

/// 快照缓存状态 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    /// 是否已有可用快照
    pub ready: bool,
    /// 快照最新数据日期
    pub as_of: Option<String>,
    /// 最近一次成功刷新的计算时间
    pub last_success: Option<String>,
    pub row_count: usize,
    /// 刷新是否正在执行
    pub refreshing: bool,
    pub last_failure: Option<RefreshFailureResponse>,
}

impl StatusResponse {
    pub fn new(status: CacheStatus, refreshing: bool) -> Self {
        Self {
            ready: status.ready,
            as_of: status.as_of.map(|d| d.to_string()),
            last_success: status.computed_at.map(|t| t.to_rfc3339()),
            row_count: status.row_count,
            refreshing,
            last_failure: status.last_failure.map(RefreshFailureResponse::from),
        }
    }
}

/// 手动刷新结果 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    #[schema(example = "2024-06-30")]
    pub as_of: String,
    #[schema(example = 365)]
    pub row_count: usize,
    pub weighted_risk: f64,
    pub computed_at: String,
    /// 使用中性情绪默认值的行数
    pub sentiment_fallback_rows: usize,
}

impl From<RefreshReport> for RefreshResponse {
    fn from(r: RefreshReport) -> Self {
        Self {
            as_of: r.as_of.to_string(),
            row_count: r.row_count,
            weighted_risk: r.weighted_risk,
            computed_at: r.computed_at.to_rfc3339(),
            sentiment_fallback_rows: r.sentiment_fallback_rows,
        }
    }
}

// ============================================================
//  旧版接口 DTO
// ============================================================

/// `GET /data` 的扁平响应，保留早期前端依赖的字段名
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LegacyDataResponse {
    /// 全序列日收益率的样本标准差
    pub volatility: Option<f64>,
    pub max_drawdown: f64,
    pub latest_price: f64,
    pub latest_volume: Option<f64>,
    pub latest_market_cap: Option<f64>,
}

impl From<&LatestSummary> for LegacyDataResponse {
    fn from(s: &LatestSummary) -> Self {
        Self {
            volatility: s.realized_volatility,
            max_drawdown: s.max_drawdown,
            latest_price: s.price,
            latest_volume: s.volume,
            latest_market_cap: s.market_cap,
        }
    }
}

// ============================================================
//  通用响应包装
// ============================================================

/// 通用 API 响应包装器
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T: Serialize + ToSchema> {
    /// 是否成功
    pub success: bool,
    /// 数据载荷 (成功时)
    pub data: Option<T>,
    /// 错误信息 (失败时)
    pub error: Option<String>,
}

impl<T: Serialize + ToSchema> ApiResponse<T> {
    /// 构建成功响应
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// 构建失败响应 (不含泛型载荷)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 固定为 false
    pub success: bool,
    /// 错误描述信息
    pub error: String,
}

impl ApiErrorResponse {
    /// 从错误信息构建
    pub fn from_msg(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}
