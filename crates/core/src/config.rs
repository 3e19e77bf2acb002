use crate::common::Asset;
use crate::risk::entity::{NvtVariant, RiskWeights, SentimentConvention};
use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub feed: FeedConfig,
    pub schedule: ScheduleConfig,
    pub pipeline: PipelineSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    // 静态资源目录，未配置时不挂载
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub coin_id: String,
    pub vs_currency: String,
    // 每次刷新回溯的天数
    pub history_days: u32,
    pub timeout_secs: u64,
    pub price_base_url: String,
    pub sentiment_base_url: String,
    // 关闭后所有行使用中性情绪默认值
    pub sentiment_enabled: bool,
}

impl FeedConfig {
    /// 由配置生成资产标识
    pub fn asset(&self) -> Asset {
        Asset {
            id: self.coin_id.clone(),
            vs_currency: self.vs_currency.clone(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            coin_id: "kaspa".to_string(),
            vs_currency: "usd".to_string(),
            history_days: 365,
            timeout_secs: 10,
            price_base_url: "https://api.coingecko.com/api/v3".to_string(),
            sentiment_base_url: "https://api.alternative.me".to_string(),
            sentiment_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub refresh_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 3600,
        }
    }
}

/// # Summary
/// 风险管道参数。窗口长度属于指标定义本身，不在此处开放。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineSettings {
    pub weights: RiskWeights,
    pub nvt: NvtVariant,
    pub sentiment: SentimentConvention,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    // EnvFilter 语法，RUST_LOG 优先
    pub level: String,
    // 按天滚动的日志目录，未配置时只输出到标准输出
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}
