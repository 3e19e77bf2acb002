use crate::risk::error::PipelineError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// 各风险类别的权重配置。
///
/// # Invariants
/// - 每个权重必须是非负有限数；权重之和无需为 1，聚合结果最终裁剪到 [0,1]。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub volatility: f64,
    pub technical: f64,
    pub sentiment: f64,
    pub network: f64,
    pub valuation: f64,
}

impl RiskWeights {
    /// # Summary
    /// 校验权重合法性。
    ///
    /// # Logic
    /// 1. 逐项检查是否为有限数。
    /// 2. 逐项检查是否非负。
    ///
    /// # Returns
    /// 合法返回 Ok，否则返回 `PipelineError::InvalidConfig`。
    pub fn validate(&self) -> Result<(), PipelineError> {
        for (name, w) in self.named() {
            if !w.is_finite() || w < 0.0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "weight `{}` must be a non-negative finite number, got {}",
                    name, w
                )));
            }
        }
        Ok(())
    }

    /// 以 (名称, 权重) 形式遍历全部类别
    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("volatility", self.volatility),
            ("technical", self.technical),
            ("sentiment", self.sentiment),
            ("network", self.network),
            ("valuation", self.valuation),
        ]
    }
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            volatility: 0.30,
            technical: 0.25,
            sentiment: 0.15,
            network: 0.15,
            valuation: 0.15,
        }
    }
}

/// # Summary
/// NVT 比率的计算口径。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NvtVariant {
    // 市值 / 当日成交量
    Simple,
    // 市值 / 滚动平均成交量
    Rolling { window: usize },
}

impl Default for NvtVariant {
    fn default() -> Self {
        NvtVariant::Rolling { window: 30 }
    }
}

/// # Summary
/// 情绪指数到风险值的映射方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SentimentConvention {
    // 风险 = (100 - index) / 100，恐惧读数越高风险越高
    #[default]
    FearIsRisk,
    // 风险 = index / 100，贪婪读数越高风险越高
    GreedIsRisk,
}

/// # Summary
/// 单日各类别风险子分数。
///
/// # Invariants
/// - 所有子分数位于 [0,1]。
/// - 缺少成交量或市值列时 `network` 为 None。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub volatility: f64,
    pub technical: f64,
    pub sentiment: f64,
    pub network: Option<f64>,
    pub valuation: f64,
}

/// # Summary
/// 指标表中的一行，对应一个自然日的全部派生指标。
///
/// # Invariants
/// - 所有 `*_risk` 与 `*_norm` 字段位于 [0,1]。
/// - 窗口不足的滚动指标显式为 None，不存在 NaN。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub price: f64,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    // 日收益率 (百分比口径) 与对数收益率，首行为 None
    pub daily_return: Option<f64>,
    pub log_return: Option<f64>,
    pub cumulative_return: f64,
    pub drawdown: f64,
    pub volatility_14d: Option<f64>,
    pub volatility_30d: Option<f64>,
    pub volatility_90d: Option<f64>,
    pub volatility_14d_norm: f64,
    pub volatility_30d_norm: f64,
    pub volatility_90d_norm: f64,
    pub rsi: f64,
    pub rsi_risk: f64,
    pub ma_50: f64,
    pub ma_200: f64,
    pub ma_cross_risk: f64,
    pub volume_ratio: Option<f64>,
    pub volume_risk: Option<f64>,
    pub nvt_ratio: Option<f64>,
    pub nvt_risk: Option<f64>,
    pub price_to_ma200_ratio: f64,
    pub mvrv_risk: f64,
    // 价格在全序列 min-max 区间中的位置
    pub price_risk: f64,
    pub fear_greed_index: u8,
    pub fear_greed_risk: f64,
    // 当日情绪数据缺失并使用了中性默认值
    pub sentiment_fallback: bool,
    pub categories: CategoryScores,
    pub weighted_risk: f64,
}

impl IndicatorRow {
    /// 遍历该行所有归一化风险分数 (名称, 值)
    pub fn risk_scores(&self) -> Vec<(&'static str, f64)> {
        let mut scores = vec![
            ("volatility_14d_norm", self.volatility_14d_norm),
            ("volatility_30d_norm", self.volatility_30d_norm),
            ("volatility_90d_norm", self.volatility_90d_norm),
            ("rsi_risk", self.rsi_risk),
            ("ma_cross_risk", self.ma_cross_risk),
            ("mvrv_risk", self.mvrv_risk),
            ("price_risk", self.price_risk),
            ("fear_greed_risk", self.fear_greed_risk),
            ("category.volatility", self.categories.volatility),
            ("category.technical", self.categories.technical),
            ("category.sentiment", self.categories.sentiment),
            ("category.valuation", self.categories.valuation),
            ("weighted_risk", self.weighted_risk),
        ];
        if let Some(v) = self.volume_risk {
            scores.push(("volume_risk", v));
        }
        if let Some(v) = self.nvt_risk {
            scores.push(("nvt_risk", v));
        }
        if let Some(v) = self.categories.network {
            scores.push(("category.network", v));
        }
        scores
    }

    /// 遍历该行所有原始数值指标 (名称, 值)，用于有限性校验
    fn raw_values(&self) -> Vec<(&'static str, f64)> {
        let mut values = vec![
            ("price", self.price),
            ("cumulative_return", self.cumulative_return),
            ("drawdown", self.drawdown),
            ("rsi", self.rsi),
            ("ma_50", self.ma_50),
            ("ma_200", self.ma_200),
            ("price_to_ma200_ratio", self.price_to_ma200_ratio),
        ];
        let optional = [
            ("volume", self.volume),
            ("market_cap", self.market_cap),
            ("daily_return", self.daily_return),
            ("log_return", self.log_return),
            ("volatility_14d", self.volatility_14d),
            ("volatility_30d", self.volatility_30d),
            ("volatility_90d", self.volatility_90d),
            ("volume_ratio", self.volume_ratio),
            ("nvt_ratio", self.nvt_ratio),
        ];
        values.extend(
            optional
                .into_iter()
                .filter_map(|(name, v)| v.map(|v| (name, v))),
        );
        values
    }
}

/// # Summary
/// 全序列统计量，由管道在构建快照时一次性计算。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub min_price: f64,
    pub max_price: f64,
    // 日收益率的样本标准差，样本不足两个时为 None
    pub realized_volatility: Option<f64>,
    // 最大回撤 (非正数)
    pub max_drawdown: f64,
}

/// # Summary
/// 最新一日的精简摘要，供服务层直接输出。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestSummary {
    pub date: NaiveDate,
    pub price: f64,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub weighted_risk: f64,
    pub categories: CategoryScores,
    pub volatility_30d: Option<f64>,
    pub rsi: f64,
    pub ma_50: f64,
    pub ma_200: f64,
    pub nvt_ratio: Option<f64>,
    pub price_to_ma200_ratio: f64,
    pub fear_greed_index: u8,
    pub fear_greed_risk: f64,
    pub sentiment_fallback: bool,
    pub price_risk: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub realized_volatility: Option<f64>,
    pub max_drawdown: f64,
    pub row_count: usize,
    pub computed_at: DateTime<Utc>,
}

/// # Summary
/// 历史窗口查询返回的单点记录。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
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

impl From<&IndicatorRow> for HistoryPoint {
    fn from(row: &IndicatorRow) -> Self {
        Self {
            date: row.date,
            price: row.price,
            weighted_risk: row.weighted_risk,
            volatility_30d: row.volatility_30d,
            rsi: row.rsi,
            ma_50: row.ma_50,
            ma_200: row.ma_200,
            nvt_ratio: row.nvt_ratio,
            fear_greed_index: row.fear_greed_index,
            volume: row.volume,
        }
    }
}

/// # Summary
/// 一次完整管道运行的不可变结果。
///
/// # Invariants
/// - `rows` 非空且按日期严格升序。
/// - 所有风险分数位于 [0,1]，所有数值有限。
/// - 构造后不可修改，新一次运行产生新的快照整体替换旧快照。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    rows: Vec<IndicatorRow>,
    latest: LatestSummary,
    computed_at: DateTime<Utc>,
}

impl Snapshot {
    /// # Summary
    /// 校验指标表并构建快照。
    ///
    /// # Logic
    /// 1. 空表视为数据不可用。
    /// 2. 检查日期严格升序。
    /// 3. 检查所有数值有限、所有风险分数位于 [0,1]。
    /// 4. 以末行与全序列统计量生成 LatestSummary。
    ///
    /// # Arguments
    /// * `rows`: 管道产出的指标表。
    /// * `stats`: 全序列统计量。
    /// * `computed_at`: 计算时间。
    ///
    /// # Returns
    /// 成功返回快照；任一校验失败返回 PipelineError，调用方不得写入缓存。
    pub fn new(
        rows: Vec<IndicatorRow>,
        stats: SeriesStats,
        computed_at: DateTime<Utc>,
    ) -> Result<Self, PipelineError> {
        let last = rows
            .last()
            .ok_or_else(|| PipelineError::DataUnavailable("indicator table is empty".into()))?;

        if let Some(pair) = rows.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(PipelineError::Computation(format!(
                "rows out of order: {} followed by {}",
                pair[0].date, pair[1].date
            )));
        }

        for row in &rows {
            if let Some((name, v)) = row.raw_values().into_iter().find(|(_, v)| !v.is_finite()) {
                return Err(PipelineError::Computation(format!(
                    "{} on {} is not finite ({})",
                    name, row.date, v
                )));
            }
            if let Some((name, v)) = row
                .risk_scores()
                .into_iter()
                .find(|(_, v)| !(0.0..=1.0).contains(v))
            {
                return Err(PipelineError::Computation(format!(
                    "{} on {} is outside [0,1] ({})",
                    name, row.date, v
                )));
            }
        }

        let latest = LatestSummary {
            date: last.date,
            price: last.price,
            volume: last.volume,
            market_cap: last.market_cap,
            weighted_risk: last.weighted_risk,
            categories: last.categories,
            volatility_30d: last.volatility_30d,
            rsi: last.rsi,
            ma_50: last.ma_50,
            ma_200: last.ma_200,
            nvt_ratio: last.nvt_ratio,
            price_to_ma200_ratio: last.price_to_ma200_ratio,
            fear_greed_index: last.fear_greed_index,
            fear_greed_risk: last.fear_greed_risk,
            sentiment_fallback: last.sentiment_fallback,
            price_risk: last.price_risk,
            min_price: stats.min_price,
            max_price: stats.max_price,
            realized_volatility: stats.realized_volatility,
            max_drawdown: stats.max_drawdown,
            row_count: rows.len(),
            computed_at,
        };

        Ok(Self {
            rows,
            latest,
            computed_at,
        })
    }

    /// 按日期升序的完整指标表
    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    /// 最新一日摘要
    pub fn latest(&self) -> &LatestSummary {
        &self.latest
    }

    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }

    /// 序列中的最大日期 (即末行日期)
    pub fn max_date(&self) -> NaiveDate {
        self.latest.date
    }
}
