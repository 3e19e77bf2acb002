use crate::aggregate::{NormalizedInputs, category_scores, weighted_risk};
use crate::indicator::RawIndicators;
use crate::normalize::{ma_cross_risk, min_max, min_max_dense, rsi_risk, sentiment_risk};
use crate::series::{AlignedSeries, build_series};
use crate::window::sample_std;
use chrono::{DateTime, Utc};
use kasrisk_core::config::PipelineSettings;
use kasrisk_core::market::entity::{RawSeriesPoint, SentimentPoint};
use kasrisk_core::risk::entity::{IndicatorRow, SeriesStats, Snapshot};
use kasrisk_core::risk::error::PipelineError;
use tracing::{debug, info};

/// # Summary
/// 风险评分管道：Series Builder → Indicator Engine → Normalizer → Risk Aggregator。
///
/// # Invariants
/// - 构造时权重已通过校验。
/// - `run` 是纯函数：相同输入与 `computed_at` 必然得到相同快照，无任何副作用。
#[derive(Debug, Clone)]
pub struct RiskPipeline {
    settings: PipelineSettings,
}

impl RiskPipeline {
    /// # Summary
    /// 创建管道实例。
    ///
    /// # Arguments
    /// * `settings`: 权重、NVT 口径与情绪映射方向。
    ///
    /// # Returns
    /// 权重非法时返回 `PipelineError::InvalidConfig`。
    pub fn new(settings: PipelineSettings) -> Result<Self, PipelineError> {
        settings.weights.validate()?;
        Ok(Self { settings })
    }

    /// # Summary
    /// 执行一次完整的管道运行。
    ///
    /// # Logic
    /// 1. 对齐价格与情绪序列。
    /// 2. 计算原始指标列。
    /// 3. 归一化并聚合出每日风险值。
    /// 4. 计算全序列统计量并构建经过校验的快照。
    ///
    /// # Arguments
    /// * `prices`: 原始价格序列。
    /// * `sentiment`: 可选的情绪序列。
    /// * `computed_at`: 快照计算时间。
    ///
    /// # Returns
    /// 成功返回完整快照；任一步失败返回带类别标签的 PipelineError。
    pub fn run(
        &self,
        prices: &[RawSeriesPoint],
        sentiment: Option<&[SentimentPoint]>,
        computed_at: DateTime<Utc>,
    ) -> Result<Snapshot, PipelineError> {
        let series = build_series(prices, sentiment)?;
        let raw = RawIndicators::compute(&series, self.settings.nvt);
        let rows = self.assemble(&series, &raw);
        let stats = series_stats(&series, &raw);
        let snapshot = Snapshot::new(rows, stats, computed_at)?;

        let latest = snapshot.latest();
        info!(
            "Risk pipeline produced {} rows up to {} (weighted_risk={:.4}, sentiment fallback rows={})",
            latest.row_count,
            latest.date,
            latest.weighted_risk,
            series.fallback_count()
        );
        Ok(snapshot)
    }

    /// 组装每一行的原始指标、归一化指标与聚合结果
    fn assemble(&self, series: &AlignedSeries, raw: &RawIndicators) -> Vec<IndicatorRow> {
        let prices = series.prices();
        let vol_14_norm = min_max(&raw.volatility_14d);
        let vol_30_norm = min_max(&raw.volatility_30d);
        let vol_90_norm = min_max(&raw.volatility_90d);
        let mvrv_risk = min_max_dense(&raw.price_to_ma200);
        let price_risk = min_max_dense(&prices);
        let volume_risk = raw.volume_ratio.as_deref().map(min_max_dense);
        let nvt_risk = raw.nvt_ratio.as_deref().map(min_max_dense);

        debug!(
            "Normalizing {} rows (volume_risk: {}, nvt_risk: {})",
            prices.len(),
            volume_risk.is_some(),
            nvt_risk.is_some()
        );

        series
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let at = |col: &Option<Vec<f64>>| col.as_ref().and_then(|c| c.get(i).copied());
                let inputs = NormalizedInputs {
                    volatility_14d: vol_14_norm[i],
                    volatility_30d: vol_30_norm[i],
                    volatility_90d: vol_90_norm[i],
                    rsi_risk: rsi_risk(raw.rsi[i]),
                    ma_cross_risk: ma_cross_risk(raw.ma_50[i], raw.ma_200[i]),
                    fear_greed_risk: sentiment_risk(row.fear_greed_index, self.settings.sentiment),
                    volume_risk: at(&volume_risk),
                    nvt_risk: at(&nvt_risk),
                    mvrv_risk: mvrv_risk[i],
                };
                let categories = category_scores(&inputs);

                IndicatorRow {
                    date: row.date,
                    price: row.price,
                    volume: row.volume,
                    market_cap: row.market_cap,
                    daily_return: raw.daily_return[i],
                    log_return: raw.log_return[i],
                    cumulative_return: raw.cumulative_return[i],
                    drawdown: raw.drawdown[i],
                    volatility_14d: raw.volatility_14d[i],
                    volatility_30d: raw.volatility_30d[i],
                    volatility_90d: raw.volatility_90d[i],
                    volatility_14d_norm: inputs.volatility_14d,
                    volatility_30d_norm: inputs.volatility_30d,
                    volatility_90d_norm: inputs.volatility_90d,
                    rsi: raw.rsi[i],
                    rsi_risk: inputs.rsi_risk,
                    ma_50: raw.ma_50[i],
                    ma_200: raw.ma_200[i],
                    ma_cross_risk: inputs.ma_cross_risk,
                    volume_ratio: at(&raw.volume_ratio),
                    volume_risk: inputs.volume_risk,
                    nvt_ratio: at(&raw.nvt_ratio),
                    nvt_risk: inputs.nvt_risk,
                    price_to_ma200_ratio: raw.price_to_ma200[i],
                    mvrv_risk: inputs.mvrv_risk,
                    price_risk: price_risk[i],
                    fear_greed_index: row.fear_greed_index,
                    fear_greed_risk: inputs.fear_greed_risk,
                    sentiment_fallback: row.sentiment_fallback,
                    weighted_risk: weighted_risk(&categories, &self.settings.weights),
                    categories,
                }
            })
            .collect()
    }
}

/// # Summary
/// 计算全序列统计量。
///
/// # Logic
/// 1. 价格的最小值与最大值。
/// 2. 全部日收益率的样本标准差作为已实现波动率。
/// 3. 回撤序列的最小值作为最大回撤。
fn series_stats(series: &AlignedSeries, raw: &RawIndicators) -> SeriesStats {
    let (min_price, max_price) = series
        .rows()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
            (lo.min(r.price), hi.max(r.price))
        });

    let returns: Vec<f64> = raw.daily_return.iter().flatten().copied().collect();

    SeriesStats {
        min_price,
        max_price,
        realized_volatility: sample_std(&returns),
        max_drawdown: raw.drawdown.iter().copied().fold(0.0, f64::min),
    }
}
