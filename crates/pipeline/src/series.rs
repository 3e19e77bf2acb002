use chrono::NaiveDate;
use kasrisk_core::market::entity::{RawSeriesPoint, SentimentPoint};
use kasrisk_core::risk::error::PipelineError;
use std::collections::HashMap;
use tracing::{debug, warn};

/// 情绪数据缺失时使用的中性指数
pub const NEUTRAL_SENTIMENT_INDEX: u8 = 50;

/// # Summary
/// 对齐后的单日数据行。
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    pub date: NaiveDate,
    pub price: f64,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub fear_greed_index: u8,
    // 当日情绪为中性默认值而非真实读数
    pub sentiment_fallback: bool,
}

/// # Summary
/// Series Builder 的输出：按日期对齐的单表。
///
/// # Invariants
/// - 日期严格升序且唯一。
/// - 成交量 / 市值列要么每行都有值，要么每行都为 None。
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    rows: Vec<AlignedRow>,
    has_volume: bool,
    has_market_cap: bool,
}

impl AlignedSeries {
    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_volume(&self) -> bool {
        self.has_volume
    }

    pub fn has_market_cap(&self) -> bool {
        self.has_market_cap
    }

    /// 使用了中性情绪默认值的行数
    pub fn fallback_count(&self) -> usize {
        self.rows.iter().filter(|r| r.sentiment_fallback).count()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.price).collect()
    }

    /// 成交量列，列被省略时返回 None
    pub fn volumes(&self) -> Option<Vec<f64>> {
        self.rows.iter().map(|r| r.volume).collect()
    }

    /// 市值列，列被省略时返回 None
    pub fn market_caps(&self) -> Option<Vec<f64>> {
        self.rows.iter().map(|r| r.market_cap).collect()
    }
}

/// # Summary
/// 将原始价格序列与情绪序列按自然日对齐为单表。
///
/// # Logic
/// 1. 价格序列为空时返回 DataUnavailable。
/// 2. 校验数值 (有限、非负) 与时间戳顺序 (单调不减、无完全重复)。
/// 3. 同一自然日的多个采样合并为一行，保留最后一次观测。
/// 4. 成交量 / 市值只在每一行都有值时保留该列，否则整列省略。
/// 5. 按日期左连接情绪读数，缺失日期填入中性值并打上 fallback 标记。
///
/// # Arguments
/// * `prices`: 原始价格序列。
/// * `sentiment`: 可选的情绪序列，None 表示未接入情绪数据源。
///
/// # Returns
/// 成功返回对齐表，失败返回 DataUnavailable / MalformedSeries。
pub fn build_series(
    prices: &[RawSeriesPoint],
    sentiment: Option<&[SentimentPoint]>,
) -> Result<AlignedSeries, PipelineError> {
    if prices.is_empty() {
        return Err(PipelineError::DataUnavailable(
            "price series is empty".into(),
        ));
    }

    for point in prices {
        check_value("price", point, Some(point.price))?;
        check_value("volume", point, point.volume)?;
        check_value("market_cap", point, point.market_cap)?;
    }

    if let Some(pair) = prices.windows(2).find(|w| w[1].time <= w[0].time) {
        let reason = if pair[1].time == pair[0].time {
            "duplicate timestamp"
        } else {
            "timestamps not ascending"
        };
        return Err(PipelineError::MalformedSeries(format!(
            "{} at {}",
            reason, pair[1].time
        )));
    }

    let mut rows: Vec<AlignedRow> = Vec::with_capacity(prices.len());
    for point in prices {
        let row = AlignedRow {
            date: point.date(),
            price: point.price,
            volume: point.volume,
            market_cap: point.market_cap,
            fear_greed_index: NEUTRAL_SENTIMENT_INDEX,
            sentiment_fallback: true,
        };
        match rows.last_mut() {
            Some(last) if last.date == row.date => *last = row,
            _ => rows.push(row),
        }
    }

    let has_volume = complete_column(&mut rows, "volume", |r| &mut r.volume);
    let has_market_cap = complete_column(&mut rows, "market_cap", |r| &mut r.market_cap);

    if let Some(points) = sentiment {
        let mut by_date = HashMap::with_capacity(points.len());
        for p in points {
            if p.index > 100 {
                return Err(PipelineError::MalformedSeries(format!(
                    "sentiment index {} on {} exceeds 100",
                    p.index, p.date
                )));
            }
            by_date.insert(p.date, p.index);
        }
        for row in rows.iter_mut() {
            if let Some(&index) = by_date.get(&row.date) {
                row.fear_greed_index = index;
                row.sentiment_fallback = false;
            }
        }
    }

    let series = AlignedSeries {
        rows,
        has_volume,
        has_market_cap,
    };

    let fallback = series.fallback_count();
    if fallback > 0 {
        warn!(
            "Sentiment missing for {} of {} days, neutral index {} used",
            fallback,
            series.len(),
            NEUTRAL_SENTIMENT_INDEX
        );
    }
    debug!(
        "Aligned {} raw points into {} daily rows (volume: {}, market_cap: {})",
        prices.len(),
        series.len(),
        has_volume,
        has_market_cap
    );

    Ok(series)
}

/// 校验单个可选数值：必须有限且非负
fn check_value(
    name: &str,
    point: &RawSeriesPoint,
    value: Option<f64>,
) -> Result<(), PipelineError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(PipelineError::MalformedSeries(format!(
            "{} at {} is invalid ({})",
            name, point.time, v
        ))),
        _ => Ok(()),
    }
}

/// 列完整时返回 true；部分缺失时整列清空并返回 false
fn complete_column(
    rows: &mut [AlignedRow],
    name: &str,
    field: impl Fn(&mut AlignedRow) -> &mut Option<f64>,
) -> bool {
    let present = rows
        .iter_mut()
        .map(|r| field(r).is_some())
        .filter(|p| *p)
        .count();
    if present == rows.len() {
        return true;
    }
    if present > 0 {
        warn!(
            "Column `{}` present on {} of {} days, omitting it",
            name,
            present,
            rows.len()
        );
        for row in rows.iter_mut() {
            *field(row) = None;
        }
    }
    false
}
