//! # Normalizer
//!
//! 把各原始指标映射到 [0,1] 的风险贡献值。约定：值越大风险越高。

use kasrisk_core::risk::entity::SentimentConvention;

/// 零方差或未定义时使用的中性值
pub const NEUTRAL: f64 = 0.5;
/// 均线死叉 (MA50 < MA200) 时的风险值
pub const BEARISH_CROSS_RISK: f64 = 0.9;
/// 其余情况的均线风险值
pub const BULLISH_CROSS_RISK: f64 = 0.1;

/// # Summary
/// Min-max 归一化 `(x - min) / (max - min)`。
///
/// # Logic
/// 1. 只在有定义的有限值上求 min / max。
/// 2. `max == min` (零方差) 时每一行都取中性值 0.5。
/// 3. 未定义的行取中性值 0.5。
/// 4. 结果裁剪到 [0,1]。
///
/// # Arguments
/// * `values`: 原始指标序列，None 表示该行未定义。
///
/// # Returns
/// 与输入等长的归一化序列。
pub fn min_max(values: &[Option<f64>]) -> Vec<f64> {
    let defined = values.iter().flatten().filter(|v| v.is_finite());
    let (min, max) = defined.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(*v), hi.max(*v))
    });
    let span = max - min;

    values
        .iter()
        .map(|v| match v {
            Some(x) if x.is_finite() && span.is_finite() && span > 0.0 => {
                clamp_unit((x - min) / span)
            }
            _ => NEUTRAL,
        })
        .collect()
}

/// 对全部有定义的序列做 min-max 归一化
pub fn min_max_dense(values: &[f64]) -> Vec<f64> {
    let wrapped: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    min_max(&wrapped)
}

/// RSI 风险：`1 - RSI / 100`，超买越严重风险越高
pub fn rsi_risk(rsi: f64) -> f64 {
    clamp_unit(1.0 - rsi / 100.0)
}

/// # Summary
/// 情绪指数到风险值的映射。
///
/// # Arguments
/// * `index`: 0..=100 的情绪读数。
/// * `convention`: 映射方向。
pub fn sentiment_risk(index: u8, convention: SentimentConvention) -> f64 {
    let greed = f64::from(index.min(100)) / 100.0;
    match convention {
        SentimentConvention::FearIsRisk => clamp_unit(1.0 - greed),
        SentimentConvention::GreedIsRisk => clamp_unit(greed),
    }
}

/// 阶跃映射：条件成立取 `high`，否则取 `low`
pub fn step(condition: bool, high: f64, low: f64) -> f64 {
    if condition { high } else { low }
}

/// 均线交叉风险
pub fn ma_cross_risk(ma_short: f64, ma_long: f64) -> f64 {
    step(ma_short < ma_long, BEARISH_CROSS_RISK, BULLISH_CROSS_RISK)
}

/// 裁剪到 [0,1]；NaN 视为中性值
pub fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() { NEUTRAL } else { x.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_max_price_example() {
        assert_eq!(min_max_dense(&[10.0, 20.0, 15.0]), vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn test_min_max_zero_variance_is_neutral() {
        assert_eq!(min_max_dense(&[3.0, 3.0, 3.0]), vec![NEUTRAL; 3]);
        assert_eq!(min_max(&[None, Some(7.0), None]), vec![NEUTRAL; 3]);
        assert_eq!(min_max(&[None, None]), vec![NEUTRAL; 2]);
        assert!(min_max(&[]).is_empty());
    }

    #[test]
    fn test_min_max_undefined_rows_neutral() {
        let out = min_max(&[None, Some(1.0), Some(3.0)]);
        assert_eq!(out, vec![NEUTRAL, 0.0, 1.0]);
    }

    #[test]
    fn test_rsi_risk_inverted() {
        assert_eq!(rsi_risk(100.0), 0.0);
        assert_eq!(rsi_risk(0.0), 1.0);
        assert_eq!(rsi_risk(50.0), 0.5);
    }

    #[test]
    fn test_sentiment_conventions() {
        assert_eq!(sentiment_risk(25, SentimentConvention::FearIsRisk), 0.75);
        assert_eq!(sentiment_risk(25, SentimentConvention::GreedIsRisk), 0.25);
        assert_eq!(sentiment_risk(50, SentimentConvention::FearIsRisk), 0.5);
        assert_eq!(sentiment_risk(50, SentimentConvention::GreedIsRisk), 0.5);
    }

    #[test]
    fn test_ma_cross_step() {
        assert_eq!(ma_cross_risk(1.0, 2.0), BEARISH_CROSS_RISK);
        assert_eq!(ma_cross_risk(2.0, 1.0), BULLISH_CROSS_RISK);
        assert_eq!(ma_cross_risk(2.0, 2.0), BULLISH_CROSS_RISK);
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(-0.1), 0.0);
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(f64::NAN), NEUTRAL);
    }
}
