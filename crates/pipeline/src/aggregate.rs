//! # Risk Aggregator
//!
//! 类别子分数由固定的子指标混合得到，再按外部配置的权重求和并裁剪到 [0,1]。
//!
//! | 类别 | 混合方式 |
//! |------|----------|
//! | volatility | 0.4·vol14 + 0.4·vol30 + 0.2·vol90 |
//! | technical  | 0.5·rsi_risk + 0.5·ma_cross_risk |
//! | sentiment  | fear_greed_risk |
//! | network    | 0.5·nvt_risk + 0.5·volume_risk |
//! | valuation  | mvrv_risk |

use crate::normalize::clamp_unit;
use kasrisk_core::risk::entity::{CategoryScores, RiskWeights};

/// # Summary
/// 单行的归一化子指标输入。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedInputs {
    pub volatility_14d: f64,
    pub volatility_30d: f64,
    pub volatility_90d: f64,
    pub rsi_risk: f64,
    pub ma_cross_risk: f64,
    pub fear_greed_risk: f64,
    // 缺少成交量列时为 None
    pub volume_risk: Option<f64>,
    // 缺少成交量或市值列时为 None
    pub nvt_risk: Option<f64>,
    pub mvrv_risk: f64,
}

/// # Summary
/// 由子指标混合出各类别子分数。
///
/// # Logic
/// 1. 按模块文档中的固定系数混合。
/// 2. network 类别需要 NVT 与成交量两项都存在，否则为 None (跳过而不是伪造)。
pub fn category_scores(inputs: &NormalizedInputs) -> CategoryScores {
    let network = match (inputs.nvt_risk, inputs.volume_risk) {
        (Some(nvt), Some(volume)) => Some(clamp_unit(0.5 * nvt + 0.5 * volume)),
        _ => None,
    };
    CategoryScores {
        volatility: clamp_unit(
            0.4 * inputs.volatility_14d + 0.4 * inputs.volatility_30d + 0.2 * inputs.volatility_90d,
        ),
        technical: clamp_unit(0.5 * inputs.rsi_risk + 0.5 * inputs.ma_cross_risk),
        sentiment: clamp_unit(inputs.fear_greed_risk),
        network,
        valuation: clamp_unit(inputs.mvrv_risk),
    }
}

/// # Summary
/// 加权求和 `Σ weight_c · score_c` 并裁剪到 [0,1]。
///
/// # Logic
/// 1. 不可用的类别 (network 为 None) 不参与求和。
/// 2. 权重无需归一，全部为 0 时结果为 0。
///
/// # Arguments
/// * `scores`: 类别子分数。
/// * `weights`: 已校验的非负权重。
///
/// # Returns
/// [0,1] 区间内的综合风险值。
pub fn weighted_risk(scores: &CategoryScores, weights: &RiskWeights) -> f64 {
    let mut total = weights.volatility * scores.volatility
        + weights.technical * scores.technical
        + weights.sentiment * scores.sentiment
        + weights.valuation * scores.valuation;
    if let Some(network) = scores.network {
        total += weights.network * network;
    }
    clamp_unit(total)
}
