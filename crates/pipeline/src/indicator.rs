//! # Indicator Engine
//!
//! 每个指标都是作用于有序切片的独立函数，窗口策略通过参数显式传入。
//! 窗口长度按交易日 (即序列行数) 计算，而非自然日。

use crate::series::AlignedSeries;
use crate::window::RollingWindow;
use kasrisk_core::risk::entity::NvtVariant;

/// 分母下限，避免除零
pub const EPSILON: f64 = 1e-5;
/// 波动率窗口 (14 / 30 / 90 日)
pub const VOLATILITY_WINDOWS: [usize; 3] = [14, 30, 90];
pub const RSI_PERIOD: usize = 14;
/// 历史不足时 RSI 的中性取值
pub const NEUTRAL_RSI: f64 = 50.0;
pub const MA_SHORT: usize = 50;
pub const MA_LONG: usize = 200;
/// 成交量比率使用的平均窗口
pub const VOLUME_AVG_WINDOW: usize = 30;

/// # Summary
/// 滚动窗口在样本不足时的处理策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    // 样本不足窗口长度时结果为 None
    RequireFull,
    // 使用已有样本 (窗口长度取 min(W, 已有样本数))
    Truncate,
}

/// 对非负分母施加 epsilon 下限
fn floored(x: f64) -> f64 {
    x.max(EPSILON)
}

/// # Summary
/// 对数收益率 `ln(p[i] / p[i-1])`。
///
/// # Logic
/// 1. 首行没有前值，结果为 None。
/// 2. 分子分母都施加 epsilon 下限，零价格不会产生无穷值。
pub fn log_returns(prices: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(prices.len());
    out.extend(prices.first().map(|_| None));
    out.extend(
        prices
            .windows(2)
            .map(|w| Some((floored(w[1]) / floored(w[0])).ln())),
    );
    out
}

/// 百分比收益率 `p[i] / p[i-1] - 1`，首行为 None
pub fn pct_returns(prices: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(prices.len());
    out.extend(prices.first().map(|_| None));
    out.extend(prices.windows(2).map(|w| Some(w[1] / floored(w[0]) - 1.0)));
    out
}

/// # Summary
/// 滚动波动率：尾随 `window` 个收益样本的样本标准差乘以 `sqrt(window)`。
///
/// # Logic
/// 1. 依次把有定义的收益样本推入滚动窗口。
/// 2. `RequireFull` 下样本数不足 `window` 时结果为 None。
/// 3. `Truncate` 下只要有两个样本即可计算。
///
/// # Arguments
/// * `returns`: 收益率序列 (首行通常为 None)。
/// * `window`: 窗口长度。
/// * `policy`: 窗口策略。
///
/// # Returns
/// 与输入等长的波动率序列。
pub fn rolling_volatility(
    returns: &[Option<f64>],
    window: usize,
    policy: WindowPolicy,
) -> Vec<Option<f64>> {
    let scale = crate::window::count_f64(window).sqrt();
    let mut samples = RollingWindow::new(window);
    returns
        .iter()
        .map(|r| {
            if let Some(r) = r {
                samples.push(*r);
            }
            match policy {
                WindowPolicy::RequireFull if !samples.is_full() => None,
                _ => samples.sample_std().map(|std| std * scale),
            }
        })
        .collect()
}

/// # Summary
/// 相对强弱指数 RSI。
///
/// # Logic
/// 1. 取尾随 `period` 个价格差，分别求上涨均值与下跌均值 (简单平均)。
/// 2. 下跌均值以 epsilon 为下限，`RS = avg_gain / avg_loss`，`RSI = 100 - 100 / (1 + RS)`。
/// 3. 价格差不足 `period` 个的行取中性值 50。
///
/// # Invariants
/// - 平坦窗口 `RS = 0`，RSI 为 0；不因价格量级小而退化为中性值。
pub fn rsi(prices: &[f64], period: usize) -> Vec<f64> {
    let mut gains = RollingWindow::new(period);
    let mut losses = RollingWindow::new(period);
    let mut out = Vec::with_capacity(prices.len());
    out.extend(prices.first().map(|_| NEUTRAL_RSI));

    for w in prices.windows(2) {
        let delta = w[1] - w[0];
        gains.push(delta.max(0.0));
        losses.push((-delta).max(0.0));

        let value = match (gains.is_full(), gains.mean(), losses.mean()) {
            (true, Some(avg_gain), Some(avg_loss)) => {
                let rs = avg_gain / floored(avg_loss);
                100.0 - 100.0 / (1.0 + rs)
            }
            _ => NEUTRAL_RSI,
        };
        out.push(value);
    }
    out
}

/// # Summary
/// 尾随简单移动平均。
///
/// # Logic
/// 1. `Truncate` 下窗口长度取 `min(window, 已有样本数)`，每行都有值。
/// 2. `RequireFull` 下样本不足时为 None。
pub fn moving_average(values: &[f64], window: usize, policy: WindowPolicy) -> Vec<Option<f64>> {
    let mut samples = RollingWindow::new(window);
    values
        .iter()
        .map(|v| {
            samples.push(*v);
            match policy {
                WindowPolicy::RequireFull if !samples.is_full() => None,
                _ => samples.mean(),
            }
        })
        .collect()
}

/// 截断窗口的移动平均；截断策略下每行必有值，缺省回退到当前值本身
fn truncated_average(values: &[f64], window: usize) -> Vec<f64> {
    moving_average(values, window, WindowPolicy::Truncate)
        .into_iter()
        .zip(values)
        .map(|(avg, v)| avg.unwrap_or(*v))
        .collect()
}

/// 逐元素比率 `numerator / max(denominator, epsilon)`
pub fn floored_ratio(numerator: &[f64], denominator: &[f64]) -> Vec<f64> {
    numerator
        .iter()
        .zip(denominator)
        .map(|(n, d)| n / floored(*d))
        .collect()
}

/// 成交量相对其截断窗口均值的比率
pub fn volume_ratio(volumes: &[f64], window: usize) -> Vec<f64> {
    floored_ratio(volumes, &truncated_average(volumes, window))
}

/// # Summary
/// NVT 比率 (市值 / 成交量)，越高代表估值压力越大。
///
/// # Arguments
/// * `market_caps`: 市值序列。
/// * `volumes`: 成交量序列。
/// * `variant`: 当日成交量口径或滚动均值口径。
pub fn nvt_ratio(market_caps: &[f64], volumes: &[f64], variant: NvtVariant) -> Vec<f64> {
    match variant {
        NvtVariant::Simple => floored_ratio(market_caps, volumes),
        NvtVariant::Rolling { window } => {
            floored_ratio(market_caps, &truncated_average(volumes, window))
        }
    }
}

/// 累计收益 `Π(1 + r)`，首行为 1
pub fn cumulative_returns(returns: &[Option<f64>]) -> Vec<f64> {
    let mut acc = 1.0;
    returns
        .iter()
        .map(|r| {
            acc *= 1.0 + r.unwrap_or(0.0);
            acc
        })
        .collect()
}

/// 回撤 `cum[i] / max(cum[..=i]) - 1`
pub fn drawdowns(cumulative: &[f64]) -> Vec<f64> {
    let mut peak = f64::MIN;
    cumulative
        .iter()
        .map(|c| {
            peak = peak.max(*c);
            c / floored(peak) - 1.0
        })
        .collect()
}

/// # Summary
/// Indicator Engine 对整张对齐表计算出的全部原始指标列。
///
/// # Invariants
/// - 每一列长度与输入表行数一致。
/// - 依赖成交量 / 市值的列在对应输入列缺失时整体为 None。
#[derive(Debug, Clone, PartialEq)]
pub struct RawIndicators {
    pub daily_return: Vec<Option<f64>>,
    pub log_return: Vec<Option<f64>>,
    pub cumulative_return: Vec<f64>,
    pub drawdown: Vec<f64>,
    pub volatility_14d: Vec<Option<f64>>,
    pub volatility_30d: Vec<Option<f64>>,
    pub volatility_90d: Vec<Option<f64>>,
    pub rsi: Vec<f64>,
    pub ma_50: Vec<f64>,
    pub ma_200: Vec<f64>,
    pub price_to_ma200: Vec<f64>,
    pub volume_ratio: Option<Vec<f64>>,
    pub nvt_ratio: Option<Vec<f64>>,
}

impl RawIndicators {
    /// # Summary
    /// 计算全部原始指标。
    ///
    /// # Logic
    /// 1. 收益类：百分比收益、对数收益、累计收益与回撤。
    /// 2. 波动率：对数收益上的 14/30/90 日滚动波动率，要求完整窗口。
    /// 3. 技术类：RSI(14)，截断窗口的 MA(50) / MA(200)，价格 / MA200 比率。
    /// 4. 网络类：成交量比率 (需成交量列)，NVT 比率 (需成交量与市值列)。
    pub fn compute(series: &AlignedSeries, nvt: NvtVariant) -> Self {
        let prices = series.prices();
        let volumes = series.volumes();
        let market_caps = series.market_caps();

        let daily_return = pct_returns(&prices);
        let log_return = log_returns(&prices);
        let cumulative_return = cumulative_returns(&daily_return);
        let drawdown = drawdowns(&cumulative_return);

        let [w14, w30, w90] = VOLATILITY_WINDOWS;
        let volatility_14d = rolling_volatility(&log_return, w14, WindowPolicy::RequireFull);
        let volatility_30d = rolling_volatility(&log_return, w30, WindowPolicy::RequireFull);
        let volatility_90d = rolling_volatility(&log_return, w90, WindowPolicy::RequireFull);

        let ma_50 = truncated_average(&prices, MA_SHORT);
        let ma_200 = truncated_average(&prices, MA_LONG);
        let price_to_ma200 = floored_ratio(&prices, &ma_200);

        let volume_ratio = volumes
            .as_deref()
            .map(|v| volume_ratio(v, VOLUME_AVG_WINDOW));
        let nvt_ratio = match (&market_caps, &volumes) {
            (Some(mc), Some(v)) => Some(nvt_ratio(mc, v, nvt)),
            _ => None,
        };

        Self {
            daily_return,
            log_return,
            cumulative_return,
            drawdown,
            volatility_14d,
            volatility_30d,
            volatility_90d,
            rsi: rsi(&prices, RSI_PERIOD),
            ma_50,
            ma_200,
            price_to_ma200,
            volume_ratio,
            nvt_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_log_returns() {
        let r = log_returns(&[10.0, 20.0, 10.0]);
        assert_eq!(r[0], None);
        assert!(close(r[1].unwrap(), 2.0_f64.ln()));
        assert!(close(r[2].unwrap(), 0.5_f64.ln()));
        assert!(log_returns(&[]).is_empty());
    }

    #[test]
    fn test_log_returns_zero_price_is_finite() {
        let r = log_returns(&[0.0, 1.0, 0.0]);
        assert!(r.iter().flatten().all(|x| x.is_finite()));
    }

    #[test]
    fn test_pct_returns() {
        let r = pct_returns(&[10.0, 20.0, 15.0]);
        assert_eq!(r, vec![None, Some(1.0), Some(-0.25)]);
    }

    #[test]
    fn test_volatility_requires_full_window() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + f64::from(i % 3)).collect();
        let returns = log_returns(&prices);
        let vol = rolling_volatility(&returns, 14, WindowPolicy::RequireFull);
        // 第 i 行拥有 i 个收益样本
        assert!(vol[..14].iter().all(Option::is_none));
        assert!(vol[14..].iter().all(Option::is_some));
    }

    #[test]
    fn test_volatility_truncate_policy() {
        let returns = vec![None, Some(0.1), Some(-0.1), Some(0.1)];
        let vol = rolling_volatility(&returns, 14, WindowPolicy::Truncate);
        assert_eq!(vol[0], None);
        assert_eq!(vol[1], None);
        assert!(vol[2].is_some());
        assert!(vol[3].unwrap() > 0.0);
    }

    #[test]
    fn test_volatility_scaling() {
        let returns = vec![None, Some(0.01), Some(-0.01)];
        let vol = rolling_volatility(&returns, 2, WindowPolicy::RequireFull);
        let std = (2.0_f64 * 0.01 * 0.01).sqrt();
        assert!(close(vol[2].unwrap(), std * 2.0_f64.sqrt()));
    }

    #[test]
    fn test_rsi_neutral_before_full_window() {
        let prices: Vec<f64> = (1..=20).map(f64::from).collect();
        let values = rsi(&prices, 14);
        assert!(values[..14].iter().all(|v| *v == NEUTRAL_RSI));
        // 单边上涨，下跌均值被 epsilon 兜底，RSI 接近 100
        assert!(values[14] > 99.9);
    }

    #[test]
    fn test_rsi_all_losses_and_flat() {
        let falling: Vec<f64> = (1..=20).rev().map(f64::from).collect();
        assert!(rsi(&falling, 14)[19] < 1e-9);

        let flat = vec![5.0; 20];
        let values = rsi(&flat, 14);
        assert!(values[..14].iter().all(|v| *v == NEUTRAL_RSI));
        assert!(values[14..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_rsi_sub_cent_prices_use_floored_loss() {
        // 7 次 +8e-6，7 次 -4e-6；下跌均值 2e-6 被抬到 1e-5
        let mut prices = vec![0.0002];
        for i in 0..14 {
            let last = prices[prices.len() - 1];
            prices.push(if i % 2 == 0 { last + 8e-6 } else { last - 4e-6 });
        }
        let value = rsi(&prices, 14)[14];
        // avg_gain = 4e-6，RS = 0.4
        assert!((value - 100.0 * 0.4 / 1.4).abs() < 1e-6);
        assert!(value != NEUTRAL_RSI);
    }

    #[test]
    fn test_rsi_mixed_window() {
        // 7 次 +2，7 次 -1
        let mut prices = vec![100.0];
        for i in 0..14 {
            let last = prices[prices.len() - 1];
            prices.push(if i % 2 == 0 { last + 2.0 } else { last - 1.0 });
        }
        let value = rsi(&prices, 14)[14];
        // RS = (14/14) / (7/14) = 2
        assert!(close(value, 100.0 - 100.0 / 3.0));
    }

    #[test]
    fn test_moving_average_truncates() {
        let ma = moving_average(&[2.0, 4.0, 6.0, 8.0], 3, WindowPolicy::Truncate);
        assert_eq!(ma, vec![Some(2.0), Some(3.0), Some(4.0), Some(6.0)]);

        let full = moving_average(&[2.0, 4.0, 6.0, 8.0], 3, WindowPolicy::RequireFull);
        assert_eq!(full, vec![None, None, Some(4.0), Some(6.0)]);
    }

    #[test]
    fn test_nvt_variants_and_epsilon_floor() {
        let mc = [1_000.0, 2_000.0];
        let vol = [10.0, 0.0];
        let simple = nvt_ratio(&mc, &vol, NvtVariant::Simple);
        assert!(close(simple[0], 100.0));
        assert!(close(simple[1], 2_000.0 / EPSILON));

        let rolling = nvt_ratio(&mc, &vol, NvtVariant::Rolling { window: 2 });
        assert!(close(rolling[0], 100.0));
        assert!(close(rolling[1], 2_000.0 / 5.0));
    }

    #[test]
    fn test_volume_ratio() {
        let r = volume_ratio(&[10.0, 30.0], 30);
        assert!(close(r[0], 1.0));
        assert!(close(r[1], 1.5));
    }

    #[test]
    fn test_cumulative_returns_and_drawdown() {
        let returns = pct_returns(&[10.0, 20.0, 15.0, 25.0]);
        let cum = cumulative_returns(&returns);
        assert!(close(cum[0], 1.0));
        assert!(close(cum[1], 2.0));
        assert!(close(cum[2], 1.5));
        let dd = drawdowns(&cum);
        assert!(close(dd[0], 0.0));
        assert!(close(dd[1], 0.0));
        assert!(close(dd[2], -0.25));
        assert!(close(dd[3], 0.0));
    }
}
