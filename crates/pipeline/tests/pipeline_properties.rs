use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use kasrisk_core::config::PipelineSettings;
use kasrisk_core::market::entity::{RawSeriesPoint, SentimentPoint};
use kasrisk_core::risk::entity::{RiskWeights, SentimentConvention};
use kasrisk_core::risk::error::{ErrorKind, PipelineError};
use kasrisk_pipeline::RiskPipeline;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn series(prices: &[f64]) -> Vec<RawSeriesPoint> {
    prices
        .iter()
        .zip(0u32..)
        .map(|(p, i)| RawSeriesPoint {
            time: start() + Duration::days(i64::from(i)),
            price: *p,
            volume: Some(1_000.0 + f64::from(i % 7) * 150.0),
            market_cap: Some(p * 1_000_000.0),
        })
        .collect()
}

/// 线性同余生成的确定性随机游走
fn random_walk(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    let mut price = 100.0;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let shock = f64::from(u32::try_from((state >> 33) % 2001).unwrap_or(1000)) / 1000.0 - 1.0;
            price = (price * (1.0 + shock * 0.08)).max(0.01);
            price
        })
        .collect()
}

fn pipeline() -> RiskPipeline {
    RiskPipeline::new(PipelineSettings::default()).unwrap()
}

#[test]
fn test_all_scores_within_unit_interval() -> Result<()> {
    let cases = vec![
        random_walk(400, 7),
        random_walk(120, 42),
        random_walk(15, 3),
        vec![5.0],
        vec![0.0, 1.0, 0.0, 2.0],
        (0..250).map(|i| 50.0 + 30.0 * (f64::from(i) / 9.0).sin()).collect(),
    ];

    for prices in cases {
        let snapshot = pipeline().run(&series(&prices), None, start())?;
        assert_eq!(snapshot.rows().len(), prices.len());
        for row in snapshot.rows() {
            for (name, v) in row.risk_scores() {
                assert!((0.0..=1.0).contains(&v), "{} = {} on {}", name, v, row.date);
            }
        }
        assert!((0.0..=1.0).contains(&snapshot.latest().weighted_risk));
    }
    Ok(())
}

#[test]
fn test_constant_series_normalizes_to_neutral() -> Result<()> {
    let points: Vec<RawSeriesPoint> = (0..120)
        .map(|i| RawSeriesPoint {
            time: start() + Duration::days(i),
            price: 3.0,
            volume: Some(500.0),
            market_cap: Some(9_000.0),
        })
        .collect();
    let snapshot = pipeline().run(&points, None, start())?;

    for row in snapshot.rows() {
        assert_eq!(row.volatility_14d_norm, 0.5);
        assert_eq!(row.volatility_30d_norm, 0.5);
        assert_eq!(row.volatility_90d_norm, 0.5);
        assert_eq!(row.price_risk, 0.5);
        assert_eq!(row.mvrv_risk, 0.5);
        assert_eq!(row.volume_risk, Some(0.5));
        assert_eq!(row.nvt_risk, Some(0.5));
    }
    // 前 14 行价格差不足取中性值，之后平坦窗口 RS = 0
    assert!(snapshot.rows()[..14].iter().all(|r| r.rsi == 50.0));
    assert!(snapshot.rows()[14..].iter().all(|r| r.rsi == 0.0));
    let latest = snapshot.latest();
    assert_eq!(latest.min_price, 3.0);
    assert_eq!(latest.max_price, 3.0);
    assert_eq!(latest.max_drawdown, 0.0);
    Ok(())
}

#[test]
fn test_short_history_uses_neutral_rsi_and_truncated_averages() -> Result<()> {
    let prices: Vec<f64> = (1..=20).map(f64::from).collect();
    let snapshot = pipeline().run(&series(&prices), None, start())?;
    let rows = snapshot.rows();

    assert!(rows[..14].iter().all(|r| r.rsi == 50.0));
    // 20 行远短于 200，MA200 仍然有定义，等于已有样本的均值
    assert!((rows[19].ma_200 - 10.5).abs() < 1e-9);
    assert!((rows[0].ma_50 - 1.0).abs() < 1e-9);
    // 长窗口波动率要求完整窗口
    assert!(rows.iter().all(|r| r.volatility_30d.is_none()));
    assert!(rows[19].volatility_14d.is_some());
    Ok(())
}

#[test]
fn test_increasing_prices_price_risk_monotonic() -> Result<()> {
    let prices: Vec<f64> = (0..60).map(|i| 1.0 + f64::from(i) * 0.5).collect();
    let snapshot = pipeline().run(&series(&prices), None, start())?;
    let risks: Vec<f64> = snapshot.rows().iter().map(|r| r.price_risk).collect();

    assert!(risks.windows(2).all(|w| w[1] > w[0]));
    assert_eq!(risks[0], 0.0);
    assert_eq!(snapshot.latest().price_risk, 1.0);
    Ok(())
}

#[test]
fn test_three_day_example() -> Result<()> {
    let snapshot = pipeline().run(&series(&[10.0, 20.0, 15.0]), None, start())?;
    let risks: Vec<f64> = snapshot.rows().iter().map(|r| r.price_risk).collect();
    assert_eq!(risks, vec![0.0, 1.0, 0.5]);

    let latest = snapshot.latest();
    assert_eq!(latest.min_price, 10.0);
    assert_eq!(latest.max_price, 20.0);
    assert!((latest.max_drawdown + 0.25).abs() < 1e-9);
    // 收益率 [1.0, -0.25] 的样本标准差
    let expected_vol = (2.0_f64 * 0.625 * 0.625).sqrt();
    assert!((latest.realized_volatility.unwrap() - expected_vol).abs() < 1e-12);
    assert_eq!(latest.row_count, 3);
    Ok(())
}

#[test]
fn test_single_category_weighting() -> Result<()> {
    let settings = PipelineSettings {
        weights: RiskWeights {
            volatility: 0.0,
            technical: 1.0,
            sentiment: 0.0,
            network: 0.0,
            valuation: 0.0,
        },
        ..PipelineSettings::default()
    };
    let snapshot = RiskPipeline::new(settings)?.run(&series(&random_walk(90, 11)), None, start())?;
    for row in snapshot.rows() {
        assert!((row.weighted_risk - row.categories.technical).abs() < 1e-12);
    }
    Ok(())
}

#[test]
fn test_negative_weight_rejected() {
    let settings = PipelineSettings {
        weights: RiskWeights {
            sentiment: -0.1,
            ..RiskWeights::default()
        },
        ..PipelineSettings::default()
    };
    let err = RiskPipeline::new(settings).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
}

#[test]
fn test_missing_volume_skips_network_category() -> Result<()> {
    let mut points = series(&random_walk(40, 5));
    for p in points.iter_mut() {
        p.volume = None;
    }
    let snapshot = pipeline().run(&points, None, start())?;
    for row in snapshot.rows() {
        assert_eq!(row.volume_ratio, None);
        assert_eq!(row.nvt_ratio, None);
        assert_eq!(row.categories.network, None);
    }
    assert_eq!(snapshot.latest().nvt_ratio, None);
    Ok(())
}

#[test]
fn test_sentiment_join_and_convention() -> Result<()> {
    let points = series(&[1.0, 2.0, 3.0]);
    let sentiment = vec![
        SentimentPoint {
            date: points[0].date(),
            index: 10,
        },
        SentimentPoint {
            date: points[2].date(),
            index: 90,
        },
    ];

    let fear = pipeline().run(&points, Some(&sentiment), start())?;
    let rows = fear.rows();
    assert!((rows[0].fear_greed_risk - 0.9).abs() < 1e-12);
    assert!(rows[1].sentiment_fallback);
    assert_eq!(rows[1].fear_greed_risk, 0.5);
    assert!((rows[2].fear_greed_risk - 0.1).abs() < 1e-12);

    let greed = RiskPipeline::new(PipelineSettings {
        sentiment: SentimentConvention::GreedIsRisk,
        ..PipelineSettings::default()
    })?
    .run(&points, Some(&sentiment), start())?;
    assert!((greed.rows()[2].fear_greed_risk - 0.9).abs() < 1e-12);
    assert!(!greed.latest().sentiment_fallback);
    Ok(())
}

#[test]
fn test_malformed_and_empty_input_rejected() {
    let err = pipeline().run(&[], None, start()).unwrap_err();
    assert!(matches!(err, PipelineError::DataUnavailable(_)));

    let mut points = series(&[1.0, 2.0]);
    points.swap(0, 1);
    let err = pipeline().run(&points, None, start()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedSeries);
}

#[test]
fn test_run_is_deterministic() -> Result<()> {
    let points = series(&random_walk(200, 99));
    let first = pipeline().run(&points, None, start())?;
    let second = pipeline().run(&points, None, start())?;
    assert_eq!(first, second);
    assert_eq!(first.computed_at(), start());
    Ok(())
}
