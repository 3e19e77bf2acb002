//! # `kasrisk-feed` - 外部数据源适配器
//!
//! - [`coingecko::CoinGeckoProvider`]: 价格 / 成交量 / 市值日线序列。
//! - [`alternative::AlternativeMeProvider`]: 加密货币 Fear & Greed 情绪指数。

pub mod alternative;
pub mod coingecko;
mod http;
