//! Swingscan
//!
//! Adaptive stock screener for short-term swing trades. Turns raw daily
//! OHLCV history into a tiered, ranked shortlist of trade candidates
//! with entry, target, stop, and position sizing attached.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          swingscan                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────────┐  │
//! │  │  Data Layer  │  │  Indicators  │  │  Screener             │  │
//! │  │  provider    │─►│  RSI, MACD,  │─►│  score -> estimate -> │  │
//! │  │  cache       │  │  SMA, ATR,   │  │  risk -> tiering      │  │
//! │  │  rate limit  │  │  Bollinger   │  │                       │  │
//! │  └──────────────┘  └──────────────┘  └───────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Pipeline
//!
//! Each symbol moves through fetch, filter, score, estimate, and
//! classify. Any stage can drop the symbol with a recorded rejection
//! without aborting the batch. Survivors are partitioned into
//! conviction tiers and the best tier's top candidates are materialized
//! into [`TradeCandidate`]s.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use swingscan::config::ScreenerConfig;
//! use swingscan::data::StaticProvider;
//! use swingscan::screener::ScreenerEngine;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let provider = Arc::new(StaticProvider::new());
//! let engine = ScreenerEngine::new(ScreenerConfig::default(), provider);
//! let result = engine.scan(&["AAPL".to_string()]).await?;
//! println!("tier {}: {} trades", result.tier.number(), result.candidates.len());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod screener;
pub mod watchlist;

pub use config::ScreenerConfig;
pub use data::{DataProvider, PriceSeries, StockSnapshot};
pub use error::{Rejection, RejectionReason, ScreenError, ScreenResult};
pub use screener::{ScanResult, ScreenerEngine, Tier, TradeCandidate};
