//! Market data module.
//!
//! Core OHLCV types plus the collaborator surface the screener depends on:
//! a `DataProvider` trait for fetching per-symbol snapshots, a TTL quote
//! cache, and a request-pacing rate limiter. The actual network transport
//! behind a provider is out of scope; implementations only need to honor
//! the logical contract.

mod cache;
mod provider;
mod rate_limiter;

pub use cache::{CacheStats, QuoteCache};
pub use provider::{DataProvider, ProviderError, StaticProvider};
pub use rate_limiter::{shared_limiter, RateLimiter, SharedRateLimiter};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ScreenError;

// ============================================================================
// Core Data Types
// ============================================================================

/// A single daily OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Trading date
    pub date: NaiveDate,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Traded volume (shares)
    pub volume: f64,
}

/// An ordered daily price history for one symbol.
///
/// Bars are strictly ascending by date; the invariant is checked on
/// construction and the series is immutable afterwards. Gaps (holidays,
/// halts) are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bar>", into = "Vec<Bar>")]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series from bars, enforcing ascending date order.
    pub fn new(bars: Vec<Bar>) -> Result<Self, ScreenError> {
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ScreenError::Data(format!(
                    "bars out of order: {} follows {}",
                    pair[1].date, pair[0].date
                )));
            }
        }
        Ok(Self { bars })
    }

    /// Number of bars.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Whether the series has no bars.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// All bars, oldest first.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// The most recent bar, if any.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// The trailing `n` bars (fewer if the series is shorter).
    pub fn tail(&self, n: usize) -> &[Bar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }
}

impl TryFrom<Vec<Bar>> for PriceSeries {
    type Error = String;

    fn try_from(bars: Vec<Bar>) -> Result<Self, Self::Error> {
        Self::new(bars).map_err(|e| e.to_string())
    }
}

impl From<PriceSeries> for Vec<Bar> {
    fn from(series: PriceSeries) -> Self {
        series.bars
    }
}

/// Per-symbol snapshot returned by a `DataProvider`.
///
/// Immutable once fetched for a scan; every downstream stage reads from
/// this typed value rather than an untyped payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    /// Stock symbol (e.g., "AAPL")
    pub symbol: String,
    /// Company name
    pub name: String,
    /// Sector label
    pub sector: String,
    /// Latest trade price
    pub current_price: f64,
    /// Latest daily volume
    pub volume: f64,
    /// Average daily volume
    pub avg_volume: f64,
    /// Market capitalization
    pub market_cap: f64,
    /// Daily price history, oldest first
    pub history: PriceSeries,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: &str, close: f64) -> Bar {
        Bar {
            date: date.parse().unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn test_series_ascending_ok() {
        let series =
            PriceSeries::new(vec![bar("2026-01-05", 10.0), bar("2026-01-06", 11.0)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.last().unwrap().close, 11.0);
    }

    #[test]
    fn test_series_rejects_out_of_order() {
        let result = PriceSeries::new(vec![bar("2026-01-06", 10.0), bar("2026-01-05", 11.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_series_rejects_duplicate_dates() {
        let result = PriceSeries::new(vec![bar("2026-01-05", 10.0), bar("2026-01-05", 11.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_series_tail() {
        let series = PriceSeries::new(vec![
            bar("2026-01-05", 10.0),
            bar("2026-01-06", 11.0),
            bar("2026-01-07", 12.0),
        ])
        .unwrap();

        let tail = series.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].close, 11.0);

        // Asking for more than we have returns everything
        assert_eq!(series.tail(10).len(), 3);
    }

    #[test]
    fn test_series_serde_enforces_order() {
        let json = r#"[
            {"date": "2026-01-06", "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0, "volume": 1.0},
            {"date": "2026-01-05", "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0, "volume": 1.0}
        ]"#;
        let result: Result<PriceSeries, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
