//! Error types for the screening pipeline.
//!
//! Two layers of failure exist here and they are deliberately kept apart:
//! `ScreenError` is systemic (bad configuration, I/O) and propagates to the
//! caller of a whole scan; `RejectionReason` is per-symbol and is folded
//! into the scan result without aborting the batch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Systemic screening errors.
///
/// A scan only returns one of these for failures that affect the whole
/// batch. "No good trades found" is not an error; it is a valid Tier-3
/// result.
#[derive(Debug, Error)]
pub enum ScreenError {
    /// Configuration error (invalid weights, inverted price band, ...)
    #[error("configuration error: {0}")]
    Config(String),

    /// Data error (malformed history, ordering violation)
    #[error("data error: {0}")]
    Data(String),

    /// I/O error (watchlist files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for screening operations.
pub type ScreenResult<T> = Result<T, ScreenError>;

/// Why a symbol was dropped from a scan.
///
/// Every pipeline stage returns `Result<_, RejectionReason>`; the
/// orchestrator folds these into the surviving list instead of relying on
/// unwinding. Rejections are recorded on the scan result for diagnostics.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum RejectionReason {
    /// Fetch failed or returned empty history
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// Fetch exceeded the per-symbol timeout
    #[error("fetch timed out")]
    FetchTimeout,

    /// Scan deadline expired before the symbol finished processing
    #[error("scan deadline expired")]
    DeadlineExceeded,

    /// Price outside the configured [min, max] band
    #[error("price {price:.2} outside band [{min:.2}, {max:.2}]")]
    PriceOutOfRange { price: f64, min: f64, max: f64 },

    /// Daily volume below the configured floor
    #[error("volume {volume:.0} below minimum {min:.0}")]
    VolumeTooLow { volume: f64, min: f64 },

    /// Market cap below the configured floor
    #[error("market cap {market_cap:.0} below minimum {min:.0}")]
    MarketCapTooSmall { market_cap: f64, min: f64 },

    /// ATR-derived daily volatility below the configured floor
    #[error("volatility {volatility:.2}% below minimum {min:.2}%")]
    VolatilityTooLow { volatility: f64, min: f64 },

    /// Price below its 50-day SMA
    #[error("price below 50-day SMA (downtrend)")]
    Downtrend,

    /// Fewer bars than a stage requires
    #[error("insufficient history: {bars} bars, need {required}")]
    InsufficientHistory { bars: usize, required: usize },

    /// Unexpected arithmetic failure, caught at the symbol boundary
    #[error("computation error: {0}")]
    Computation(String),

    /// Position sizing produced zero shares for the configured capital
    #[error("position size is zero shares")]
    SharesZero,

    /// Risk/reward or stop-loss bounds violated
    #[error("risk validation failed: {0}")]
    RiskRejected(String),
}

/// A per-symbol rejection record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    /// Symbol that was dropped
    pub symbol: String,
    /// Why it was dropped
    pub reason: RejectionReason,
}

impl Rejection {
    pub fn new(symbol: impl Into<String>, reason: RejectionReason) -> Self {
        Self {
            symbol: symbol.into(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_display() {
        let reason = RejectionReason::PriceOutOfRange {
            price: 2.5,
            min: 5.0,
            max: 500.0,
        };
        assert!(reason.to_string().contains("2.50"));
        assert!(reason.to_string().contains("5.00"));
    }

    #[test]
    fn test_rejection_roundtrip() {
        let rejection = Rejection::new("AAPL", RejectionReason::Downtrend);
        let json = serde_json::to_string(&rejection).unwrap();
        let parsed: Rejection = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rejection);
    }

    #[test]
    fn test_screen_error_display() {
        let err = ScreenError::Config("weights must sum to 1.0".to_string());
        assert!(err.to_string().contains("configuration error"));
    }
}
