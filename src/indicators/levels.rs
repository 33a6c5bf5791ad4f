//! Support/resistance levels and price momentum.

use serde::{Deserialize, Serialize};

use crate::data::PriceSeries;
use crate::indicators::{latest, IndicatorSet};

/// Lookback window for support/resistance extraction.
pub const LEVEL_LOOKBACK: usize = 20;

/// Number of candidate levels kept on each side of the price.
const MAX_LEVELS: usize = 5;

/// Key price levels over the recent window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    /// Lowest low of the window.
    pub support: f64,
    /// Highest high of the window.
    pub resistance: f64,
    /// Lows below the current price, nearest first.
    pub support_levels: Vec<f64>,
    /// Highs above the current price, nearest first.
    pub resistance_levels: Vec<f64>,
}

impl SupportResistance {
    /// Nearest support below the current price, falling back to the
    /// window low.
    pub fn nearest_support(&self) -> f64 {
        self.support_levels.first().copied().unwrap_or(self.support)
    }

    /// Nearest resistance above the current price, if any level exists.
    pub fn nearest_resistance(&self) -> Option<f64> {
        self.resistance_levels.first().copied()
    }
}

/// Extract support/resistance levels from the last [`LEVEL_LOOKBACK`] bars.
///
/// Candidate levels are the window's extreme highs and lows, filtered to
/// the relevant side of the latest close. Returns `None` on an empty
/// series.
pub fn find_support_resistance(series: &PriceSeries) -> Option<SupportResistance> {
    let recent = series.tail(LEVEL_LOOKBACK);
    let last = recent.last()?;
    let current_price = last.close;

    let mut support = f64::INFINITY;
    let mut resistance = f64::NEG_INFINITY;
    for bar in recent {
        support = support.min(bar.low);
        resistance = resistance.max(bar.high);
    }

    // Largest highs in the window, then keep those above the price,
    // nearest (lowest) first
    let mut highs: Vec<f64> = recent.iter().map(|b| b.high).collect();
    highs.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    highs.truncate(MAX_LEVELS);
    let mut resistance_levels: Vec<f64> =
        highs.into_iter().filter(|&h| h > current_price).collect();
    resistance_levels.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    // Smallest lows in the window, then keep those below the price,
    // nearest (highest) first
    let mut lows: Vec<f64> = recent.iter().map(|b| b.low).collect();
    lows.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    lows.truncate(MAX_LEVELS);
    let mut support_levels: Vec<f64> = lows.into_iter().filter(|&l| l < current_price).collect();
    support_levels.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    Some(SupportResistance {
        support,
        resistance,
        support_levels,
        resistance_levels,
    })
}

/// Percentage price change over `period` bars.
///
/// Needs `period + 1` bars; shorter series yield 0.
pub fn momentum(series: &PriceSeries, period: usize) -> f64 {
    let bars = series.bars();
    if bars.len() < period + 1 {
        return 0.0;
    }

    let past = bars[bars.len() - 1 - period].close;
    let last = bars[bars.len() - 1].close;
    if past == 0.0 {
        return 0.0;
    }
    (last - past) / past * 100.0
}

/// ATR as a percentage of the latest close; 0 when undefined.
pub fn volatility_percent(series: &PriceSeries, indicators: &IndicatorSet) -> f64 {
    let Some(atr) = latest(&indicators.atr) else {
        return 0.0;
    };
    let Some(last) = series.last() else {
        return 0.0;
    };
    if last.close <= 0.0 || !atr.is_finite() {
        return 0.0;
    }
    atr / last.close * 100.0
}
