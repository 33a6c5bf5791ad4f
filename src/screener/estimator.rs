//! Return potential estimation.
//!
//! Blends three independent signals into one estimate:
//!
//! 1. historical volatility (average rolling 5-bar range),
//! 2. technical target (distance to the next resistance level),
//! 3. momentum continuation (half of the current 5-day move).
//!
//! Confidence reflects how much the three signals agree plus technical
//! and volume confirmation. Series under [`MIN_ESTIMATE_BARS`] bars get
//! a zero estimate with the maximum days-to-target.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::data::PriceSeries;
use crate::indicators::{
    find_support_resistance, is_macd_bullish, latest, momentum, IndicatorSet,
};

/// Minimum history for a meaningful estimate.
pub const MIN_ESTIMATE_BARS: usize = 30;

const HISTORICAL_WEIGHT: f64 = 0.4;
const TECHNICAL_WEIGHT: f64 = 0.3;
const MOMENTUM_WEIGHT: f64 = 0.3;

/// Estimated short-term return, with confidence and timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnEstimate {
    /// Estimated price appreciation, percent.
    pub percent: f64,
    /// Confidence in the estimate, 0-100.
    pub confidence: f64,
    /// Expected trading days to reach the target, 5-10.
    pub days_to_target: u32,
}

impl ReturnEstimate {
    fn insufficient() -> Self {
        Self {
            percent: 0.0,
            confidence: 0.0,
            days_to_target: 10,
        }
    }
}

/// Estimate return potential for a symbol.
pub fn estimate_return(
    current_price: f64,
    series: &PriceSeries,
    set: &IndicatorSet,
) -> ReturnEstimate {
    if series.len() < MIN_ESTIMATE_BARS {
        return ReturnEstimate::insufficient();
    }

    let historical = historical_volatility(series);
    let technical = technical_target(series, current_price);
    let momentum_proj = momentum_projection(series);

    let percent = historical * HISTORICAL_WEIGHT
        + technical * TECHNICAL_WEIGHT
        + momentum_proj * MOMENTUM_WEIGHT;

    let confidence = confidence_score(historical, technical, momentum_proj, series, set);
    let days_to_target = days_to_target(series, percent);

    ReturnEstimate {
        percent,
        confidence,
        days_to_target,
    }
}

// ============================================================================
// Signals
// ============================================================================

/// Average rolling 5-bar high-low range over the trailing 20 bars, as a
/// percentage of each window's midpoint.
fn historical_volatility(series: &PriceSeries) -> f64 {
    let recent = series.tail(20);
    if recent.len() <= 5 {
        return 0.0;
    }

    let mut ranges = Vec::with_capacity(recent.len() - 5);
    for window in recent.windows(5).take(recent.len() - 5) {
        let high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let mid = (high + low) / 2.0;
        if mid > 0.0 {
            ranges.push((high - low) / mid * 100.0);
        }
    }

    if ranges.is_empty() {
        return 0.0;
    }
    ranges.iter().mean()
}

/// Percentage distance to the nearest resistance above the price; falls
/// back to the window high, and 0 when nothing sits above.
fn technical_target(series: &PriceSeries, current_price: f64) -> f64 {
    let Some(levels) = find_support_resistance(series) else {
        return 0.0;
    };

    let resistance = levels.nearest_resistance().unwrap_or(levels.resistance);
    if resistance <= current_price || current_price <= 0.0 {
        return 0.0;
    }
    (resistance - current_price) / current_price * 100.0
}

/// Conservative continuation: half of the 5-day momentum when positive.
fn momentum_projection(series: &PriceSeries) -> f64 {
    let current = momentum(series, 5);
    if current <= 0.0 {
        return 0.0;
    }
    current * 0.5
}

// ============================================================================
// Confidence
// ============================================================================

fn confidence_score(
    historical: f64,
    technical: f64,
    momentum_proj: f64,
    series: &PriceSeries,
    set: &IndicatorSet,
) -> f64 {
    let signals = [historical, technical, momentum_proj];
    let avg = signals.iter().mean();
    if avg == 0.0 {
        return 0.0;
    }

    // Agreement between the three signals, 0-30 points
    let variance = signals.iter().population_variance();
    let relative_variance = if avg > 0.0 {
        variance / (avg * avg)
    } else {
        1.0
    };
    let agreement = if relative_variance < 0.1 {
        30.0
    } else if relative_variance < 0.3 {
        20.0
    } else {
        10.0
    };

    let total = agreement + technical_strength(series, set) + volume_confidence(series, set);
    total.min(100.0)
}

/// Technical confirmation, 0-40 points.
fn technical_strength(series: &PriceSeries, set: &IndicatorSet) -> f64 {
    let mut score = 0.0;

    if is_macd_bullish(set) {
        score += 15.0;
    }

    if let Some(rsi) = latest(&set.rsi) {
        if (45.0..=70.0).contains(&rsi) {
            score += 15.0;
        }
    }

    if let (Some(last), Some(sma_20)) = (series.last(), latest(&set.sma_20)) {
        if last.close > sma_20 {
            score += 10.0;
        }
    }

    score
}

/// Volume confirmation, 0-30 points.
fn volume_confidence(series: &PriceSeries, set: &IndicatorSet) -> f64 {
    let Some(avg_vol) = latest(&set.volume_sma_20) else {
        return 0.0;
    };
    if avg_vol == 0.0 {
        return 0.0;
    }
    let Some(last) = series.last() else {
        return 0.0;
    };

    let mut score = 0.0;
    let vol_ratio = last.volume / avg_vol;
    if vol_ratio > 1.5 {
        score += 20.0;
    } else if vol_ratio > 1.0 {
        score += 10.0;
    }

    let recent = series.tail(5);
    if recent.len() >= 3 && recent[recent.len() - 1].volume > recent[recent.len() - 3].volume {
        score += 10.0;
    }

    score
}

// ============================================================================
// Timeline
// ============================================================================

/// Days to reach the target at the recent average daily return, clamped
/// to [5, 10]. Defaults to 10 when momentum is flat or negative.
fn days_to_target(series: &PriceSeries, target_percent: f64) -> u32 {
    let recent = series.tail(10);
    if recent.len() < 2 {
        return 7;
    }

    let mut daily_returns = Vec::with_capacity(recent.len() - 1);
    for pair in recent.windows(2) {
        if pair[0].close != 0.0 {
            daily_returns.push((pair[1].close - pair[0].close) / pair[0].close);
        }
    }
    if daily_returns.is_empty() {
        return 7;
    }

    let avg_daily_pct = daily_returns.iter().mean() * 100.0;
    if avg_daily_pct <= 0.0 {
        return 10;
    }

    let days = (target_percent / avg_daily_pct) as i64;
    days.clamp(5, 10) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Bar;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close * 1.02,
                low: close * 0.98,
                close,
                volume: 1_000_000.0,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    #[test]
    fn test_insufficient_history() {
        let s = series(&[100.0; 20]);
        let set = IndicatorSet::compute(&s);
        let est = estimate_return(100.0, &s, &set);
        assert_eq!(est.percent, 0.0);
        assert_eq!(est.confidence, 0.0);
        assert_eq!(est.days_to_target, 10);
    }

    #[test]
    fn test_uptrend_estimates_positive_return() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.8).collect();
        let s = series(&closes);
        let set = IndicatorSet::compute(&s);
        let est = estimate_return(*closes.last().unwrap(), &s, &set);

        assert!(est.percent > 0.0);
        assert!((0.0..=100.0).contains(&est.confidence));
        assert!((5..=10).contains(&est.days_to_target));
    }

    #[test]
    fn test_flat_series_low_confidence() {
        // Flat closes still carry intrabar range, so the historical and
        // technical signals stay positive while momentum is 0
        let s = series(&[100.0; 60]);
        let set = IndicatorSet::compute(&s);
        let est = estimate_return(100.0, &s, &set);

        // Historical range exists (high/low spread), so percent > 0 and
        // disagreement keeps agreement at the low band
        assert!(est.percent > 0.0);
        assert!(est.confidence >= 10.0);
        assert_eq!(est.days_to_target, 10);
    }

    #[test]
    fn test_days_clamped() {
        // Strong steady momentum drives the raw estimate under 5 days
        let closes: Vec<f64> = (0..60).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let s = series(&closes);
        let set = IndicatorSet::compute(&s);
        let est = estimate_return(*closes.last().unwrap(), &s, &set);
        assert!((5..=10).contains(&est.days_to_target));
    }

    #[test]
    fn test_confidence_capped() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.5).collect();
        let s = series(&closes);
        let set = IndicatorSet::compute(&s);
        let est = estimate_return(*closes.last().unwrap(), &s, &set);
        assert!(est.confidence <= 100.0);
    }
}
