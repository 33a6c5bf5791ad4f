//! Composite quality scoring.
//!
//! Five independent sub-scores (MACD, RSI, volume, breakout, momentum),
//! each additive and capped at 100, blended into an overall score by the
//! configured weights. Pure functions of the indicator columns and a
//! short trailing window; no I/O, no mutation.

use serde::{Deserialize, Serialize};

use crate::config::ScoringWeights;
use crate::data::PriceSeries;
use crate::indicators::{
    find_support_resistance, is_histogram_expanding, is_macd_bullish, latest,
    macd_crossover_within, momentum, nth_back, IndicatorSet,
};

/// Bars of MACD history used to normalize trend strength.
const MACD_RANGE_WINDOW: usize = 20;
/// Crossover recency window, in bars.
const CROSSOVER_LOOKBACK: usize = 3;

/// Per-factor sub-scores plus the weighted overall score, all in [0,100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreVector {
    pub macd: f64,
    pub rsi: f64,
    pub volume: f64,
    pub breakout: f64,
    pub momentum: f64,
    pub overall: f64,
}

/// Stateless scorer parameterized by blend weights.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    weights: ScoringWeights,
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Score a symbol from its indicator set and latest quote.
    ///
    /// A degenerate indicator set scores 0 on every factor.
    pub fn score(
        &self,
        series: &PriceSeries,
        set: &IndicatorSet,
        current_price: f64,
    ) -> ScoreVector {
        if set.is_degenerate() {
            return ScoreVector {
                macd: 0.0,
                rsi: 0.0,
                volume: 0.0,
                breakout: 0.0,
                momentum: 0.0,
                overall: 0.0,
            };
        }

        let macd = macd_score(set);
        let rsi = rsi_score(set);
        let volume = volume_score(series, set);
        let breakout = breakout_score(series, set, current_price);
        let momentum = momentum_score(series);

        let overall = macd * self.weights.macd
            + rsi * self.weights.rsi
            + volume * self.weights.volume
            + breakout * self.weights.breakout
            + momentum * self.weights.momentum;

        ScoreVector {
            macd,
            rsi,
            volume,
            breakout,
            momentum,
            overall,
        }
    }
}

// ============================================================================
// Sub-scores
// ============================================================================

/// MACD factor: crossover recency, bullish posture, histogram expansion,
/// and trend strength normalized by the recent MACD range.
fn macd_score(set: &IndicatorSet) -> f64 {
    let mut score: f64 = 0.0;

    if macd_crossover_within(set, CROSSOVER_LOOKBACK).is_some() {
        score += 40.0;
    }
    if is_macd_bullish(set) {
        score += 20.0;
    }
    if is_histogram_expanding(set) {
        score += 20.0;
    }

    if let Some(macd_val) = latest(&set.macd) {
        if macd_val > 0.0 {
            let recent: Vec<f64> = set
                .macd
                .iter()
                .rev()
                .take(MACD_RANGE_WINDOW)
                .filter_map(|v| *v)
                .collect();
            let range = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max)
                - recent.iter().copied().fold(f64::INFINITY, f64::min);
            if range > 0.0 {
                score += (macd_val / range * 20.0).min(20.0);
            }
        }
    }

    score.min(100.0)
}

/// RSI factor: momentum zone, rising slope, not overbought.
fn rsi_score(set: &IndicatorSet) -> f64 {
    let Some(rsi) = latest(&set.rsi) else {
        return 0.0;
    };

    let mut score: f64 = 0.0;

    if (45.0..=65.0).contains(&rsi) {
        score += 50.0;
    } else if (35.0..45.0).contains(&rsi) || (65.0 < rsi && rsi <= 70.0) {
        score += 25.0;
    }

    // Rising vs. 3 bars ago
    if let Some(prev) = nth_back(&set.rsi, 2) {
        if rsi > prev {
            score += 25.0;
        }
    }

    if rsi < 70.0 {
        score += 25.0;
    } else if rsi < 80.0 {
        score += 10.0;
    }

    score.min(100.0)
}

/// Volume factor: spike vs. 20-day average, short-term trend, and
/// persistence of above-average bars.
fn volume_score(series: &PriceSeries, set: &IndicatorSet) -> f64 {
    let Some(avg_vol) = latest(&set.volume_sma_20) else {
        return 0.0;
    };
    if avg_vol == 0.0 {
        return 0.0;
    }

    let bars = series.bars();
    let Some(last) = bars.last() else {
        return 0.0;
    };

    let mut score: f64 = 0.0;
    let vol_ratio = last.volume / avg_vol;

    if vol_ratio > 2.0 {
        score += 50.0;
    } else if vol_ratio > 1.5 {
        score += 35.0;
    } else if vol_ratio > 1.0 {
        score += 20.0;
    }

    // Short-term volume trend over the last 3-5 bars
    let recent = series.tail(5);
    if recent.len() >= 3 {
        let current = recent[recent.len() - 1].volume;
        if current > recent[recent.len() - 3].volume {
            score += 30.0;
        } else if current > recent[recent.len() - 2].volume {
            score += 15.0;
        }
    }

    // Persistence: bars above their own 20-day volume average
    let len = bars.len();
    let window = 5.min(len);
    let mut above_avg = 0;
    for i in (len - window)..len {
        if let Some(avg) = set.volume_sma_20.get(i).copied().flatten() {
            if bars[i].volume > avg {
                above_avg += 1;
            }
        }
    }
    if above_avg >= 4 {
        score += 20.0;
    } else if above_avg >= 3 {
        score += 10.0;
    }

    score.min(100.0)
}

/// Breakout factor: proximity to the 20-day high, posture above the
/// moving averages, and a well-placed support shelf below.
fn breakout_score(series: &PriceSeries, set: &IndicatorSet, current_price: f64) -> f64 {
    let mut score: f64 = 0.0;

    let high_20 = series
        .tail(20)
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);

    if current_price >= high_20 * 0.99 {
        score += 40.0;
    } else if current_price >= high_20 * 0.97 {
        score += 20.0;
    }

    if let Some(sma_20) = latest(&set.sma_20) {
        if current_price > sma_20 {
            score += 15.0;
        }
    }
    if let Some(sma_50) = latest(&set.sma_50) {
        if current_price > sma_50 {
            score += 15.0;
        }
    }

    if let Some(levels) = find_support_resistance(series) {
        if let Some(nearest) = levels.support_levels.first() {
            let distance = (current_price - nearest) / current_price * 100.0;
            // Ideal shelf sits 5-10% below the entry
            if (5.0..=10.0).contains(&distance) {
                score += 30.0;
            } else if (3.0..=15.0).contains(&distance) {
                score += 20.0;
            } else if distance > 2.0 {
                score += 10.0;
            }
        }
    }

    score.min(100.0)
}

/// Momentum factor: 5-day return band, acceleration vs. the 3-day move,
/// and a higher-highs pattern with a 2% pullback tolerance.
fn momentum_score(series: &PriceSeries) -> f64 {
    let mut score: f64 = 0.0;

    let momentum_5d = momentum(series, 5);
    if (5.0..=15.0).contains(&momentum_5d) {
        score += 50.0;
    } else if (3.0..5.0).contains(&momentum_5d) || (15.0 < momentum_5d && momentum_5d <= 20.0) {
        score += 35.0;
    } else if (1.0..3.0).contains(&momentum_5d) {
        score += 20.0;
    }

    let momentum_3d = momentum(series, 3);
    if momentum_3d > momentum_5d * 0.6 {
        score += 25.0;
    } else if momentum_3d > 0.0 {
        score += 10.0;
    }

    let highs: Vec<f64> = series.tail(5).iter().map(|b| b.high).collect();
    if highs.len() >= 5 {
        let higher_highs = highs.windows(2).all(|pair| pair[1] >= pair[0] * 0.98);
        if higher_highs {
            score += 25.0;
        } else if highs[highs.len() - 1] > highs[0] {
            score += 10.0;
        }
    }

    score.min(100.0)
}
