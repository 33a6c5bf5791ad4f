//! Technical indicator engine.
//!
//! Derives the fixed indicator set the screener consumes from a daily
//! OHLCV series: RSI-14, MACD(12,26,9), SMA-20/50, Volume-SMA-20, ATR-14,
//! and Bollinger(20,2). Columns are aligned to the series; every rolling
//! window leaves its first `window - 1` values undefined, modeled as
//! `None` rather than NaN so consumers must state their null behavior.
//!
//! Series shorter than [`MIN_BARS`] produce a degenerate (all-empty) set;
//! callers must treat that as "insufficient data", never as zeros.

mod levels;

pub use levels::{
    find_support_resistance, momentum, volatility_percent, SupportResistance,
    LEVEL_LOOKBACK,
};

use statrs::statistics::Statistics;

use crate::data::PriceSeries;

/// Minimum bars required before any indicator is computed.
pub const MIN_BARS: usize = 50;

/// RSI lookback period.
pub const RSI_PERIOD: usize = 14;
/// ATR lookback period.
pub const ATR_PERIOD: usize = 14;
/// Bollinger band window and standard-deviation multiplier.
pub const BOLLINGER_WINDOW: usize = 20;
const BOLLINGER_STD_DEV: f64 = 2.0;
/// MACD EMA spans: fast, slow, signal.
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;

/// Indicator columns aligned to a price series.
///
/// MACD columns are defined from bar 0 (recursive EMA seeds on the first
/// close); all rolling columns carry a `None` warm-up prefix.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSet {
    len: usize,
    pub rsi: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
    pub macd_hist: Vec<Option<f64>>,
    pub sma_20: Vec<Option<f64>>,
    pub sma_50: Vec<Option<f64>>,
    pub volume_sma_20: Vec<Option<f64>>,
    pub atr: Vec<Option<f64>>,
    pub bb_upper: Vec<Option<f64>>,
    pub bb_middle: Vec<Option<f64>>,
    pub bb_lower: Vec<Option<f64>>,
}

impl IndicatorSet {
    /// Compute all indicators for a series.
    ///
    /// Requires at least [`MIN_BARS`] bars; shorter series yield a
    /// degenerate set with no columns populated.
    pub fn compute(series: &PriceSeries) -> Self {
        let bars = series.bars();
        let len = bars.len();

        if len < MIN_BARS {
            return Self {
                len,
                ..Self::default()
            };
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

        let (macd, macd_signal, macd_hist) = compute_macd(&closes);
        let (bb_upper, bb_middle, bb_lower) = compute_bollinger(&closes);

        Self {
            len,
            rsi: compute_rsi(&closes, RSI_PERIOD),
            macd,
            macd_signal,
            macd_hist,
            sma_20: rolling_mean(&closes, 20),
            sma_50: rolling_mean(&closes, 50),
            volume_sma_20: rolling_mean(&volumes, 20),
            atr: compute_atr(series, ATR_PERIOD),
            bb_upper,
            bb_middle,
            bb_lower,
        }
    }

    /// Number of bars the set is aligned to.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the set carries no columns.
    pub fn is_empty(&self) -> bool {
        self.rsi.is_empty()
    }

    /// True when the source series was too short to compute indicators.
    pub fn is_degenerate(&self) -> bool {
        self.is_empty()
    }
}

/// Latest defined value of a column.
pub fn latest(column: &[Option<f64>]) -> Option<f64> {
    column.last().copied().flatten()
}

/// Value `n` bars back from the end (`n = 0` is the latest bar).
pub fn nth_back(column: &[Option<f64>], n: usize) -> Option<f64> {
    if n >= column.len() {
        return None;
    }
    column[column.len() - 1 - n]
}

// ============================================================================
// Primitives
// ============================================================================

/// Simple rolling mean; first `window - 1` outputs are `None`.
fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    let mut sum: f64 = values[..window].iter().sum();
    out[window - 1] = Some(sum / window as f64);
    for i in window..values.len() {
        sum += values[i] - values[i - window];
        out[i] = Some(sum / window as f64);
    }
    out
}

/// Rolling mean over an optional column; a window containing any `None`
/// yields `None`, matching NaN-poisoned rolling windows.
fn rolling_mean_opt(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    for i in (window - 1)..values.len() {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().all(Option::is_some) {
            let sum: f64 = slice.iter().map(|v| v.unwrap_or(0.0)).sum();
            out[i] = Some(sum / window as f64);
        }
    }
    out
}

/// Recursive EMA (`adjust=false` semantics), seeded with the first value.
fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev = values[0];
    out.push(prev);
    for &value in &values[1..] {
        prev = alpha * value + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

/// RSI from plain rolling means of up/down deltas (not Wilder-smoothed).
fn compute_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let len = closes.len();

    // Delta column is undefined at index 0
    let mut gains: Vec<Option<f64>> = vec![None; len];
    let mut losses: Vec<Option<f64>> = vec![None; len];
    for i in 1..len {
        let delta = closes[i] - closes[i - 1];
        gains[i] = Some(delta.max(0.0));
        losses[i] = Some((-delta).max(0.0));
    }

    let avg_gain = rolling_mean_opt(&gains, period);
    let avg_loss = rolling_mean_opt(&losses, period);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(gain, loss)| match (gain, loss) {
            (Some(gain), Some(loss)) => {
                if *loss == 0.0 {
                    if *gain == 0.0 {
                        // Flat window: 0/0 has no defined relative strength
                        None
                    } else {
                        Some(100.0)
                    }
                } else {
                    let rs = gain / loss;
                    Some(100.0 - 100.0 / (1.0 + rs))
                }
            }
            _ => None,
        })
        .collect()
}

/// MACD line, signal line, and histogram.
fn compute_macd(closes: &[f64]) -> (Vec<Option<f64>>, Vec<Option<f64>>, Vec<Option<f64>>) {
    let fast = ema(closes, MACD_FAST);
    let slow = ema(closes, MACD_SLOW);

    let macd_line: Vec<f64> = fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect();
    let signal_line = ema(&macd_line, MACD_SIGNAL);

    let macd = macd_line.iter().map(|&v| Some(v)).collect();
    let hist = macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| Some(m - s))
        .collect();
    let signal = signal_line.iter().map(|&v| Some(v)).collect();

    (macd, signal, hist)
}

/// ATR: rolling mean of true range. The first bar's true range is simply
/// high − low (no previous close exists).
fn compute_atr(series: &PriceSeries, period: usize) -> Vec<Option<f64>> {
    let bars = series.bars();
    let mut true_range = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let tr = if i == 0 {
            bar.high - bar.low
        } else {
            let prev_close = bars[i - 1].close;
            (bar.high - bar.low)
                .max((bar.high - prev_close).abs())
                .max((bar.low - prev_close).abs())
        };
        true_range.push(tr);
    }

    rolling_mean(&true_range, period)
}

/// Bollinger bands: SMA ± k × rolling sample standard deviation.
fn compute_bollinger(closes: &[f64]) -> (Vec<Option<f64>>, Vec<Option<f64>>, Vec<Option<f64>>) {
    let len = closes.len();
    let middle = rolling_mean(closes, BOLLINGER_WINDOW);
    let mut upper = vec![None; len];
    let mut lower = vec![None; len];

    for i in (BOLLINGER_WINDOW - 1)..len {
        let window = &closes[i + 1 - BOLLINGER_WINDOW..=i];
        let std = window.std_dev();
        if let Some(mid) = middle[i] {
            upper[i] = Some(mid + BOLLINGER_STD_DEV * std);
            lower[i] = Some(mid - BOLLINGER_STD_DEV * std);
        }
    }

    (upper, middle, lower)
}

// ============================================================================
// MACD analysis helpers
// ============================================================================

/// Check for a bullish MACD crossover (line crossing above signal) within
/// the last `lookback` bars. Returns how many bars ago it happened.
pub fn macd_crossover_within(set: &IndicatorSet, lookback: usize) -> Option<usize> {
    let len = set.macd.len();
    if len < 2 {
        return None;
    }

    let window = lookback.min(len - 1);
    for offset in 0..window {
        // Compare bar (len-1-offset) against the one before it
        let curr = len - 1 - offset;
        let prev = curr - 1;

        match (
            set.macd[prev],
            set.macd_signal[prev],
            set.macd[curr],
            set.macd_signal[curr],
        ) {
            (Some(pm), Some(ps), Some(cm), Some(cs)) => {
                if pm <= ps && cm > cs {
                    return Some(offset);
                }
            }
            _ => continue,
        }
    }

    None
}

/// Whether MACD is currently above its signal line.
pub fn is_macd_bullish(set: &IndicatorSet) -> bool {
    match (latest(&set.macd), latest(&set.macd_signal)) {
        (Some(macd), Some(signal)) => macd > signal,
        _ => false,
    }
}

/// Whether the MACD histogram expanded on the latest bar.
pub fn is_histogram_expanding(set: &IndicatorSet) -> bool {
    match (nth_back(&set.macd_hist, 0), nth_back(&set.macd_hist, 1)) {
        (Some(last), Some(prev)) => last > prev,
        _ => false,
    }
}

// ============================================================================
// Tests
// ============================================================================
