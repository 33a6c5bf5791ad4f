//! Trade risk parameters.
//!
//! Pure arithmetic over entry, target, and stop prices. No shared state;
//! the engine composes these into a [`RiskProfile`] per candidate.

use serde::{Deserialize, Serialize};

/// Stop is allowed to sit at most 20% past the configured max loss before
/// the trade is rejected.
const STOP_SLACK: f64 = 1.2;

/// Position and P&L parameters for one trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub stop_price: f64,
    pub target_price: f64,
    pub shares: u64,
    pub position_value: f64,
    pub target_profit: f64,
    pub max_loss: f64,
    pub risk_reward_ratio: f64,
}

/// Fixed-percentage stop below the entry.
pub fn stop_loss(entry: f64, max_loss_pct: f64) -> f64 {
    entry * (1.0 - max_loss_pct / 100.0)
}

/// Target price implied by an estimated return percentage.
pub fn target_price(entry: f64, return_pct: f64) -> f64 {
    entry * (1.0 + return_pct / 100.0)
}

/// Whole shares affordable with the given capital, plus the resulting
/// position value. `(0, 0.0)` when the entry price is not positive.
pub fn position_size(entry: f64, capital: f64) -> (u64, f64) {
    if entry <= 0.0 {
        return (0, 0.0);
    }
    let shares = (capital / entry).floor() as u64;
    (shares, shares as f64 * entry)
}

/// Reward-to-risk ratio; 0 when the stop does not sit below the entry.
pub fn risk_reward(entry: f64, target: f64, stop: f64) -> f64 {
    let risk = entry - stop;
    if risk <= 0.0 {
        return 0.0;
    }
    (target - entry) / risk
}

/// Dollar profit at target and dollar loss at stop for a share count.
pub fn profit_loss(entry: f64, target: f64, stop: f64, shares: u64) -> (f64, f64) {
    let shares = shares as f64;
    ((target - entry) * shares, (entry - stop) * shares)
}

/// Stop placement informed by support: just below the nearest support
/// level when one exists, but never wider than the default stop.
pub fn adjusted_stop_loss(entry: f64, support_levels: &[f64], max_loss_pct: f64) -> f64 {
    let default_stop = stop_loss(entry, max_loss_pct);

    let nearest_below = support_levels.iter().copied().find(|&s| s < entry);
    match nearest_below {
        Some(support) => default_stop.max(support * 0.99),
        None => default_stop,
    }
}

/// Gate a trade on reward-to-risk and stop width.
///
/// Fails when the ratio is under `min_risk_reward` or the stop sits more
/// than `max_loss_pct × 1.2` below the entry.
pub fn validate_trade(
    entry: f64,
    target: f64,
    stop: f64,
    min_risk_reward: f64,
    max_loss_pct: f64,
) -> Result<(), String> {
    let ratio = risk_reward(entry, target, stop);
    if ratio < min_risk_reward {
        return Err(format!(
            "risk/reward {:.2} below minimum {:.2}",
            ratio, min_risk_reward
        ));
    }

    if entry > 0.0 {
        let stop_pct = (entry - stop) / entry * 100.0;
        if stop_pct > max_loss_pct * STOP_SLACK {
            return Err(format!(
                "stop width {:.1}% exceeds limit {:.1}%",
                stop_pct,
                max_loss_pct * STOP_SLACK
            ));
        }
    }

    Ok(())
}
