//! Adaptive stock screener.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    ScreenerEngine                       │
//! │                                                         │
//! │  fetch ──► filter ──► score ──► estimate ──► classify   │
//! │    │         │          │          │            │       │
//! │    ▼         ▼          ▼          ▼            ▼       │
//! │  cache    price/vol  Indicator  Return       tiered     │
//! │  + rate   /mcap/vol  Set +      Estimate     shortlist  │
//! │  limiter  atility    ScoreVec                (≤5)       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every stage consumes and returns typed values; a symbol that fails a
//! stage becomes a [`Rejection`](crate::error::Rejection) and the batch
//! continues. "No good trades" is a successful Tier-3 result, never an
//! error.

mod engine;
mod estimator;
mod risk;
mod scoring;

pub use engine::{ScoredStock, ScreenerEngine};
pub use estimator::{estimate_return, ReturnEstimate};
pub use risk::{
    adjusted_stop_loss, position_size, profit_loss, risk_reward, stop_loss, target_price,
    validate_trade, RiskProfile,
};
pub use scoring::{ScoringEngine, ScoreVector};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Rejection;

// ============================================================================
// Classification
// ============================================================================

/// Conviction bucket assigned to a scan's shortlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// High-conviction setups (15%+ estimated return, strong agreement).
    Tier1,
    /// Moderate setups (8-14% estimated return).
    Tier2,
    /// Nothing qualified; hold cash.
    Tier3,
}

impl Tier {
    pub fn number(&self) -> u8 {
        match self {
            Tier::Tier1 => 1,
            Tier::Tier2 => 2,
            Tier::Tier3 => 3,
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        match self {
            Tier::Tier1 => RiskLevel::High,
            Tier::Tier2 => RiskLevel::Medium,
            Tier::Tier3 => RiskLevel::Low,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Tier::Tier1 => "AGGRESSIVE OPPORTUNITIES",
            Tier::Tier2 => "MODERATE OPPORTUNITIES",
            Tier::Tier3 => "WEAK MARKET CONDITIONS",
        }
    }
}

/// Risk posture implied by the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

// ============================================================================
// Scan output
// ============================================================================

/// Fully-materialized trade idea for one symbol.
///
/// Immutable snapshot of a single scan; never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeCandidate {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub current_price: f64,
    pub entry_price: f64,
    pub scores: ScoreVector,
    pub estimate: ReturnEstimate,
    pub risk: RiskProfile,
    /// Suggested entry band and chase ceiling, human-readable.
    pub entry_strategy: String,
    /// Up to three nearest support levels below the entry, nearest first.
    pub support_levels: Vec<f64>,
}

/// Result of one scan invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub tier: Tier,
    pub mode: String,
    pub risk_level: RiskLevel,
    pub recommendation: String,
    /// Ranked shortlist, best overall score first. At most five entries.
    pub candidates: Vec<TradeCandidate>,
    /// Per-symbol rejections, for diagnostics.
    pub rejections: Vec<Rejection>,
    pub symbols_scanned: usize,
    pub scan_time_ms: u64,
    pub scan_date: NaiveDate,
}

impl ScanResult {
    /// Whether any candidates qualified.
    pub fn has_trades(&self) -> bool {
        !self.candidates.is_empty()
    }
}

pub(crate) fn recommendation_text(tier: Tier, trade_count: usize) -> String {
    match tier {
        Tier::Tier1 => format!(
            "{} high-confidence trades with 15%+ potential found. Trade now.",
            trade_count
        ),
        Tier::Tier2 => format!(
            "{} moderate trades with 8-14% potential. Consider smaller positions or wait for better setups.",
            trade_count
        ),
        Tier::Tier3 => {
            "No stocks meet 8%+ return criteria. Hold cash and wait for better opportunities."
                .to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_numbers_and_risk() {
        assert_eq!(Tier::Tier1.number(), 1);
        assert_eq!(Tier::Tier3.number(), 3);
        assert_eq!(Tier::Tier1.risk_level(), RiskLevel::High);
        assert_eq!(Tier::Tier2.risk_level(), RiskLevel::Medium);
        assert_eq!(Tier::Tier3.risk_level(), RiskLevel::Low);
    }

    #[test]
    fn test_recommendation_text() {
        assert!(recommendation_text(Tier::Tier1, 3).starts_with("3 high-confidence"));
        assert!(recommendation_text(Tier::Tier3, 0).contains("Hold cash"));
    }

    #[test]
    fn test_tier_serde() {
        let json = serde_json::to_string(&Tier::Tier1).unwrap();
        assert_eq!(json, "\"tier1\"");
        let back: Tier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Tier::Tier1);
    }
}
