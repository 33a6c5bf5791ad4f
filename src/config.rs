//! Screener configuration.
//!
//! All thresholds, weights, and scan parameters live here, loaded before a
//! scan and injected into the engine. Defaults mirror a conservative
//! small-account swing setup: $1,000 per trade, 10% max loss, 1.5 minimum
//! risk/reward, and 15%/8% tier return targets.

use serde::{Deserialize, Serialize};

// ============================================================================
// Main Screener Configuration
// ============================================================================

/// Configuration for a screening pipeline instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenerConfig {
    /// Pre-filter floors and ceilings
    #[serde(default)]
    pub filters: FilterConfig,

    /// Composite score weights
    #[serde(default)]
    pub weights: ScoringWeights,

    /// Tier classification thresholds
    #[serde(default)]
    pub tiers: TierConfig,

    /// Position sizing and risk bounds
    #[serde(default)]
    pub risk: RiskConfig,

    /// Batch execution parameters
    #[serde(default)]
    pub scan: ScanConfig,
}

impl ScreenerConfig {
    /// Validate cross-field invariants.
    ///
    /// Called at the start of every scan; an invalid configuration is the
    /// one failure that aborts the whole batch.
    pub fn validate(&self) -> Result<(), String> {
        let weight_sum = self.weights.sum();
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(format!("scoring weights must sum to 1.0, got {}", weight_sum));
        }

        if self.filters.min_price >= self.filters.max_price {
            return Err(format!(
                "min_price {} must be below max_price {}",
                self.filters.min_price, self.filters.max_price
            ));
        }

        if self.risk.capital_per_trade <= 0.0 {
            return Err("capital_per_trade must be positive".to_string());
        }

        if self.risk.max_loss_pct <= 0.0 || self.risk.max_loss_pct >= 100.0 {
            return Err(format!(
                "max_loss_pct {} must be in (0, 100)",
                self.risk.max_loss_pct
            ));
        }

        if self.tiers.tier2_min_return > self.tiers.tier1_min_return {
            return Err("tier2_min_return must not exceed tier1_min_return".to_string());
        }

        if self.scan.max_concurrency == 0 {
            return Err("max_concurrency must be at least 1".to_string());
        }

        Ok(())
    }
}

// ============================================================================
// Filter Configuration
// ============================================================================

/// Pre-filter configuration applied right after fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Minimum share price
    #[serde(default = "default_min_price")]
    pub min_price: f64,

    /// Maximum share price
    #[serde(default = "default_max_price")]
    pub max_price: f64,

    /// Minimum daily volume (shares)
    #[serde(default = "default_min_volume")]
    pub min_volume: f64,

    /// Minimum market cap
    #[serde(default = "default_min_market_cap")]
    pub min_market_cap: f64,

    /// Minimum ATR-derived daily volatility (%)
    #[serde(default = "default_min_volatility")]
    pub min_volatility_pct: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_price: default_min_price(),
            max_price: default_max_price(),
            min_volume: default_min_volume(),
            min_market_cap: default_min_market_cap(),
            min_volatility_pct: default_min_volatility(),
        }
    }
}

fn default_min_price() -> f64 {
    5.0
}

fn default_max_price() -> f64 {
    500.0
}

fn default_min_volume() -> f64 {
    500_000.0
}

fn default_min_market_cap() -> f64 {
    500_000_000.0
}

fn default_min_volatility() -> f64 {
    3.0
}

// ============================================================================
// Scoring Weights
// ============================================================================

/// Weights for the composite score. Must sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(default = "default_macd_weight")]
    pub macd: f64,
    #[serde(default = "default_rsi_weight")]
    pub rsi: f64,
    #[serde(default = "default_volume_weight")]
    pub volume: f64,
    #[serde(default = "default_breakout_weight")]
    pub breakout: f64,
    #[serde(default = "default_momentum_weight")]
    pub momentum: f64,
}

impl ScoringWeights {
    /// Sum of all weights.
    pub fn sum(&self) -> f64 {
        self.macd + self.rsi + self.volume + self.breakout + self.momentum
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            macd: default_macd_weight(),
            rsi: default_rsi_weight(),
            volume: default_volume_weight(),
            breakout: default_breakout_weight(),
            momentum: default_momentum_weight(),
        }
    }
}

fn default_macd_weight() -> f64 {
    0.25
}

fn default_rsi_weight() -> f64 {
    0.20
}

fn default_volume_weight() -> f64 {
    0.20
}

fn default_breakout_weight() -> f64 {
    0.20
}

fn default_momentum_weight() -> f64 {
    0.15
}

// ============================================================================
// Tier Configuration
// ============================================================================

/// Tier classification thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    /// Minimum estimated return (%) for Tier-1
    #[serde(default = "default_tier1_return")]
    pub tier1_min_return: f64,

    /// Minimum confidence for Tier-1
    #[serde(default = "default_tier1_confidence")]
    pub tier1_min_confidence: f64,

    /// Minimum estimated return (%) for Tier-2
    #[serde(default = "default_tier2_return")]
    pub tier2_min_return: f64,

    /// Minimum confidence for Tier-2
    #[serde(default = "default_tier2_confidence")]
    pub tier2_min_confidence: f64,

    /// How many tier members are required before the tier is selected
    #[serde(default = "default_min_tier_size")]
    pub min_tier_size: usize,

    /// How many top candidates to keep from the selected tier
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            tier1_min_return: default_tier1_return(),
            tier1_min_confidence: default_tier1_confidence(),
            tier2_min_return: default_tier2_return(),
            tier2_min_confidence: default_tier2_confidence(),
            min_tier_size: default_min_tier_size(),
            max_candidates: default_max_candidates(),
        }
    }
}

fn default_tier1_return() -> f64 {
    15.0
}

fn default_tier1_confidence() -> f64 {
    75.0
}

fn default_tier2_return() -> f64 {
    8.0
}

fn default_tier2_confidence() -> f64 {
    60.0
}

fn default_min_tier_size() -> usize {
    3
}

fn default_max_candidates() -> usize {
    5
}

// ============================================================================
// Risk Configuration
// ============================================================================

/// Position sizing and risk validation bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Capital allocated per trade
    #[serde(default = "default_capital_per_trade")]
    pub capital_per_trade: f64,

    /// Maximum loss per trade (%) used for the default stop
    #[serde(default = "default_max_loss_pct")]
    pub max_loss_pct: f64,

    /// Minimum acceptable risk/reward ratio
    #[serde(default = "default_min_risk_reward")]
    pub min_risk_reward: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            capital_per_trade: default_capital_per_trade(),
            max_loss_pct: default_max_loss_pct(),
            min_risk_reward: default_min_risk_reward(),
        }
    }
}

fn default_capital_per_trade() -> f64 {
    1000.0
}

fn default_max_loss_pct() -> f64 {
    10.0
}

fn default_min_risk_reward() -> f64 {
    1.5
}

// ============================================================================
// Scan Configuration
// ============================================================================

/// Batch execution parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Maximum symbol pipelines in flight at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-symbol fetch timeout in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Whole-scan deadline in seconds; on expiry, partial results are kept
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,

    /// Snapshot cache TTL in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: i64,

    /// Provider request budget per minute
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            deadline_secs: default_deadline_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

fn default_max_concurrency() -> usize {
    8
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_deadline_secs() -> u64 {
    300
}

fn default_cache_ttl_secs() -> i64 {
    4 * 60 * 60
}

fn default_requests_per_minute() -> u32 {
    120
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = ScreenerConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.weights.sum() - 1.0).abs() < 1e-9);
        assert_eq!(config.tiers.max_candidates, 5);
    }

    #[test]
    fn test_bad_weights_rejected() {
        let mut config = ScreenerConfig::default();
        config.weights.macd = 0.5; // sum now 1.25
        let err = config.validate().unwrap_err();
        assert!(err.contains("sum to 1.0"));
    }

    #[test]
    fn test_inverted_price_band_rejected() {
        let mut config = ScreenerConfig::default();
        config.filters.min_price = 600.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_max_loss_rejected() {
        let mut config = ScreenerConfig::default();
        config.risk.max_loss_pct = 0.0;
        assert!(config.validate().is_err());

        config.risk.max_loss_pct = 100.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = ScreenerConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("filters"));
        assert!(json.contains("weights"));

        let parsed: ScreenerConfig = serde_json::from_str(&json).unwrap();
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{ "filters": { "min_price": 10.0 } }"#;
        let parsed: ScreenerConfig = serde_json::from_str(json).unwrap();
        assert!((parsed.filters.min_price - 10.0).abs() < 1e-9);
        assert!((parsed.filters.max_price - 500.0).abs() < 1e-9);
        assert!((parsed.risk.capital_per_trade - 1000.0).abs() < 1e-9);
    }
}
