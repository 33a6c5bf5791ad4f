//! End-to-end pipeline tests.
//!
//! Exercises the full scan over synthetic price data: fetch through a
//! static provider, filtering, scoring, return estimation, tiering, and
//! candidate materialization.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use swingscan::config::ScreenerConfig;
use swingscan::data::{Bar, DataProvider, PriceSeries, ProviderError, StaticProvider, StockSnapshot};
use swingscan::error::RejectionReason;
use swingscan::screener::{ScreenerEngine, Tier};

// ============================================================================
// Fixtures
// ============================================================================

fn bars(closes: &[f64], volume: f64) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let bars: Vec<Bar> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: start + chrono::Duration::days(i as i64),
            open: close - 0.3,
            high: close * 1.025,
            low: close * 0.975,
            close,
            volume,
        })
        .collect();
    PriceSeries::new(bars).unwrap()
}

/// A liquid stock grinding upward in a wide-range zigzag with a volume
/// ramp into the final week. The intraday spread keeps the historical
/// range signal high while the zigzag holds RSI inside the sweet spot,
/// so the estimate clears the Tier-1 return and confidence thresholds.
fn strong_stock(symbol: &str) -> StockSnapshot {
    let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let mut close = 100.0;
    let bars: Vec<Bar> = (0..60)
        .map(|i| {
            if i > 0 {
                close *= if i % 2 == 0 { 1.03 } else { 0.982 };
            }
            let mut volume = 1_000_000.0 * (1.0 + 0.02 * i as f64);
            if i >= 55 {
                volume *= 1.6 + 0.1 * (i - 55) as f64;
            }
            Bar {
                date: start + chrono::Duration::days(i as i64),
                open: close * 0.995,
                high: close * 1.15,
                low: close * 0.85,
                close,
                volume,
            }
        })
        .collect();
    let history = PriceSeries::new(bars).unwrap();
    let last = history.last().unwrap();
    let current_price = last.close;
    let volume = last.volume;

    StockSnapshot {
        symbol: symbol.to_string(),
        name: format!("{} Corp", symbol),
        sector: "Technology".to_string(),
        current_price,
        volume,
        avg_volume: 2_000_000.0,
        market_cap: 8e9,
        history,
    }
}

/// A stock drifting below its 50-day average.
fn downtrend_stock(symbol: &str) -> StockSnapshot {
    let closes: Vec<f64> = (0..60).map(|i| 150.0 - i as f64 * 0.6).collect();
    let history = bars(&closes, 2_000_000.0);
    let current_price = history.last().unwrap().close;

    StockSnapshot {
        symbol: symbol.to_string(),
        name: format!("{} Corp", symbol),
        sector: "Industrials".to_string(),
        current_price,
        volume: 2_500_000.0,
        avg_volume: 2_400_000.0,
        market_cap: 3e9,
        history,
    }
}

fn thin_history_stock(symbol: &str) -> StockSnapshot {
    let closes: Vec<f64> = (0..20).map(|i| 40.0 + i as f64 * 0.2).collect();
    let history = bars(&closes, 1_000_000.0);
    let current_price = history.last().unwrap().close;

    StockSnapshot {
        symbol: symbol.to_string(),
        name: format!("{} Corp", symbol),
        sector: "Energy".to_string(),
        current_price,
        volume: 1_200_000.0,
        avg_volume: 1_100_000.0,
        market_cap: 1e9,
        history,
    }
}

fn symbols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Filtering
// ============================================================================

#[tokio::test]
async fn rejects_downtrend_and_thin_history() {
    let provider = StaticProvider::from_snapshots([
        downtrend_stock("DOWN"),
        thin_history_stock("THIN"),
    ]);
    let engine = ScreenerEngine::new(ScreenerConfig::default(), Arc::new(provider));

    let result = engine.scan(&symbols(&["DOWN", "THIN"])).await.unwrap();

    assert_eq!(result.tier, Tier::Tier3);
    assert_eq!(result.rejections.len(), 2);

    let reason_for = |symbol: &str| {
        result
            .rejections
            .iter()
            .find(|r| r.symbol == symbol)
            .map(|r| r.reason.clone())
            .unwrap()
    };
    assert_eq!(reason_for("DOWN"), RejectionReason::Downtrend);
    assert!(matches!(
        reason_for("THIN"),
        RejectionReason::InsufficientHistory { bars: 20, .. }
    ));
}

#[tokio::test]
async fn low_volume_stock_is_rejected() {
    let mut snapshot = strong_stock("QUIET");
    snapshot.volume = 100_000.0;
    let provider = StaticProvider::from_snapshots([snapshot]);
    let engine = ScreenerEngine::new(ScreenerConfig::default(), Arc::new(provider));

    let result = engine.scan(&symbols(&["QUIET"])).await.unwrap();
    assert!(matches!(
        result.rejections[0].reason,
        RejectionReason::VolumeTooLow { .. }
    ));
}

// ============================================================================
// Full scan
// ============================================================================

#[tokio::test]
async fn strong_batch_produces_ranked_candidates() {
    let provider = StaticProvider::from_snapshots([
        strong_stock("AAA"),
        strong_stock("BBB"),
        strong_stock("CCC"),
        strong_stock("DDD"),
        downtrend_stock("DOWN"),
    ]);
    let engine = ScreenerEngine::new(ScreenerConfig::default(), Arc::new(provider));

    let result = engine
        .scan(&symbols(&["AAA", "BBB", "CCC", "DDD", "DOWN"]))
        .await
        .unwrap();

    assert_eq!(result.symbols_scanned, 5);
    assert_eq!(result.rejections.len(), 1);

    assert_eq!(result.tier, Tier::Tier1);
    assert!(result.has_trades());
    assert_eq!(result.candidates.len(), 4);

    // Ranking is by overall score descending
    for pair in result.candidates.windows(2) {
        assert!(pair[0].scores.overall >= pair[1].scores.overall);
    }
    for candidate in &result.candidates {
        assert!(candidate.estimate.percent >= 15.0);
        assert!(candidate.estimate.confidence >= 75.0);

        let risk = &candidate.risk;
        assert!(risk.shares > 0);
        assert!(risk.target_price > candidate.entry_price);
        assert!(risk.stop_price < candidate.entry_price);
        assert!(risk.risk_reward_ratio >= 1.5);
        assert!(risk.position_value <= 1000.0 + 1e-9);
        assert!(candidate.support_levels.len() <= 3);
        assert!(candidate.entry_strategy.contains("pullback"));
    }
}

async fn scan_candidates_json(snapshots: Vec<StockSnapshot>, names: &[String]) -> String {
    let provider = StaticProvider::from_snapshots(snapshots);
    let engine = ScreenerEngine::new(ScreenerConfig::default(), Arc::new(provider));
    let result = engine.scan(names).await.unwrap();
    serde_json::to_string(&result.candidates).unwrap()
}

#[tokio::test]
async fn scan_is_idempotent_on_frozen_data() {
    let snapshots = [
        strong_stock("AAA"),
        strong_stock("BBB"),
        strong_stock("CCC"),
    ];
    let names = symbols(&["AAA", "BBB", "CCC"]);

    let first = scan_candidates_json(snapshots.to_vec(), &names).await;
    let second = scan_candidates_json(snapshots.to_vec(), &names).await;

    assert_ne!(first, "[]", "frozen batch should materialize candidates");
    assert_eq!(first, second);
}

#[tokio::test]
async fn cache_serves_repeat_scans() {
    let provider = StaticProvider::from_snapshots([strong_stock("AAA")]);
    let engine = ScreenerEngine::new(ScreenerConfig::default(), Arc::new(provider));
    let names = symbols(&["AAA"]);

    let first = engine.scan(&names).await.unwrap();
    let second = engine.scan(&names).await.unwrap();

    assert_eq!(first.symbols_scanned, second.symbols_scanned);
    assert_eq!(first.candidates.len(), second.candidates.len());
}

// ============================================================================
// Fetch resilience
// ============================================================================

/// Provider that never answers within any reasonable timeout.
struct StalledProvider;

#[async_trait]
impl DataProvider for StalledProvider {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn fetch(&self, _symbol: &str) -> Result<StockSnapshot, ProviderError> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Err(ProviderError::Unavailable("stalled".to_string()))
    }
}

#[tokio::test]
async fn stalled_fetch_times_out_per_symbol() {
    let mut config = ScreenerConfig::default();
    config.scan.fetch_timeout_secs = 1;

    let engine = ScreenerEngine::new(config, Arc::new(StalledProvider));

    // Virtual time lets the 1s fetch timeout fire immediately
    tokio::time::pause();
    let result = engine.scan(&symbols(&["SLOW"])).await.unwrap();

    assert_eq!(result.tier, Tier::Tier3);
    assert_eq!(result.rejections[0].reason, RejectionReason::FetchTimeout);
}

#[tokio::test]
async fn deadline_expiry_rejects_unfinished_symbols() {
    let mut config = ScreenerConfig::default();
    // Deadline is shorter than the per-symbol fetch timeout, so the scan
    // gives up while every fetch is still in flight
    config.scan.deadline_secs = 1;

    let engine = ScreenerEngine::new(config, Arc::new(StalledProvider));

    tokio::time::pause();
    let result = engine
        .scan(&symbols(&["ONE", "TWO", "THREE"]))
        .await
        .unwrap();

    assert_eq!(result.tier, Tier::Tier3);
    assert_eq!(result.rejections.len(), 3);
    for rejection in &result.rejections {
        assert_eq!(rejection.reason, RejectionReason::DeadlineExceeded);
    }
}

#[tokio::test]
async fn failing_provider_yields_tier_3_not_error() {
    struct FailingProvider;

    #[async_trait]
    impl DataProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch(&self, symbol: &str) -> Result<StockSnapshot, ProviderError> {
            Err(ProviderError::NotFound(symbol.to_string()))
        }
    }

    let engine = ScreenerEngine::new(ScreenerConfig::default(), Arc::new(FailingProvider));
    let result = engine.scan(&symbols(&["AAA", "BBB"])).await.unwrap();

    assert_eq!(result.tier, Tier::Tier3);
    assert_eq!(result.rejections.len(), 2);
    assert!(result.recommendation.contains("Hold cash"));
}
