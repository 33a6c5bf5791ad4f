//! Scan orchestration.
//!
//! Drives a batch of symbols through fetch, filter, score, estimate, and
//! classify. Per-symbol work is independent, so the batch runs on a
//! bounded concurrent stream with a per-symbol fetch timeout and a scan
//! deadline; expiry returns whatever survived so far. Symbol failures
//! become [`Rejection`]s, never batch errors. The only batch-aborting
//! failure is an invalid configuration.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::config::{ScreenerConfig, TierConfig};
use crate::data::{shared_limiter, DataProvider, QuoteCache, SharedRateLimiter, StockSnapshot};
use crate::error::{Rejection, RejectionReason, ScreenError, ScreenResult};
use crate::indicators::{
    find_support_resistance, latest, volatility_percent, IndicatorSet, MIN_BARS,
};
use crate::screener::{
    adjusted_stop_loss, estimate_return, position_size, profit_loss, recommendation_text,
    risk_reward, stop_loss, target_price, validate_trade, ReturnEstimate, RiskProfile,
    ScanResult, ScoreVector, ScoringEngine, Tier, TradeCandidate,
};
use crate::watchlist::load_watchlist;

/// A symbol that survived filtering, scoring, and estimation.
#[derive(Debug, Clone)]
pub struct ScoredStock {
    pub snapshot: StockSnapshot,
    pub scores: ScoreVector,
    pub estimate: ReturnEstimate,
}

/// Batch screener over a data provider.
pub struct ScreenerEngine<P> {
    config: ScreenerConfig,
    provider: Arc<P>,
    cache: QuoteCache,
    limiter: SharedRateLimiter,
    scoring: ScoringEngine,
}

impl<P: DataProvider> ScreenerEngine<P> {
    pub fn new(config: ScreenerConfig, provider: Arc<P>) -> Self {
        let cache = QuoteCache::with_ttl(config.scan.cache_ttl_secs);
        let limiter = shared_limiter(provider.name(), config.scan.requests_per_minute);
        let scoring = ScoringEngine::new(config.weights.clone());
        Self {
            config,
            provider,
            cache,
            limiter,
            scoring,
        }
    }

    pub fn config(&self) -> &ScreenerConfig {
        &self.config
    }

    /// Scan the symbols listed in a watchlist file.
    pub async fn scan_watchlist(&self, path: &str) -> ScreenResult<ScanResult> {
        info!(path = %path, "scanning watchlist");
        let symbols = load_watchlist(path)?;
        self.scan(&symbols).await
    }

    /// Scan a batch of symbols and return a tiered shortlist.
    ///
    /// Never fails for "no good trades": an empty batch or a batch with
    /// zero survivors yields a Tier-3 result.
    pub async fn scan(&self, symbols: &[String]) -> ScreenResult<ScanResult> {
        self.config.validate().map_err(ScreenError::Config)?;

        let started = std::time::Instant::now();
        info!(symbols = symbols.len(), "starting scan");

        if symbols.is_empty() {
            warn!("no symbols to scan");
            return Ok(self.build_result(Tier::Tier3, Vec::new(), Vec::new(), 0, started));
        }

        let deadline = Instant::now() + Duration::from_secs(self.config.scan.deadline_secs);

        // Per-symbol pipelines are independent; run them on a bounded
        // concurrent stream, tagged with input position so ranking ties
        // can fall back to scan order
        let mut results = stream::iter(symbols.iter().cloned().enumerate())
            .map(|(position, symbol)| async move {
                let outcome = self.process_symbol(&symbol).await;
                (position, symbol, outcome)
            })
            .buffer_unordered(self.config.scan.max_concurrency);

        let mut survivors: Vec<(usize, ScoredStock)> = Vec::new();
        let mut rejections: Vec<Rejection> = Vec::new();
        let mut finished = vec![false; symbols.len()];

        loop {
            match timeout_at(deadline, results.next()).await {
                Ok(Some((position, symbol, outcome))) => {
                    finished[position] = true;
                    match outcome {
                        Ok(stock) => survivors.push((position, stock)),
                        Err(reason) => {
                            debug!(symbol = %symbol, reason = %reason, "symbol rejected");
                            rejections.push(Rejection::new(symbol, reason));
                        }
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        survivors = survivors.len(),
                        "scan deadline reached, returning partial results"
                    );
                    for (position, symbol) in symbols.iter().enumerate() {
                        if !finished[position] {
                            rejections
                                .push(Rejection::new(symbol, RejectionReason::DeadlineExceeded));
                        }
                    }
                    break;
                }
            }
        }
        drop(results);

        info!(
            survivors = survivors.len(),
            rejected = rejections.len(),
            "filtering and scoring complete"
        );

        // Restore scan order before ranking so stable sort preserves it
        survivors.sort_by_key(|(position, _)| *position);
        let survivors: Vec<ScoredStock> = survivors.into_iter().map(|(_, s)| s).collect();

        let (tier, ranked) = classify(survivors, &self.config.tiers);
        info!(tier = tier.number(), shortlist = ranked.len(), "tier selected");

        let mut candidates = Vec::with_capacity(ranked.len());
        for stock in ranked {
            let symbol = stock.snapshot.symbol.clone();
            match self.build_candidate(&stock) {
                Ok(candidate) => candidates.push(candidate),
                Err(reason) => {
                    debug!(symbol = %symbol, reason = %reason, "candidate dropped");
                    rejections.push(Rejection::new(symbol, reason));
                }
            }
        }

        let result = self.build_result(tier, candidates, rejections, symbols.len(), started);
        info!(
            tier = result.tier.number(),
            trades = result.candidates.len(),
            elapsed_ms = result.scan_time_ms,
            "scan complete"
        );
        Ok(result)
    }

    // ========================================================================
    // Per-symbol pipeline
    // ========================================================================

    async fn process_symbol(&self, symbol: &str) -> Result<ScoredStock, RejectionReason> {
        let snapshot = self.fetch(symbol).await?;
        let filters = &self.config.filters;

        if snapshot.current_price < filters.min_price || snapshot.current_price > filters.max_price
        {
            return Err(RejectionReason::PriceOutOfRange {
                price: snapshot.current_price,
                min: filters.min_price,
                max: filters.max_price,
            });
        }

        if snapshot.volume < filters.min_volume {
            return Err(RejectionReason::VolumeTooLow {
                volume: snapshot.volume,
                min: filters.min_volume,
            });
        }

        if snapshot.market_cap < filters.min_market_cap {
            return Err(RejectionReason::MarketCapTooSmall {
                market_cap: snapshot.market_cap,
                min: filters.min_market_cap,
            });
        }

        if snapshot.history.len() < MIN_BARS {
            return Err(RejectionReason::InsufficientHistory {
                bars: snapshot.history.len(),
                required: MIN_BARS,
            });
        }

        let indicators = IndicatorSet::compute(&snapshot.history);

        let volatility = volatility_percent(&snapshot.history, &indicators);
        if volatility < filters.min_volatility_pct {
            return Err(RejectionReason::VolatilityTooLow {
                volatility,
                min: filters.min_volatility_pct,
            });
        }

        // Downtrend guard
        if let Some(sma_50) = latest(&indicators.sma_50) {
            if snapshot.current_price < sma_50 {
                return Err(RejectionReason::Downtrend);
            }
        }

        let scores = self
            .scoring
            .score(&snapshot.history, &indicators, snapshot.current_price);
        let estimate = estimate_return(snapshot.current_price, &snapshot.history, &indicators);

        // Corrupt input (NaN prices) poisons the arithmetic silently;
        // catch it here so one bad symbol cannot reach the shortlist
        if !scores.overall.is_finite()
            || !estimate.percent.is_finite()
            || !estimate.confidence.is_finite()
        {
            return Err(RejectionReason::Computation(
                "non-finite score or estimate".to_string(),
            ));
        }

        debug!(
            symbol = %snapshot.symbol,
            overall = scores.overall,
            est_return = estimate.percent,
            confidence = estimate.confidence,
            "symbol scored"
        );

        Ok(ScoredStock {
            snapshot,
            scores,
            estimate,
        })
    }

    /// Read-through fetch: cache hit, else rate-limited provider call
    /// bounded by the per-symbol timeout.
    async fn fetch(&self, symbol: &str) -> Result<StockSnapshot, RejectionReason> {
        if let Some(cached) = self.cache.get(symbol) {
            debug!(symbol = %symbol, "cache hit");
            return Ok(cached);
        }

        self.limiter.acquire().await;

        let fetch_timeout = Duration::from_secs(self.config.scan.fetch_timeout_secs);
        let snapshot = match timeout(fetch_timeout, self.provider.fetch(symbol)).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(err)) => return Err(RejectionReason::DataUnavailable(err.to_string())),
            Err(_) => return Err(RejectionReason::FetchTimeout),
        };

        if snapshot.history.is_empty() {
            return Err(RejectionReason::DataUnavailable("empty history".to_string()));
        }

        self.cache.set(snapshot.clone());
        Ok(snapshot)
    }

    // ========================================================================
    // Materialization
    // ========================================================================

    fn build_candidate(&self, stock: &ScoredStock) -> Result<TradeCandidate, RejectionReason> {
        let risk_config = &self.config.risk;
        let entry = stock.snapshot.current_price;

        let target = target_price(entry, stock.estimate.percent);
        let mut stop = stop_loss(entry, risk_config.max_loss_pct);

        let support_levels = find_support_resistance(&stock.snapshot.history)
            .map(|levels| levels.support_levels)
            .unwrap_or_default();
        if !support_levels.is_empty() {
            stop = adjusted_stop_loss(entry, &support_levels, risk_config.max_loss_pct);
        }

        validate_trade(
            entry,
            target,
            stop,
            risk_config.min_risk_reward,
            risk_config.max_loss_pct,
        )
        .map_err(RejectionReason::RiskRejected)?;

        let (shares, position_value) = position_size(entry, risk_config.capital_per_trade);
        if shares == 0 {
            return Err(RejectionReason::SharesZero);
        }

        let (target_profit, max_loss) = profit_loss(entry, target, stop, shares);
        let risk_reward_ratio = risk_reward(entry, target, stop);

        let entry_strategy = format!(
            "Best: Market open or pullback to ${:.2}-${:.2}. Avoid chasing above ${:.2}",
            entry * 0.99,
            entry,
            entry * 1.03
        );

        Ok(TradeCandidate {
            symbol: stock.snapshot.symbol.clone(),
            name: stock.snapshot.name.clone(),
            sector: stock.snapshot.sector.clone(),
            current_price: entry,
            entry_price: entry,
            scores: stock.scores,
            estimate: stock.estimate,
            risk: RiskProfile {
                stop_price: stop,
                target_price: target,
                shares,
                position_value,
                target_profit,
                max_loss,
                risk_reward_ratio,
            },
            entry_strategy,
            support_levels: support_levels.into_iter().take(3).collect(),
        })
    }

    fn build_result(
        &self,
        tier: Tier,
        candidates: Vec<TradeCandidate>,
        rejections: Vec<Rejection>,
        symbols_scanned: usize,
        started: std::time::Instant,
    ) -> ScanResult {
        let recommendation = recommendation_text(tier, candidates.len());
        ScanResult {
            tier,
            mode: tier.mode().to_string(),
            risk_level: tier.risk_level(),
            recommendation,
            candidates,
            rejections,
            symbols_scanned,
            scan_time_ms: started.elapsed().as_millis() as u64,
            scan_date: Utc::now().date_naive(),
        }
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Partition survivors into tiers and pick the shortlist.
///
/// Tier-1 wins when it has enough members, then Tier-2; otherwise the
/// scan reports Tier-3 with an empty list. Sorting by overall score is
/// stable, so ties keep scan order.
fn classify(survivors: Vec<ScoredStock>, tiers: &TierConfig) -> (Tier, Vec<ScoredStock>) {
    let mut tier_1: Vec<ScoredStock> = Vec::new();
    let mut tier_2: Vec<ScoredStock> = Vec::new();

    for stock in survivors {
        let percent = stock.estimate.percent;
        let confidence = stock.estimate.confidence;

        if percent >= tiers.tier1_min_return && confidence >= tiers.tier1_min_confidence {
            tier_1.push(stock);
        } else if percent >= tiers.tier2_min_return
            && percent < tiers.tier1_min_return
            && confidence >= tiers.tier2_min_confidence
        {
            tier_2.push(stock);
        }
    }

    let by_score_desc = |a: &ScoredStock, b: &ScoredStock| {
        b.scores
            .overall
            .partial_cmp(&a.scores.overall)
            .unwrap_or(std::cmp::Ordering::Equal)
    };
    tier_1.sort_by(by_score_desc);
    tier_2.sort_by(by_score_desc);

    if tier_1.len() >= tiers.min_tier_size {
        tier_1.truncate(tiers.max_candidates);
        (Tier::Tier1, tier_1)
    } else if tier_2.len() >= tiers.min_tier_size {
        tier_2.truncate(tiers.max_candidates);
        (Tier::Tier2, tier_2)
    } else {
        (Tier::Tier3, Vec::new())
    }
}
