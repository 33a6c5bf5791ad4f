//! Quote cache for per-symbol snapshots.
//!
//! Provides in-memory caching with TTL so repeated scans within the expiry
//! window reuse fetched data instead of hitting the provider again. One
//! entry per symbol key, last-writer-wins; safe for concurrent get/set.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use super::StockSnapshot;

/// Cache entry with TTL
#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: StockSnapshot,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(snapshot: StockSnapshot, ttl_secs: i64) -> Self {
        Self {
            snapshot,
            expires_at: Utc::now() + Duration::seconds(ttl_secs),
        }
    }

    fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// TTL cache of per-symbol snapshots.
pub struct QuoteCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// TTL in seconds for cached snapshots
    ttl_secs: i64,
}

/// Default snapshot TTL: 4 hours.
const DEFAULT_TTL_SECS: i64 = 4 * 60 * 60;

impl QuoteCache {
    /// Create a cache with the default 4-hour TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL_SECS)
    }

    /// Create a cache with a custom TTL.
    pub fn with_ttl(ttl_secs: i64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl_secs,
        }
    }

    /// Get a cached snapshot if present and not expired.
    pub fn get(&self, symbol: &str) -> Option<StockSnapshot> {
        let entries = self.entries.read().ok()?;
        entries.get(symbol).and_then(|entry| {
            if entry.is_expired() {
                None
            } else {
                Some(entry.snapshot.clone())
            }
        })
    }

    /// Cache a snapshot under its symbol, replacing any existing entry.
    pub fn set(&self, snapshot: StockSnapshot) {
        let key = snapshot.symbol.clone();
        let entry = CacheEntry::new(snapshot, self.ttl_secs);

        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, entry);
        }
    }

    /// Remove a symbol's entry.
    pub fn invalidate(&self, symbol: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(symbol);
        }
    }

    /// Drop all expired entries.
    pub fn clear_expired(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, entry| !entry.is_expired());
        }
    }

    /// Drop everything.
    pub fn clear_all(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read().ok();
        let (total, expired) = entries
            .map(|e| {
                let total = e.len();
                let expired = e.values().filter(|entry| entry.is_expired()).count();
                (total, expired)
            })
            .unwrap_or((0, 0));

        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
        }
    }
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PriceSeries;

    fn make_snapshot(symbol: &str) -> StockSnapshot {
        StockSnapshot {
            symbol: symbol.to_string(),
            name: format!("Test {}", symbol),
            sector: "Energy".to_string(),
            current_price: 42.0,
            volume: 600_000.0,
            avg_volume: 550_000.0,
            market_cap: 2e9,
            history: PriceSeries::new(vec![]).unwrap(),
        }
    }

    #[test]
    fn test_cache_set_get() {
        let cache = QuoteCache::new();
        cache.set(make_snapshot("AAPL"));

        let cached = cache.get("AAPL");
        assert!(cached.is_some());
        assert_eq!(cached.unwrap().symbol, "AAPL");
    }

    #[test]
    fn test_cache_miss() {
        let cache = QuoteCache::new();
        assert!(cache.get("AAPL").is_none());
    }

    #[test]
    fn test_cache_expiry() {
        let cache = QuoteCache::with_ttl(-1); // already expired
        cache.set(make_snapshot("AAPL"));
        assert!(cache.get("AAPL").is_none());
    }

    #[test]
    fn test_cache_invalidate() {
        let cache = QuoteCache::new();
        cache.set(make_snapshot("AAPL"));
        cache.invalidate("AAPL");
        assert!(cache.get("AAPL").is_none());
    }

    #[test]
    fn test_cache_last_writer_wins() {
        let cache = QuoteCache::new();
        cache.set(make_snapshot("AAPL"));

        let mut updated = make_snapshot("AAPL");
        updated.current_price = 50.0;
        cache.set(updated);

        assert_eq!(cache.get("AAPL").unwrap().current_price, 50.0);
    }

    #[test]
    fn test_cache_stats() {
        let cache = QuoteCache::new();
        cache.set(make_snapshot("AAPL"));
        cache.set(make_snapshot("MSFT"));

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.active_entries, 2);
    }

    #[test]
    fn test_cache_clear_expired() {
        let cache = QuoteCache::with_ttl(-1);
        cache.set(make_snapshot("AAPL"));
        cache.clear_expired();
        assert_eq!(cache.stats().total_entries, 0);
    }
}
