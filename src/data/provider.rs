//! Data provider abstraction for per-symbol market snapshots.
//!
//! Defines the `DataProvider` trait the screener fetches through. Network
//! transport, authentication, and provider-side rate limits live behind
//! implementations of this trait and are not modeled here.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;

use super::StockSnapshot;

// ============================================================================
// Provider Error
// ============================================================================

/// Errors a data provider can surface.
#[derive(Debug, Clone)]
pub enum ProviderError {
    /// Symbol unknown to the provider
    NotFound(String),
    /// Network error (connection failed, timeout)
    Network(String),
    /// Rate limit exceeded at the provider
    RateLimited { retry_after_secs: Option<u64> },
    /// Provider is temporarily unavailable
    Unavailable(String),
    /// Internal provider error
    Internal(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(symbol) => write!(f, "Symbol not found: {}", symbol),
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::RateLimited { retry_after_secs } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after_secs {
                    write!(f, ", retry after {} seconds", secs)?;
                }
                Ok(())
            }
            Self::Unavailable(msg) => write!(f, "Provider unavailable: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Check if the error is recoverable (worth retrying on a later scan).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::RateLimited { .. } | Self::Unavailable(_)
        )
    }
}

// ============================================================================
// Data Provider Trait
// ============================================================================

/// Trait for market data providers.
///
/// The screener only requires this logical contract: given a symbol,
/// return a snapshot with price history and quote metadata, or an error.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Provider name for logging (e.g., "static", "broker-api").
    fn name(&self) -> &'static str;

    /// Fetch the current snapshot for a symbol.
    async fn fetch(&self, symbol: &str) -> Result<StockSnapshot, ProviderError>;
}

// ============================================================================
// Static Provider
// ============================================================================

/// An in-memory provider backed by a fixed symbol map.
///
/// Useful for tests and offline runs against frozen data; repeated scans
/// over it are deterministic.
#[derive(Debug, Default)]
pub struct StaticProvider {
    snapshots: HashMap<String, StockSnapshot>,
}

impl StaticProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a snapshot, replacing any existing entry for the symbol.
    pub fn insert(&mut self, snapshot: StockSnapshot) {
        self.snapshots.insert(snapshot.symbol.clone(), snapshot);
    }

    /// Build from a list of snapshots.
    pub fn from_snapshots(snapshots: impl IntoIterator<Item = StockSnapshot>) -> Self {
        let mut provider = Self::new();
        for snapshot in snapshots {
            provider.insert(snapshot);
        }
        provider
    }

    /// Number of symbols held.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the provider holds no symbols.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[async_trait]
impl DataProvider for StaticProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self, symbol: &str) -> Result<StockSnapshot, ProviderError> {
        self.snapshots
            .get(symbol)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
