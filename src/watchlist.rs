//! Watchlist file loading.
//!
//! Watchlists are plain text files of symbols separated by commas and/or
//! newlines. A missing file is not fatal; it yields an empty list with a
//! warning, and the scan over it produces a well-formed empty result.

use std::path::Path;
use tracing::warn;

use crate::error::{ScreenError, ScreenResult};

/// Load symbols from a watchlist file.
///
/// Symbols may be separated by commas, newlines, or both; surrounding
/// whitespace is trimmed and empty entries are dropped.
pub fn load_watchlist(path: impl AsRef<Path>) -> ScreenResult<Vec<String>> {
    let path = path.as_ref();

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Watchlist file not found");
            return Ok(Vec::new());
        }
        Err(e) => return Err(ScreenError::Io(e)),
    };

    Ok(parse_watchlist(&content))
}

/// Parse watchlist content into a symbol list.
fn parse_watchlist(content: &str) -> Vec<String> {
    content
        .split(|c| c == ',' || c == '\n' || c == '\r')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
