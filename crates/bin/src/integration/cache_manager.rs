//! Location of the raw document cache.

use regiocast_data::DataError;
use regiocast_data::cache::SqliteCache;
use std::path::PathBuf;

/// Platform cache directory for Regiocast.
///
/// - Linux: `~/.cache/regiocast/`
/// - macOS: `~/Library/Caches/regiocast/`
/// - Windows: `%LOCALAPPDATA%\regiocast\`
pub(crate) fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("regiocast")
}

/// Cache database path.
pub(crate) fn cache_path() -> PathBuf {
    default_cache_dir().join("documents.db")
}

/// Open the cache, creating the directory if needed.
pub(crate) fn open_cache() -> Result<SqliteCache, DataError> {
    let path = cache_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    SqliteCache::new(&path)
}
