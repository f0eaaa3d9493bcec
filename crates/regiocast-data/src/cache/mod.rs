//! Caching layer for raw statistical documents.

pub mod sqlite;

pub use sqlite::{CacheStats, CachedDocument, SqliteCache};
