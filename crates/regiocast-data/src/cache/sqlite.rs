//! SQLite cache for raw JSON-stat documents.

use crate::error::{DataError, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

/// SQLite cache keyed by (dataset code, language).
#[derive(Debug)]
pub struct SqliteCache {
    conn: Connection,
}

/// A cached response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedDocument {
    /// Dataset code
    pub dataset: String,
    /// Response language
    pub lang: String,
    /// Raw JSON-stat body
    pub body: String,
    /// When the body was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedDocument {
    /// Age of the cached body relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }
}

impl SqliteCache {
    /// Create a new SQLite cache.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                dataset TEXT NOT NULL,
                lang TEXT NOT NULL,
                body TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                PRIMARY KEY (dataset, lang)
            )",
            [],
        )?;
        Ok(())
    }

    /// Store a document body, replacing any previous copy.
    pub fn put_document(&self, dataset: &str, lang: &str, body: &str) -> Result<()> {
        self.put_document_at(dataset, lang, body, Utc::now())
    }

    /// Store a document body with an explicit fetch time.
    pub fn put_document_at(
        &self,
        dataset: &str,
        lang: &str,
        body: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO documents (dataset, lang, body, fetched_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![dataset, lang, body, fetched_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Get a cached document.
    pub fn get_document(&self, dataset: &str, lang: &str) -> Result<Option<CachedDocument>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT body, fetched_at FROM documents WHERE dataset = ?1 AND lang = ?2",
                params![dataset, lang],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(body, fetched_at)| {
            let fetched_at = DateTime::parse_from_rfc3339(&fetched_at)
                .map_err(|e| DataError::Parse(format!("Invalid cache timestamp: {e}")))?
                .with_timezone(&Utc);
            Ok(CachedDocument {
                dataset: dataset.to_string(),
                lang: lang.to_string(),
                body,
                fetched_at,
            })
        })
        .transpose()
    }

    /// Get a cached document only if it is younger than `max_age_days`.
    pub fn get_fresh_document(
        &self,
        dataset: &str,
        lang: &str,
        max_age_days: i64,
    ) -> Result<Option<CachedDocument>> {
        let now = Utc::now();
        Ok(self
            .get_document(dataset, lang)?
            .filter(|doc| doc.age(now) <= Duration::days(max_age_days)))
    }

    /// Clear all cached documents.
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM documents", [])?;
        Ok(())
    }

    /// Clear every language variant of one dataset.
    pub fn clear_dataset(&self, dataset: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM documents WHERE dataset = ?1", params![dataset])?;
        Ok(())
    }

    /// Get cache statistics.
    pub fn get_stats(&self) -> Result<CacheStats> {
        let (documents, total_bytes): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(LENGTH(body)), 0) FROM documents",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT dataset FROM documents ORDER BY dataset")?;
        let datasets = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(CacheStats {
            documents: documents as usize,
            total_bytes: total_bytes as usize,
            datasets,
        })
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cached documents
    pub documents: usize,
    /// Total size of cached bodies in bytes
    pub total_bytes: usize,
    /// Distinct dataset codes present
    pub datasets: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_initialization() {
        let cache = SqliteCache::in_memory();
        assert!(cache.is_ok());
    }

    #[test]
    fn test_document_operations() {
        let cache = SqliteCache::in_memory().unwrap();

        cache.put_document("tgs00010", "EN", r#"{"id":[]}"#).unwrap();

        let doc = cache.get_document("tgs00010", "EN").unwrap().unwrap();
        assert_eq!(doc.body, r#"{"id":[]}"#);
        assert_eq!(doc.dataset, "tgs00010");

        // Other language is a separate entry
        assert!(cache.get_document("tgs00010", "DE").unwrap().is_none());

        // Replace
        cache.put_document("tgs00010", "EN", "{}").unwrap();
        let doc = cache.get_document("tgs00010", "EN").unwrap().unwrap();
        assert_eq!(doc.body, "{}");
    }

    #[test]
    fn test_fresh_document_respects_age() {
        let cache = SqliteCache::in_memory().unwrap();
        let old = Utc::now() - Duration::days(10);
        cache
            .put_document_at("nama_10r_2gdp", "EN", "{}", old)
            .unwrap();

        assert!(
            cache
                .get_fresh_document("nama_10r_2gdp", "EN", 7)
                .unwrap()
                .is_none()
        );
        assert!(
            cache
                .get_fresh_document("nama_10r_2gdp", "EN", 30)
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn test_cache_stats() {
        let cache = SqliteCache::in_memory().unwrap();
        let stats = cache.get_stats().unwrap();
        assert_eq!(stats.documents, 0);
        assert_eq!(stats.total_bytes, 0);

        cache.put_document("tgs00010", "EN", "abcd").unwrap();
        cache.put_document("nama_10r_2gdp", "EN", "ef").unwrap();

        let stats = cache.get_stats().unwrap();
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.total_bytes, 6);
        assert_eq!(stats.datasets, vec!["nama_10r_2gdp", "tgs00010"]);
    }

    #[test]
    fn test_clear_operations() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.put_document("tgs00010", "EN", "{}").unwrap();
        cache.put_document("tgs00010", "DE", "{}").unwrap();
        cache.put_document("nama_10r_2gdp", "EN", "{}").unwrap();

        cache.clear_dataset("tgs00010").unwrap();
        assert_eq!(cache.get_stats().unwrap().documents, 1);

        cache.clear_all().unwrap();
        assert_eq!(cache.get_stats().unwrap().documents, 0);
    }
}
