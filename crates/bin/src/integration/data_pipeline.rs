//! Fetch stage: download both datasets, cache-first, and write the raw tables.
//!
//! Documents are cached as raw JSON bodies keyed by dataset and language, so
//! reruns within the configured age skip the network entirely. Only bodies
//! that decode into a raw table are cached.

use super::cache_manager;
use indicatif::ProgressBar;
use regiocast::panel::RegionPattern;
use regiocast::pipeline::{prepare_raw_table, write_raw_tables};
use regiocast::{DatasetSpec, PipelineConfig, PipelineError};
use regiocast_data::TidyTable;
use regiocast_data::cache::SqliteCache;
use regiocast_data::eurostat::{EurostatClient, parse_document};
use tracing::{debug, warn};

/// Configuration for data fetching.
#[derive(Debug, Clone)]
pub(crate) struct FetchConfig {
    /// Whether to use the cache.
    pub use_cache: bool,
    /// Whether to force refresh (ignore cache).
    pub force_refresh: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            force_refresh: false,
        }
    }
}

/// Where a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Source {
    Cache,
    Network,
}

impl Source {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Network => "Eurostat",
        }
    }
}

/// Raw tables of one fetch, with where each document came from.
#[derive(Debug)]
pub(crate) struct RawTables {
    pub(crate) unemployment: TidyTable,
    pub(crate) gdp: TidyTable,
    pub(crate) sources: [Source; 2],
}

/// Decode a document body into the dataset's raw table.
fn decode_body(
    body: &str,
    spec: &DatasetSpec,
    region: &RegionPattern,
) -> Result<TidyTable, PipelineError> {
    prepare_raw_table(parse_document(body)?, spec, region)
}

/// Raw table from a fresh cached document.
///
/// A cached body that no longer decodes counts as a miss.
fn cached_table(
    cache: &SqliteCache,
    spec: &DatasetSpec,
    config: &PipelineConfig,
) -> Option<TidyTable> {
    match cache.get_fresh_document(&spec.code, &spec.lang, config.cache_max_age_days) {
        Ok(Some(doc)) => match decode_body(&doc.body, spec, &config.region) {
            Ok(table) => {
                debug!(dataset = %spec.code, fetched_at = %doc.fetched_at, "cache hit");
                Some(table)
            }
            Err(e) => {
                warn!(dataset = %spec.code, error = %e, "cached document unusable, refetching");
                None
            }
        },
        Ok(None) => {
            debug!(dataset = %spec.code, "cache miss");
            None
        }
        Err(e) => {
            warn!(dataset = %spec.code, error = %e, "cache read failed");
            None
        }
    }
}

/// Decode a fetched body and cache it once it decodes.
fn accept_body(
    cache: Option<&SqliteCache>,
    spec: &DatasetSpec,
    config: &PipelineConfig,
    body: &str,
) -> Result<TidyTable, PipelineError> {
    let table = decode_body(body, spec, &config.region)?;
    if let Some(cache) = cache {
        if let Err(e) = cache.put_document(&spec.code, &spec.lang, body) {
            warn!(dataset = %spec.code, error = %e, "cache write failed");
        }
    }
    Ok(table)
}

async fn fetch_table(
    client: &EurostatClient,
    cache: Option<&SqliteCache>,
    config: &PipelineConfig,
    spec: &DatasetSpec,
    fetch: &FetchConfig,
    progress: Option<&ProgressBar>,
) -> Result<(TidyTable, Source), PipelineError> {
    if let Some(pb) = progress {
        pb.set_message(format!("Fetching {}...", spec.code));
    }
    if let Some(table) = cache
        .filter(|_| !fetch.force_refresh)
        .and_then(|cache| cached_table(cache, spec, config))
    {
        return Ok((table, Source::Cache));
    }

    let body = client.fetch_raw(&spec.request()).await?;
    Ok((accept_body(cache, spec, config, &body)?, Source::Network))
}

/// Fetch both datasets, narrow them and write the raw CSVs.
///
/// Nothing is written unless both documents were fetched and decoded.
pub(crate) async fn fetch_raw_tables(
    config: &PipelineConfig,
    fetch: &FetchConfig,
    progress: Option<&ProgressBar>,
) -> Result<RawTables, PipelineError> {
    let cache = if fetch.use_cache {
        match cache_manager::open_cache() {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!(error = %e, "cache unavailable, fetching without it");
                None
            }
        }
    } else {
        None
    };
    let client = EurostatClient::with_timeout(config.request_timeout())?;

    let (unemployment, unemployment_source) = fetch_table(
        &client,
        cache.as_ref(),
        config,
        &config.unemployment,
        fetch,
        progress,
    )
    .await?;
    let (gdp, gdp_source) =
        fetch_table(&client, cache.as_ref(), config, &config.gdp, fetch, progress).await?;
    write_raw_tables(config, &unemployment, &gdp)?;

    Ok(RawTables {
        unemployment,
        gdp,
        sources: [unemployment_source, gdp_source],
    })
}

/// Print cache location and contents.
pub(crate) fn print_cache_info() {
    println!("  Cache location: {}", cache_manager::cache_path().display());
    if let Some(stats) = cache_manager::open_cache()
        .ok()
        .and_then(|cache| cache.get_stats().ok())
    {
        println!(
            "  Cached documents: {} ({} bytes)",
            stats.documents, stats.total_bytes
        );
        if !stats.datasets.is_empty() {
            println!("  Datasets: {}", stats.datasets.join(", "));
        }
    }
}
