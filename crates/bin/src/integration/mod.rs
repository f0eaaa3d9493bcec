//! Integration with the outside world: the Eurostat API and the local
//! document cache.

pub(crate) mod cache_manager;
pub(crate) mod data_pipeline;
