//! Eurostat dissemination API access.
//!
//! # Example
//!
//! ```no_run
//! use regiocast_data::eurostat::{DatasetRequest, EurostatClient};
//! use regiocast_data::jsonstat::Cube;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EurostatClient::new()?;
//!     let doc = client.fetch_document(&DatasetRequest::new("tgs00010")).await?;
//!     let table = Cube::try_from(doc)?.decode()?;
//!     println!("{} observations", table.len());
//!     Ok(())
//! }
//! ```

pub mod client;

pub use client::{
    DEFAULT_TIMEOUT, DatasetRequest, EUROSTAT_BASE_URL, EurostatClient, parse_document,
};
