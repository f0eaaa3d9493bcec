//! Eurostat dissemination API client.

use crate::error::{DataError, Result};
use crate::jsonstat::JsonStatDocument;
use std::time::Duration;
use tracing::{debug, info};

/// Eurostat Statistics API base URL
pub const EUROSTAT_BASE_URL: &str =
    "https://ec.europa.eu/eurostat/api/dissemination/statistics/1.0/data";

/// Default request timeout. A slower response fails the whole run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// User agent sent with every request
const USER_AGENT: &str = concat!("regiocast/", env!("CARGO_PKG_VERSION"));

/// A dataset request: code plus the query parameters sent with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRequest {
    /// Eurostat dataset code (e.g. `tgs00010`)
    pub code: String,
    /// Response language
    pub lang: String,
    /// Response format
    pub format: String,
}

impl DatasetRequest {
    /// Request `code` as English JSON-stat.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            lang: "EN".to_string(),
            format: "JSON".to_string(),
        }
    }

    /// Override the response language.
    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Query parameters in request order.
    pub fn query(&self) -> [(&'static str, &str); 2] {
        [("format", self.format.as_str()), ("lang", self.lang.as_str())]
    }
}

/// Async client for the Eurostat JSON-stat endpoint.
pub struct EurostatClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl EurostatClient {
    /// Create a client with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    ///
    /// # Example
    /// ```no_run
    /// use regiocast_data::eurostat::EurostatClient;
    /// use std::time::Duration;
    ///
    /// # fn example() -> regiocast_data::Result<()> {
    /// let client = EurostatClient::with_timeout(Duration::from_secs(30))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            client,
            base_url: EUROSTAT_BASE_URL.to_string(),
            timeout,
        })
    }

    /// Point the client at a different API host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Configured request timeout.
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// URL for a dataset, without query parameters.
    pub fn dataset_url(&self, code: &str) -> Result<String> {
        let code = code.trim();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(DataError::InvalidDataset(code.to_string()));
        }
        Ok(format!("{}/{}", self.base_url, code))
    }

    /// Fetch the raw JSON body of a dataset.
    ///
    /// # Errors
    /// Network failures, timeouts and non-success statuses are errors; no
    /// partial body is returned.
    pub async fn fetch_raw(&self, request: &DatasetRequest) -> Result<String> {
        let url = self.dataset_url(&request.code)?;
        debug!(%url, lang = %request.lang, "requesting dataset");

        let response = self
            .client
            .get(&url)
            .query(&request.query())
            .send()
            .await
            .map_err(DataError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Http {
                dataset: request.code.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(DataError::Network)?;
        info!(dataset = %request.code, bytes = body.len(), "fetched dataset");
        Ok(body)
    }

    /// Fetch and parse a dataset.
    pub async fn fetch_document(&self, request: &DatasetRequest) -> Result<JsonStatDocument> {
        let body = self.fetch_raw(request).await?;
        parse_document(&body)
    }
}

impl std::fmt::Debug for EurostatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EurostatClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Parse a JSON-stat body.
pub fn parse_document(body: &str) -> Result<JsonStatDocument> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonstat::Cube;

    #[test]
    fn test_dataset_url() {
        let client = EurostatClient::new().unwrap();
        assert_eq!(
            client.dataset_url("tgs00010").unwrap(),
            format!("{EUROSTAT_BASE_URL}/tgs00010")
        );
    }

    #[test]
    fn test_dataset_url_custom_base() {
        let client = EurostatClient::new()
            .unwrap()
            .with_base_url("http://localhost:8080/data/");
        assert_eq!(
            client.dataset_url("nama_10r_2gdp").unwrap(),
            "http://localhost:8080/data/nama_10r_2gdp"
        );
    }

    #[test]
    fn test_dataset_url_rejects_bad_codes() {
        let client = EurostatClient::new().unwrap();
        assert!(matches!(
            client.dataset_url(""),
            Err(DataError::InvalidDataset(_))
        ));
        assert!(matches!(
            client.dataset_url("../etc"),
            Err(DataError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_request_query_defaults() {
        let request = DatasetRequest::new("tgs00010");
        assert_eq!(request.query(), [("format", "JSON"), ("lang", "EN")]);
        assert_eq!(request.with_lang("DE").lang, "DE");
    }

    #[test]
    fn test_custom_timeout() {
        let client = EurostatClient::with_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    #[ignore = "requires network access to Eurostat"]
    async fn test_fetch_unemployment_dataset() {
        let client = EurostatClient::new().unwrap();
        let doc = client
            .fetch_document(&DatasetRequest::new("tgs00010"))
            .await
            .unwrap();
        let table = Cube::try_from(doc).unwrap().decode().unwrap();
        assert!(table.has_dimension("geo"));
        assert!(table.has_dimension("time"));
        assert!(!table.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires network access to Eurostat"]
    async fn test_fetch_unknown_dataset_is_http_error() {
        let client = EurostatClient::new().unwrap();
        let result = client
            .fetch_raw(&DatasetRequest::new("not_a_dataset_code"))
            .await;
        assert!(matches!(result, Err(DataError::Http { .. })));
    }
}
