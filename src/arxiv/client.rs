//! arXiv query API client

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::ArxivError;
use super::search::{Paper, SearchQuery, parse_atom_feed};
use crate::config::ArxivConfig;

/// Client for the arXiv query API
pub struct ArxivClient {
    http: Client,
    base_url: String,
}

impl ArxivClient {
    /// Create a new client from configuration
    pub fn from_config(config: &ArxivConfig) -> Result<Self, ArxivError> {
        debug!(?config, "from_config: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Run a search and return the parsed papers
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Paper>, ArxivError> {
        debug!(query = %query.query, max_results = %query.max_results, "search: called");

        let response = self
            .http
            .get(&self.base_url)
            .query(&query.to_params())
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        parse_atom_feed(&body)
    }
}
