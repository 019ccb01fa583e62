//! arXiv API integration
//!
//! Thin client for the arXiv query API (Atom feed) used by the search tool.

mod client;
mod search;

pub use client::ArxivClient;
pub use search::{Paper, SearchQuery, SortBy};

use thiserror::Error;

/// Errors from the arXiv API client
#[derive(Debug, Error)]
pub enum ArxivError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),
}
