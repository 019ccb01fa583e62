//! Paper search tool backed by the arXiv query API

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use super::traits::{Tool, ToolResult};
use crate::arxiv::{ArxivClient, SearchQuery, SortBy};

/// Search arXiv for papers matching a query
pub struct SearchPapersTool {
    client: Arc<ArxivClient>,
}

impl SearchPapersTool {
    pub fn new(client: Arc<ArxivClient>) -> Self {
        Self { client }
    }

    fn parse_query(input: &Value) -> Result<SearchQuery, String> {
        let query_str = input
            .get("query")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .ok_or("query is required")?;

        let mut query = SearchQuery::new(query_str);

        if let Some(max_results) = input.get("max_results").and_then(|v| v.as_u64()) {
            query.max_results = max_results.min(u64::from(u32::MAX)) as u32;
        }

        if let Some(sort_by) = input.get("sort_by").and_then(|v| v.as_str()) {
            query.sort_by = SortBy::from_name(sort_by);
        }

        query.start_date = parse_date(input, "start_date")?;
        query.end_date = parse_date(input, "end_date")?;

        Ok(query)
    }
}

fn parse_date(input: &Value, field: &str) -> Result<Option<NaiveDate>, String> {
    match input.get(field).and_then(|v| v.as_str()) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| format!("{field} must be in YYYY-MM-DD format, got '{s}'")),
        None => Ok(None),
    }
}

#[async_trait]
impl Tool for SearchPapersTool {
    fn name(&self) -> &'static str {
        "search_papers"
    }

    fn description(&self) -> &'static str {
        "Search arXiv for papers. The query supports field prefixes: \
         ti: (title), au: (author), abs: (abstract), co: (comment), \
         jr: (journal reference), cat: (subject category), rn: (report number), \
         all: (all fields). Examples: 'ti:machine learning', 'au:Smith', 'cat:cs.AI'."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query, optionally using field prefixes like ti:, au:, abs:, cat:"
                },
                "max_results": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 2000,
                    "default": 10,
                    "description": "Maximum number of papers to return"
                },
                "sort_by": {
                    "type": "string",
                    "enum": ["relevance", "lastUpdatedDate", "submittedDate"],
                    "default": "relevance",
                    "description": "Sort order for results"
                },
                "start_date": {
                    "type": "string",
                    "description": "Only papers submitted on or after this date (YYYY-MM-DD)"
                },
                "end_date": {
                    "type": "string",
                    "description": "Only papers submitted on or before this date (YYYY-MM-DD)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        debug!(?input, "SearchPapersTool::execute: called");

        let query = match Self::parse_query(&input) {
            Ok(q) => q,
            Err(e) => return ToolResult::error(e),
        };

        let papers = match self.client.search(&query).await {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("arXiv search failed: {e}")),
        };

        debug!(paper_count = %papers.len(), "SearchPapersTool::execute: search done");

        match serde_json::to_string_pretty(&papers) {
            Ok(json) => ToolResult::success(json),
            Err(e) => ToolResult::error(format!("Failed to serialize results: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_minimal() {
        let input = serde_json::json!({ "query": "cat:cs.CL" });
        let query = SearchPapersTool::parse_query(&input).unwrap();
        assert_eq!(query.query, "cat:cs.CL");
        assert_eq!(query.max_results, 10);
        assert_eq!(query.sort_by, SortBy::Relevance);
        assert!(query.start_date.is_none());
    }

    #[test]
    fn test_parse_query_full() {
        let input = serde_json::json!({
            "query": "ti:transformers",
            "max_results": 25,
            "sort_by": "submittedDate",
            "start_date": "2023-01-01",
            "end_date": "2023-12-31",
        });
        let query = SearchPapersTool::parse_query(&input).unwrap();
        assert_eq!(query.max_results, 25);
        assert_eq!(query.sort_by, SortBy::SubmittedDate);
        assert_eq!(query.start_date, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(query.end_date, NaiveDate::from_ymd_opt(2023, 12, 31));
    }

    #[test]
    fn test_parse_query_missing_query() {
        let input = serde_json::json!({ "max_results": 5 });
        assert!(SearchPapersTool::parse_query(&input).is_err());

        let input = serde_json::json!({ "query": "   " });
        assert!(SearchPapersTool::parse_query(&input).is_err());
    }

    #[test]
    fn test_parse_query_bad_date() {
        let input = serde_json::json!({ "query": "all:x", "start_date": "01/01/2023" });
        let err = SearchPapersTool::parse_query(&input).unwrap_err();
        assert!(err.contains("YYYY-MM-DD"));
    }
}
