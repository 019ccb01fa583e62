//! Search query construction and Atom feed parsing

use chrono::{NaiveDate, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use tracing::debug;

use super::ArxivError;

/// Earliest submission date accepted by the API date filter
const EPOCH_STAMP: &str = "199108140000";

/// Sort order for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Relevance,
    LastUpdatedDate,
    SubmittedDate,
}

impl SortBy {
    /// Parse from a tool-facing name, defaulting to relevance
    pub fn from_name(name: &str) -> Self {
        match name {
            "lastUpdatedDate" => SortBy::LastUpdatedDate,
            "submittedDate" => SortBy::SubmittedDate,
            _ => SortBy::Relevance,
        }
    }

    /// The value the query API expects for the sortBy parameter
    pub fn as_api_str(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::LastUpdatedDate => "lastUpdatedDate",
            SortBy::SubmittedDate => "submittedDate",
        }
    }
}

/// A search against the arXiv query API
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Query string, optionally using field prefixes like `ti:` or `cat:`
    pub query: String,
    pub max_results: u32,
    pub sort_by: SortBy,
    /// Filter to papers submitted on or after this date
    pub start_date: Option<NaiveDate>,
    /// Filter to papers submitted on or before this date
    pub end_date: Option<NaiveDate>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: 10,
            sort_by: SortBy::Relevance,
            start_date: None,
            end_date: None,
        }
    }

    /// Full search_query value with the date filter appended
    pub fn search_expression(&self) -> String {
        let mut expr = self.query.clone();
        if self.start_date.is_some() || self.end_date.is_some() {
            let start = self
                .start_date
                .map(|d| format!("{}0000", d.format("%Y%m%d")))
                .unwrap_or_else(|| EPOCH_STAMP.to_string());
            let end = self
                .end_date
                .map(|d| format!("{}2359", d.format("%Y%m%d")))
                .unwrap_or_else(|| Utc::now().format("%Y%m%d%H%M").to_string());
            expr.push_str(&format!(" AND submittedDate:[{start} TO {end}]"));
        }
        expr
    }

    /// Query parameters for the API request
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        debug!(query = %self.query, "to_params: called");
        vec![
            ("search_query", self.search_expression()),
            ("start", "0".to_string()),
            ("max_results", self.max_results.clamp(1, 2000).to_string()),
            ("sortBy", self.sort_by.as_api_str().to_string()),
            ("sortOrder", "descending".to_string()),
        ]
    }
}

/// A paper returned from a search
#[derive(Debug, Clone, Serialize)]
pub struct Paper {
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub pdf_url: String,
    /// Publication date in YYYY-MM-DD format
    pub published: String,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
}

#[derive(Debug, Default)]
struct PaperBuilder {
    title: String,
    authors: Vec<String>,
    abstract_text: String,
    pdf_url: String,
    published: String,
    categories: Vec<String>,
    doi: Option<String>,
}

impl PaperBuilder {
    fn build(self) -> Paper {
        Paper {
            title: collapse_whitespace(&self.title),
            authors: self.authors,
            abstract_text: collapse_whitespace(&self.abstract_text),
            pdf_url: self.pdf_url,
            // Atom timestamps are RFC 3339; keep the date part only
            published: self.published.chars().take(10).collect(),
            categories: self.categories,
            doi: self.doi,
        }
    }
}

/// Which text node we are currently collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Title,
    AuthorName,
    Summary,
    Published,
    Doi,
}

/// Entry titles and abstracts wrap lines with leading spaces
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn attr_value(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Collect link and category metadata; both can appear as empty elements
fn apply_element(entry: &mut PaperBuilder, element: &BytesStart<'_>) {
    match element.name().as_ref() {
        b"link" => {
            if attr_value(element, b"title").as_deref() == Some("pdf")
                && let Some(href) = attr_value(element, b"href")
            {
                entry.pdf_url = href;
            }
        }
        b"category" => {
            if let Some(term) = attr_value(element, b"term") {
                entry.categories.push(term);
            }
        }
        _ => {}
    }
}

/// Parse an Atom feed from the query API into papers
pub fn parse_atom_feed(xml: &str) -> Result<Vec<Paper>, ArxivError> {
    debug!(len = %xml.len(), "parse_atom_feed: called");
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut papers = Vec::new();
    let mut entry: Option<PaperBuilder> = None;
    let mut in_author = false;
    let mut field: Option<TextField> = None;

    loop {
        match reader.read_event() {
            Err(e) => return Err(ArxivError::Parse(e.to_string())),
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                if let Some(entry) = entry.as_mut() {
                    apply_element(entry, &e);
                }
                match e.name().as_ref() {
                    b"entry" => {
                        entry = Some(PaperBuilder::default());
                        field = None;
                    }
                    b"author" if entry.is_some() => in_author = true,
                    b"title" if entry.is_some() => field = Some(TextField::Title),
                    b"name" if in_author => field = Some(TextField::AuthorName),
                    b"summary" if entry.is_some() => field = Some(TextField::Summary),
                    b"published" if entry.is_some() => field = Some(TextField::Published),
                    b"arxiv:doi" if entry.is_some() => field = Some(TextField::Doi),
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(entry) = entry.as_mut() {
                    apply_element(entry, &e);
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some(entry), Some(field)) = (entry.as_mut(), field) {
                    let text = t.unescape().map_err(|e| ArxivError::Parse(e.to_string()))?;
                    match field {
                        TextField::Title => entry.title.push_str(&text),
                        TextField::AuthorName => entry.authors.push(text.into_owned()),
                        TextField::Summary => entry.abstract_text.push_str(&text),
                        TextField::Published => entry.published.push_str(&text),
                        TextField::Doi => entry.doi = Some(text.into_owned()),
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"entry" => {
                    if let Some(builder) = entry.take() {
                        papers.push(builder.build());
                    }
                    field = None;
                }
                b"author" => {
                    in_author = false;
                    field = None;
                }
                _ => field = None,
            },
            Ok(_) => {}
        }
    }

    debug!(paper_count = %papers.len(), "parse_atom_feed: done");
    Ok(papers)
}
