use std::time::Duration;

use tracing::{debug, warn};

use titler_core::config::ApiConfig;
use titler_core::page::landing_title;
use titler_core::{Document, TITLE_PLACEHOLDER};

use crate::error::Result;
use crate::http::HttpClient;
use crate::identifiers::ArxivId;
use crate::parser::parse_feed_title;

pub struct ArxivClient {
    http: HttpClient,
    base_url: String,
}

impl ArxivClient {
    pub fn new() -> Result<Self> {
        Self::from_config(&ApiConfig::default())
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let defaults = ApiConfig::default();
        Self::with_params(base_url, defaults.timeout(), &defaults.user_agent)
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::with_params(&config.base_url, config.timeout(), &config.user_agent)
    }

    pub fn with_params(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(timeout, user_agent)?,
            base_url: base_url.to_string(),
        })
    }

    fn query_url(&self, id: &ArxivId) -> String {
        if self.base_url.contains('?') {
            format!("{}&id_list={}", self.base_url, id.id)
        } else {
            format!("{}?id_list={}", self.base_url, id.id)
        }
    }

    /// Look up the paper's title. One request, no retries.
    ///
    /// Transport errors and non-2xx statuses come back as `Err`; a feed that
    /// answers but carries no usable title resolves to the placeholder.
    pub async fn fetch_title(&self, id: &ArxivId) -> Result<String> {
        let url = self.query_url(id);
        debug!(%url, "querying arXiv API");

        let xml = self.http.get_text(&url).await.inspect_err(|e| {
            warn!(%url, error = %e, "unable to fetch paper data from arXiv API");
        })?;
        Ok(parse_feed_title(&xml))
    }

    /// Read the title element of a landing (abstract) page.
    pub async fn fetch_landing_title(&self, url: &str, title_class: &str) -> Result<String> {
        let html = self.http.get_text(url).await?;
        let doc = Document::parse_html(&html);
        Ok(landing_title(&doc, title_class).unwrap_or_else(|| {
            warn!(%url, "unable to find a title element in the page");
            TITLE_PLACEHOLDER.to_string()
        }))
    }

    /// Fetch any page and parse it into a document.
    pub async fn fetch_document(&self, url: &str) -> Result<Document> {
        let html = self.http.get_text(url).await?;
        Ok(Document::parse_html(&html))
    }
}
