use std::time::Duration;

use crate::error::{ArxivError, Result};

// ─── HttpClient ───────────────────────────────────────────────────────────────

/// Single-shot GET client. Lookups either succeed or fail once; there is no
/// retry at this layer.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    /// GET `url` and return the body, treating any non-2xx status as an error.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            return Err(ArxivError::ApiError(
                url.to_string(),
                format!("HTTP {status}"),
            ));
        }
        Ok(resp.text().await?)
    }
}
