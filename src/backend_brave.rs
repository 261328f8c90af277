//! Raw web-search backend (Brave Web Search API).
//!
//! Same `site:t.me` scoped query approach as the structured web index,
//! but a flat response shape: `web.results[]` of
//! `{title, description, url, language?, age?}` instead of nested
//! metadata blocks. Page size is fixed at 20.

use crate::backend::{Backend, BackendKind, RawPayload};
use crate::error::UpstreamError;
use crate::models::StructuredQuery;

const API_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const PAGE_SIZE: &str = "20";

pub struct BraveBackend {
    api_key: String,
    client: reqwest::Client,
}

impl BraveBackend {
    /// Create the backend from the `BRAVE_SEARCH_API_KEY` environment
    /// variable.
    pub fn from_env(client: reqwest::Client) -> Result<Self, UpstreamError> {
        let api_key = std::env::var("BRAVE_SEARCH_API_KEY")
            .map_err(|_| UpstreamError::new("brave", "BRAVE_SEARCH_API_KEY not set"))?;
        Ok(Self { api_key, client })
    }
}

#[async_trait::async_trait]
impl Backend for BraveBackend {
    fn id(&self) -> String {
        "brave".to_string()
    }

    fn kind(&self) -> BackendKind {
        BackendKind::RawWeb
    }

    async fn search(&self, query: &StructuredQuery) -> Result<RawPayload, UpstreamError> {
        let q = format!("{} site:t.me", query.free_text);

        let response = self
            .client
            .get(API_URL)
            .query(&[
                ("q", q.as_str()),
                ("count", PAGE_SIZE),
                ("result_filter", "web"),
                ("safesearch", "moderate"),
            ])
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .send()
            .await
            .map_err(|e| UpstreamError::new("brave", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(UpstreamError::with_status(
                "brave",
                status.as_u16(),
                body_text,
            ));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::new("brave", e.to_string()))?;

        Ok(RawPayload::Json(payload))
    }
}
