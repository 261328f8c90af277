//! Structured web-index backend (Google Custom Search JSON API).
//!
//! Queries a programmable search engine scoped to `t.me`. The index
//! interprets quoted phrases, exclusions, and `intitle:` natively, so
//! the free text rides through untouched; only the language restriction
//! maps to a native parameter (`lr=lang_xx`). Page size is fixed at 10
//! to bound per-request cost.

use crate::backend::{Backend, BackendKind, RawPayload};
use crate::error::UpstreamError;
use crate::models::StructuredQuery;

const API_URL: &str = "https://www.googleapis.com/customsearch/v1";
const PAGE_SIZE: &str = "10";

pub struct CseBackend {
    api_key: String,
    engine: String,
    client: reqwest::Client,
}

impl CseBackend {
    /// Create the backend for a specific engine id (`cx`). The API key
    /// comes from `GOOGLE_SEARCH_API_KEY`, falling back to
    /// `GEMINI_API_KEY` which Google projects often share.
    pub fn from_env(engine: &str, client: reqwest::Client) -> Result<Self, UpstreamError> {
        if engine.is_empty() {
            return Err(UpstreamError::new(
                "cse",
                "no search engine id configured (set [backends.cse].engine or pass one)",
            ));
        }
        let api_key = std::env::var("GOOGLE_SEARCH_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .map_err(|_| UpstreamError::new("cse", "GOOGLE_SEARCH_API_KEY not set"))?;
        Ok(Self {
            api_key,
            engine: engine.to_string(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl Backend for CseBackend {
    fn id(&self) -> String {
        format!("cse:{}", self.engine)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::WebIndex
    }

    async fn search(&self, query: &StructuredQuery) -> Result<RawPayload, UpstreamError> {
        let q = format!("{} site:t.me", query.free_text);

        let mut params: Vec<(&str, String)> = vec![
            ("key", self.api_key.clone()),
            ("cx", self.engine.clone()),
            ("q", q),
            ("num", PAGE_SIZE.to_string()),
        ];
        if let Some(code) = &query.language {
            params.push(("lr", format!("lang_{}", code)));
        }

        let backend_id = self.id();
        let response = self
            .client
            .get(API_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| UpstreamError::new(backend_id.clone(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(UpstreamError::with_status(
                backend_id,
                status.as_u16(),
                body_text,
            ));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::new(backend_id, e.to_string()))?;

        Ok(RawPayload::Json(payload))
    }
}
