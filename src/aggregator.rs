//! Request orchestration: parse → cache → adapter → normalize → dedup →
//! cache write → return.
//!
//! The aggregator is the only entry point into the core. It never
//! invents fallback data: an adapter failure surfaces as a typed error
//! and the caller decides between showing it and degrading to an empty
//! state. Concurrent requests for the same key may both miss and both
//! call the upstream; duplicate calls under a stampede are bounded by
//! the rate limiter in front of the core, not coalesced here.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::{create_backend, Backend, BackendSelector};
use crate::backend_gemini::GeminiBackend;
use crate::cache::{cache_key, suggestion_key, CacheStore};
use crate::config::Config;
use crate::dedup::dedup;
use crate::error::AggregationError;
use crate::models::Channel;
use crate::normalize::{extract_json_array, normalize};
use crate::query;

pub struct Aggregator {
    config: Config,
    client: reqwest::Client,
    cache: Arc<dyn CacheStore>,
    ttl_secs: u64,
}

impl Aggregator {
    /// Build the aggregator around an injected cache handle.
    pub fn new(config: Config, cache: Arc<dyn CacheStore>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.backends.timeout_secs))
            .build()?;
        let ttl_secs = config.cache.ttl_secs;
        Ok(Self {
            config,
            client,
            cache,
            ttl_secs,
        })
    }

    /// Run one search against the selected backend.
    ///
    /// # Errors
    ///
    /// - [`AggregationError::InvalidQuery`] when the query trims to empty.
    /// - [`AggregationError::Upstream`] when the adapter fails and no
    ///   cached result exists.
    pub async fn search(
        &self,
        raw_query: &str,
        selector: &BackendSelector,
    ) -> Result<Vec<Channel>, AggregationError> {
        if raw_query.trim().is_empty() {
            return Err(AggregationError::InvalidQuery);
        }
        let backend = create_backend(&self.config, &self.client, selector)?;
        self.search_with(raw_query, backend.as_ref()).await
    }

    /// Run one search against an explicit backend instance. Split out so
    /// tests can substitute a scripted backend.
    pub async fn search_with(
        &self,
        raw_query: &str,
        backend: &dyn Backend,
    ) -> Result<Vec<Channel>, AggregationError> {
        if raw_query.trim().is_empty() {
            return Err(AggregationError::InvalidQuery);
        }

        let structured = query::parse(raw_query);
        let key = cache_key(&backend.id(), raw_query);

        if let Some(cached) = self.cache.get(&key).await {
            match serde_json::from_value::<Vec<Channel>>(cached) {
                Ok(channels) => {
                    debug!(key, count = channels.len(), "cache hit");
                    return Ok(channels);
                }
                Err(e) => {
                    // A stale or foreign entry under our key; refetch.
                    debug!(key, error = %e, "cached entry undecodable, treating as miss");
                }
            }
        }

        let payload = backend.search(&structured).await?;
        let channels = dedup(normalize(backend.kind(), &payload));

        // An empty result is a valid, cacheable outcome: it prevents
        // repeated expensive no-result upstream calls.
        match serde_json::to_value(&channels) {
            Ok(value) => self.cache.set(&key, &value, self.ttl_secs).await,
            Err(e) => warn!(key, error = %e, "skipping cache write"),
        }

        debug!(key, count = channels.len(), "cache miss served from upstream");
        Ok(channels)
    }

    /// Produce short suggestion tags for a partial query via the
    /// AI-grounded backend. Queries under 3 characters return nothing.
    ///
    /// # Errors
    ///
    /// [`AggregationError::Upstream`] when the model call fails and no
    /// cached suggestions exist.
    pub async fn suggest(&self, raw_query: &str) -> Result<Vec<String>, AggregationError> {
        let trimmed = raw_query.trim();
        if trimmed.len() < 3 {
            return Ok(Vec::new());
        }

        let key = suggestion_key(trimmed);
        if let Some(cached) = self.cache.get(&key).await {
            if let Ok(tags) = serde_json::from_value::<Vec<String>>(cached) {
                return Ok(tags);
            }
        }

        let gemini = GeminiBackend::from_env(&self.config.backends.gemini, self.client.clone())?;
        let text = gemini.suggest(trimmed).await?;
        let tags = parse_suggestions(&text);

        self.cache
            .set(&key, &Value::from(tags.clone()), self.ttl_secs)
            .await;
        Ok(tags)
    }
}

/// Pull a string array out of raw suggestion text, tolerating the same
/// fencing and commentary as search payloads. Anything unparseable
/// degrades to no suggestions.
fn parse_suggestions(text: &str) -> Vec<String> {
    extract_json_array(text)
        .and_then(|v| v.as_array().cloned())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestions_parse_from_fenced_array() {
        let text = "```json\n[\"crypto\", \"bitcoin\", \"defi\"]\n```";
        assert_eq!(parse_suggestions(text), vec!["crypto", "bitcoin", "defi"]);
    }

    #[test]
    fn suggestion_non_strings_are_skipped() {
        assert_eq!(parse_suggestions("[\"a\", 1, null, \"b\"]"), vec!["a", "b"]);
    }

    #[test]
    fn suggestion_garbage_degrades_to_empty() {
        assert!(parse_suggestions("no array here").is_empty());
    }
}
