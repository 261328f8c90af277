//! Backend adapter abstraction.
//!
//! Every upstream search source implements the same narrow capability: a
//! [`Backend`] takes a [`StructuredQuery`] and returns a backend-specific
//! raw payload or a typed [`UpstreamError`]. The closed set of concrete
//! implementations lives in its own file per upstream:
//!
//! | Backend | File | Upstream |
//! |---------|------|----------|
//! | AI-grounded | [`crate::backend_gemini`] | generative model with a web-search tool |
//! | Web index | [`crate::backend_cse`] | Google Custom Search JSON API |
//! | Raw web | [`crate::backend_brave`] | Brave Web Search API |
//!
//! Adapters never retry and never interpret their payload: a single
//! bounded-timeout attempt per request, with JSON extraction left to the
//! normalizer. Credentials are read from the environment at construction
//! time; a missing key surfaces as an `UpstreamError` like any other
//! upstream failure.

use async_trait::async_trait;

use crate::backend_brave::BraveBackend;
use crate::backend_cse::CseBackend;
use crate::backend_gemini::GeminiBackend;
use crate::config::Config;
use crate::error::UpstreamError;
use crate::models::StructuredQuery;

/// Raw, uninterpreted response from one upstream call.
#[derive(Debug, Clone)]
pub enum RawPayload {
    /// Free-form model output expected to contain a JSON array somewhere.
    Text(String),
    /// Structured JSON response body.
    Json(serde_json::Value),
}

/// Which family of upstream produced a payload. Drives the normalizer's
/// per-backend transform and the id prefix on produced channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    AiGrounded,
    WebIndex,
    RawWeb,
}

/// A single upstream search source.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Stable identifier used in cache keys and error reports. Includes
    /// the external engine id where one exists (`"cse:<cx>"`), so results
    /// from different indices never collide in the cache.
    fn id(&self) -> String;

    /// Which normalizer transform applies to this backend's payloads.
    fn kind(&self) -> BackendKind;

    /// Execute one search against the upstream.
    ///
    /// # Errors
    ///
    /// `UpstreamError` on missing credentials, network failure, or a
    /// non-2xx response. Never retries internally.
    async fn search(&self, query: &StructuredQuery) -> Result<RawPayload, UpstreamError>;
}

/// Caller-facing backend selection, derived from the inbound
/// `backendId` contract: `null` selects the AI-grounded backend, the
/// literal `"brave"` selects the raw web index, and any other value is a
/// web-index engine id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSelector {
    AiGrounded,
    WebIndex { engine: String },
    RawWeb,
}

impl BackendSelector {
    /// Resolve an inbound backend id. The shorthand `"cse"` selects the
    /// web index with the engine configured under `[backends.cse]`.
    pub fn resolve(config: &Config, backend_id: Option<&str>) -> Self {
        match backend_id {
            None => BackendSelector::AiGrounded,
            Some("brave") => BackendSelector::RawWeb,
            Some("cse") => BackendSelector::WebIndex {
                engine: config.backends.cse.engine.clone().unwrap_or_default(),
            },
            Some(engine) => BackendSelector::WebIndex {
                engine: engine.to_string(),
            },
        }
    }
}

/// Create the adapter for a selector.
///
/// The shared `reqwest::Client` carries the configured timeout; adapters
/// only add their own credentials and request shape.
///
/// # Errors
///
/// `UpstreamError` when the selected backend is missing credentials or
/// configuration (e.g. no web-index engine id anywhere).
pub fn create_backend(
    config: &Config,
    client: &reqwest::Client,
    selector: &BackendSelector,
) -> Result<Box<dyn Backend>, UpstreamError> {
    match selector {
        BackendSelector::AiGrounded => Ok(Box::new(GeminiBackend::from_env(
            &config.backends.gemini,
            client.clone(),
        )?)),
        BackendSelector::WebIndex { engine } => {
            Ok(Box::new(CseBackend::from_env(engine, client.clone())?))
        }
        BackendSelector::RawWeb => Ok(Box::new(BraveBackend::from_env(client.clone())?)),
    }
}

/// Print the configured backends and whether their credentials resolve.
pub fn list_backends(config: &Config) {
    let gemini = credential_status("GEMINI_API_KEY");
    let cse_key = if std::env::var("GOOGLE_SEARCH_API_KEY").is_ok()
        || std::env::var("GEMINI_API_KEY").is_ok()
    {
        "OK"
    } else {
        "NO API KEY"
    };
    let cse = match (&config.backends.cse.engine, cse_key) {
        (Some(_), "OK") => "OK",
        (None, _) => "NOT CONFIGURED (no engine id)",
        (_, status) => status,
    };
    let brave = credential_status("BRAVE_SEARCH_API_KEY");

    println!("{:<12} {:<28} STATUS", "BACKEND", "UPSTREAM");
    println!("{:<12} {:<28} {}", "gemini", "AI-grounded search", gemini);
    println!("{:<12} {:<28} {}", "cse", "Google Custom Search", cse);
    println!("{:<12} {:<28} {}", "brave", "Brave Web Search", brave);
}

fn credential_status(var: &str) -> &'static str {
    if std::env::var(var).map(|v| !v.is_empty()).unwrap_or(false) {
        "OK"
    } else {
        "NO API KEY"
    }
}
