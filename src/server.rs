//! HTTP API server.
//!
//! Thin JSON surface over the aggregation core, suitable as a
//! backend-for-frontend. Handlers translate the typed core errors into
//! HTTP statuses; rate limiting happens here, in front of the core,
//! which only passes the signal through.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/search` | Search channels (`{ "query", "backend"? }`) |
//! | `POST` | `/api/suggestions` | Suggestion tags for a partial query |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `rate_limited` (429),
//! `upstream_unavailable` (502), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser frontends
//! can call the API directly.

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::aggregator::Aggregator;
use crate::backend::BackendSelector;
use crate::cache::TieredCache;
use crate::config::Config;
use crate::error::AggregationError;
use crate::models::Channel;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    aggregator: Arc<Aggregator>,
    limiter: Arc<DefaultDirectRateLimiter>,
}

/// Start the HTTP server on the configured bind address. Runs until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let cache = TieredCache::connect(&config.cache).await;
    if cache.has_shared_tier() {
        println!("Shared cache tier connected.");
    }

    let aggregator = Aggregator::new(config.clone(), Arc::new(cache))?;
    let quota = Quota::per_minute(
        NonZeroU32::new(config.server.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN),
    );

    let state = AppState {
        config: Arc::new(config.clone()),
        aggregator: Arc::new(aggregator),
        limiter: Arc::new(RateLimiter::direct(quota)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/search", post(handle_search))
        .route("/api/suggestions", post(handle_suggestions))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("tg-scout server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AggregationError> for AppError {
    fn from(err: AggregationError) -> Self {
        let (status, code) = match &err {
            AggregationError::InvalidQuery => (StatusCode::BAD_REQUEST, "bad_request"),
            AggregationError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            AggregationError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
        };
        AppError {
            status,
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

/// Check the process-wide request quota, mapping an exceeded quota to
/// the pass-through `RateLimited` signal.
fn check_rate_limit(state: &AppState) -> Result<(), AppError> {
    if state.limiter.check().is_err() {
        return Err(AggregationError::RateLimited.into());
    }
    Ok(())
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    /// `null` selects the AI-grounded backend; `"brave"` the raw web
    /// index; anything else a web-index engine id.
    #[serde(default)]
    backend: Option<String>,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<Channel>>, AppError> {
    check_rate_limit(&state)?;

    let selector = BackendSelector::resolve(&state.config, request.backend.as_deref());
    let channels = state.aggregator.search(&request.query, &selector).await?;
    Ok(Json(channels))
}

// ============ POST /api/suggestions ============

#[derive(Deserialize)]
struct SuggestRequest {
    query: String,
}

async fn handle_suggestions(
    State(state): State<AppState>,
    Json(request): Json<SuggestRequest>,
) -> Result<Json<Vec<String>>, AppError> {
    check_rate_limit(&state)?;

    let tags = state.aggregator.suggest(&request.query).await?;
    Ok(Json(tags))
}
