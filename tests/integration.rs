//! Integration tests for the aggregation pipeline.
//!
//! These drive the aggregator end-to-end through the library API with a
//! scripted backend and a real tiered cache, proving the
//! cache/normalize/dedup contract without touching any live upstream.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use tg_scout::aggregator::Aggregator;
use tg_scout::backend::{Backend, BackendKind, RawPayload};
use tg_scout::cache::{CacheStore, TieredCache};
use tg_scout::config::Config;
use tg_scout::error::{AggregationError, UpstreamError};
use tg_scout::models::{ChannelStatus, StructuredQuery};

// ─── Scripted backend ───────────────────────────────────────────────

/// A backend that replays a fixed payload and counts its invocations.
struct ScriptedBackend {
    kind: BackendKind,
    payload: RawPayload,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    fn web_index(payload: serde_json::Value) -> Self {
        Self {
            kind: BackendKind::WebIndex,
            payload: RawPayload::Json(payload),
            calls: AtomicUsize::new(0),
        }
    }

    fn ai(text: &str) -> Self {
        Self {
            kind: BackendKind::AiGrounded,
            payload: RawPayload::Text(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn id(&self) -> String {
        "scripted".to_string()
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn search(&self, _query: &StructuredQuery) -> Result<RawPayload, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.payload.clone())
    }
}

/// A backend that always fails the way a dead upstream does.
struct FailingBackend;

#[async_trait]
impl Backend for FailingBackend {
    fn id(&self) -> String {
        "failing".to_string()
    }

    fn kind(&self) -> BackendKind {
        BackendKind::WebIndex
    }

    async fn search(&self, _query: &StructuredQuery) -> Result<RawPayload, UpstreamError> {
        Err(UpstreamError::with_status(
            "failing",
            503,
            "service unavailable",
        ))
    }
}

fn memory_aggregator() -> Aggregator {
    Aggregator::new(
        Config::default(),
        Arc::new(TieredCache::memory_only(3600)),
    )
    .unwrap()
}

fn cse_payload() -> serde_json::Value {
    json!({
        "items": [
            {
                "link": "https://t.me/s/cryptosignals",
                "title": "Crypto Signals – Telegram",
                "snippet": "Daily crypto signals. 12.3K subscribers"
            },
            {
                "link": "https://t.me/newsdaily",
                "title": "News Daily | Telegram",
                "snippet": "All the news, all day. 1,234 members"
            },
            {
                // Same channel again via its preview URL; must dedup away.
                "link": "https://t.me/CryptoSignals",
                "title": "Crypto Signals – Telegram",
                "snippet": "Daily crypto signals."
            }
        ]
    })
}

// ─── Aggregator contract ────────────────────────────────────────────

#[tokio::test]
async fn empty_query_is_rejected_without_calling_upstream() {
    let aggregator = memory_aggregator();
    let backend = ScriptedBackend::web_index(cse_payload());

    let err = aggregator.search_with("   ", &backend).await.unwrap_err();
    assert!(matches!(err, AggregationError::InvalidQuery));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn cache_miss_then_hit_invokes_adapter_exactly_once() {
    let aggregator = memory_aggregator();
    let backend = ScriptedBackend::web_index(cse_payload());

    let first = aggregator.search_with("bitcoin", &backend).await.unwrap();
    assert_eq!(backend.call_count(), 1);

    let second = aggregator.search_with("bitcoin", &backend).await.unwrap();
    assert_eq!(backend.call_count(), 1, "second call must be served from cache");

    // Cache-hit determinism: byte-identical result lists.
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn usernames_are_unique_after_dedup() {
    let aggregator = memory_aggregator();
    let backend = ScriptedBackend::web_index(cse_payload());

    let channels = aggregator.search_with("crypto", &backend).await.unwrap();
    assert_eq!(channels.len(), 2);

    let mut usernames: Vec<&str> = channels.iter().map(|c| c.username.as_str()).collect();
    usernames.sort();
    usernames.dedup();
    assert_eq!(usernames.len(), channels.len());

    // First-seen record wins over the later duplicate without members.
    let crypto = channels.iter().find(|c| c.username == "cryptosignals").unwrap();
    assert_eq!(crypto.members, 12_300);
    assert_eq!(crypto.status, ChannelStatus::Active);
}

#[tokio::test]
async fn queries_differing_only_by_case_share_a_cache_entry() {
    let aggregator = memory_aggregator();
    let backend = ScriptedBackend::web_index(cse_payload());

    aggregator.search_with("Bitcoin", &backend).await.unwrap();
    aggregator.search_with("  bitcoin ", &backend).await.unwrap();
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn empty_upstream_result_is_cached_too() {
    let aggregator = memory_aggregator();
    let backend = ScriptedBackend::web_index(json!({ "items": [] }));

    let first = aggregator.search_with("nothing here", &backend).await.unwrap();
    assert!(first.is_empty());

    let second = aggregator.search_with("nothing here", &backend).await.unwrap();
    assert!(second.is_empty());
    assert_eq!(
        backend.call_count(),
        1,
        "an empty result must still prevent repeat upstream calls"
    );
}

#[tokio::test]
async fn upstream_failure_surfaces_typed_error() {
    let aggregator = memory_aggregator();

    let err = aggregator
        .search_with("bitcoin", &FailingBackend)
        .await
        .unwrap_err();

    match err {
        AggregationError::Upstream(upstream) => {
            assert_eq!(upstream.backend, "failing");
            assert_eq!(upstream.http_status, Some(503));
        }
        other => panic!("expected Upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn ai_payload_with_code_fence_normalizes_end_to_end() {
    let aggregator = memory_aggregator();
    let backend = ScriptedBackend::ai(
        "Sure! Here are some channels:\n```json\n[\
         {\"name\": \"Durov's Channel\", \"username\": \"durov\", \
          \"description\": \"Official updates\", \"members\": 500000, \"language\": \"English\"}\
         ]\n```",
    );

    let channels = aggregator.search_with("telegram updates", &backend).await.unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].username, "durov");
    assert_eq!(channels[0].members, 500_000);
}

// ─── Tiered cache with a shared SQLite tier ─────────────────────────

fn shared_config(tmp: &TempDir) -> Config {
    let mut config = Config::default();
    config.cache.shared_path = Some(tmp.path().join("cache.sqlite"));
    config
}

#[tokio::test]
async fn shared_tier_survives_across_cache_instances() {
    let tmp = TempDir::new().unwrap();
    let config = shared_config(&tmp);

    let cache = TieredCache::connect(&config.cache).await;
    assert!(cache.has_shared_tier());
    cache.set("k", &json!({"cached": true}), 3600).await;

    // A second instance over the same file simulates another process.
    let other = TieredCache::connect(&config.cache).await;
    assert_eq!(other.get("k").await, Some(json!({"cached": true})));
}

#[tokio::test]
async fn aggregator_hits_shared_tier_across_instances() {
    let tmp = TempDir::new().unwrap();
    let config = shared_config(&tmp);

    let first_cache = TieredCache::connect(&config.cache).await;
    let first = Aggregator::new(config.clone(), Arc::new(first_cache)).unwrap();
    let backend = ScriptedBackend::web_index(cse_payload());
    first.search_with("bitcoin", &backend).await.unwrap();
    assert_eq!(backend.call_count(), 1);

    let second_cache = TieredCache::connect(&config.cache).await;
    let second = Aggregator::new(config.clone(), Arc::new(second_cache)).unwrap();
    let other_backend = ScriptedBackend::web_index(json!({ "items": [] }));
    let channels = second.search_with("bitcoin", &other_backend).await.unwrap();

    assert_eq!(other_backend.call_count(), 0, "shared tier must serve the hit");
    assert_eq!(channels.len(), 2);
}

#[tokio::test]
async fn unreachable_shared_tier_degrades_to_memory_only() {
    let mut config = Config::default();
    // A path that can never be created.
    config.cache.shared_path = Some("/dev/null/nope/cache.sqlite".into());

    let cache = TieredCache::connect(&config.cache).await;
    assert!(!cache.has_shared_tier());

    // Tier 1 still works.
    cache.set("k", &json!(1), 3600).await;
    assert_eq!(cache.get("k").await, Some(json!(1)));
}

// ─── HTTP surface ───────────────────────────────────────────────────

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

#[tokio::test]
async fn http_api_maps_core_errors_and_rate_limits() {
    let port = find_free_port();
    let mut config = Config::default();
    config.server.bind = format!("127.0.0.1:{}", port);
    config.server.rate_limit_per_minute = 2;

    let cfg_clone = config.clone();
    tokio::spawn(async move {
        tg_scout::server::run_server(&cfg_clone).await.ok();
    });
    wait_for_server(port).await;

    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/api/search", port);

    // Empty query → 400 with the error envelope, no backend involved.
    let resp = client
        .post(&url)
        .json(&json!({ "query": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    // Second request consumes the remaining quota.
    client
        .post(&url)
        .json(&json!({ "query": "   " }))
        .send()
        .await
        .unwrap();

    // Third request is rate limited before reaching the core.
    let resp = client
        .post(&url)
        .json(&json!({ "query": "bitcoin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 429);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "rate_limited");
}
