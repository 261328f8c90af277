//! Tiered response cache.
//!
//! Two tiers in front of the rate-limited upstreams:
//!
//! - **Tier 1**: in-process `HashMap` behind `RwLock`, always present.
//! - **Tier 2**: optional shared SQLite file, so separate processes on
//!   one host reuse each other's results. A missing or failing shared
//!   tier is never fatal: every error logs and degrades to
//!   tier-1-only behavior.
//!
//! Reads check the shared tier first when it is connected (it may hold
//! fresher cross-process entries) and fall through to tier 1; a shared
//! hit backfills tier 1. Writes go to every available tier, tier 1
//! always. Entries expire by TTL only and are evicted lazily.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::db;

/// A key-value store with per-entry TTL.
///
/// Both operations are total: a failing tier behaves as a miss (`get`)
/// or a no-op (`set`) and never surfaces an error to the caller.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: &Value, ttl_secs: u64);
}

/// Build the cache key for a search request.
///
/// `{backend_id}:{trimmed lowercased raw query}`. The backend id embeds
/// the external engine id where one exists, so results from different
/// indices never collide. Operators stay in the key as typed; no
/// operator-aware canonicalization.
pub fn cache_key(backend_id: &str, raw_query: &str) -> String {
    format!("{}:{}", backend_id, raw_query.trim().to_lowercase())
}

/// Cache key for suggestion lookups.
pub fn suggestion_key(raw_query: &str) -> String {
    format!("suggest:{}", raw_query.trim().to_lowercase())
}

// ============ Tier 1: in-process ============

struct MemoryEntry {
    payload: Value,
    expires_at: i64,
}

/// In-process cache tier. Bounded by TTL per entry; expired entries are
/// skipped on read and purged on the next write.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, MemoryEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let now = Utc::now().timestamp();
        let entries = self.entries.read().unwrap();
        entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.payload.clone())
    }

    async fn set(&self, key: &str, value: &Value, ttl_secs: u64) {
        let now = Utc::now().timestamp();
        let mut entries = self.entries.write().unwrap();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            MemoryEntry {
                payload: value.clone(),
                expires_at: now + ttl_secs as i64,
            },
        );
    }
}

// ============ Tier 2: shared SQLite ============

/// Shared cache tier backed by a SQLite file. Any storage error logs
/// and degrades to a miss/no-op.
pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CacheStore for SqliteCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let row = match sqlx::query("SELECT payload, expires_at FROM cache_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(row) => row?,
            Err(e) => {
                warn!(key, error = %e, "shared cache read failed, treating as miss");
                return None;
            }
        };

        let expires_at: i64 = row.get("expires_at");
        if expires_at <= Utc::now().timestamp() {
            return None;
        }

        let payload: String = row.get("payload");
        serde_json::from_str(&payload).ok()
    }

    async fn set(&self, key: &str, value: &Value, ttl_secs: u64) {
        let expires_at = Utc::now().timestamp() + ttl_secs as i64;
        let payload = value.to_string();

        let result =
            sqlx::query("INSERT OR REPLACE INTO cache_entries (key, payload, expires_at) VALUES (?, ?, ?)")
                .bind(key)
                .bind(payload)
                .bind(expires_at)
                .execute(&self.pool)
                .await;

        if let Err(e) = result {
            warn!(key, error = %e, "shared cache write failed, entry kept tier-1 only");
        }
    }
}

// ============ Tiered composition ============

/// The two-tier cache handed to the aggregator.
pub struct TieredCache {
    local: MemoryCache,
    shared: Option<SqliteCache>,
    ttl_secs: u64,
}

impl TieredCache {
    /// Tier-1-only cache. Used in tests and whenever no shared path is
    /// configured.
    pub fn memory_only(ttl_secs: u64) -> Self {
        Self {
            local: MemoryCache::new(),
            shared: None,
            ttl_secs,
        }
    }

    /// Connect both tiers from config. A shared tier that fails to open
    /// logs a warning and is dropped; this constructor itself never
    /// fails.
    pub async fn connect(config: &CacheConfig) -> Self {
        let shared = match &config.shared_path {
            Some(path) => match db::connect(path).await {
                Ok(pool) => {
                    debug!(path = %path.display(), "shared cache tier connected");
                    Some(SqliteCache::new(pool))
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e,
                        "shared cache unavailable, continuing tier-1 only");
                    None
                }
            },
            None => None,
        };

        Self {
            local: MemoryCache::new(),
            shared,
            ttl_secs: config.ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn has_shared_tier(&self) -> bool {
        self.shared.is_some()
    }
}

#[async_trait]
impl CacheStore for TieredCache {
    async fn get(&self, key: &str) -> Option<Value> {
        if let Some(shared) = &self.shared {
            if let Some(value) = shared.get(key).await {
                // Backfill so later reads in this process stay local.
                self.local.set(key, &value, self.ttl_secs).await;
                return Some(value);
            }
        }
        self.local.get(key).await
    }

    async fn set(&self, key: &str, value: &Value, ttl_secs: u64) {
        self.local.set(key, value, ttl_secs).await;
        if let Some(shared) = &self.shared {
            shared.set(key, value, ttl_secs).await;
        }
    }
}
