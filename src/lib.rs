//! # tg-scout
//!
//! Multi-backend Telegram channel discovery: a search-result aggregation
//! and normalization pipeline over heterogeneous external search
//! backends, fronted by a tiered response cache.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌────────────────────────┐
//! │ raw query    │──▶│  Operator  │──▶│       Aggregator       │
//! │ + backend id │   │   Parser   │   │ cache → adapter →      │
//! └──────────────┘   └────────────┘   │ normalize → dedup      │
//!                                     └─────┬────────────┬─────┘
//!                          ┌────────────────┤            │
//!                          ▼                ▼            ▼
//!                    ┌──────────┐    ┌────────────┐ ┌─────────┐
//!                    │ Backends │    │   Tiered   │ │ Channel │
//!                    │ AI/CSE/  │    │   Cache    │ │ records │
//!                    │ Brave    │    │ mem+SQLite │ └─────────┘
//!                    └──────────┘    └────────────┘
//! ```
//!
//! Each backend returns a raw, backend-specific payload; the normalizer
//! converts it into canonical [`models::Channel`] records with
//! best-effort heuristics (member counts, language, availability
//! status), the dedup stage collapses repeated usernames, and the whole
//! result is written through the cache so an identical query inside the
//! TTL window never reaches the upstream again.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Canonical channel record and query types |
//! | [`query`] | Informal search-operator parsing |
//! | [`backend`] | Adapter trait, selection, and factory |
//! | [`backend_gemini`] | AI-grounded search adapter |
//! | [`backend_cse`] | Structured web-index adapter |
//! | [`backend_brave`] | Raw web-search adapter |
//! | [`extract`] | Pure field-extraction heuristics |
//! | [`normalize`] | Per-backend payload normalization |
//! | [`dedup`] | Duplicate collapse by username |
//! | [`cache`] | Tiered TTL cache |
//! | [`aggregator`] | Request orchestration |
//! | [`search`] | CLI command implementations |
//! | [`server`] | HTTP API server |
//! | [`db`] | Shared-cache SQLite connection |

pub mod aggregator;
pub mod backend;
pub mod backend_brave;
pub mod backend_cse;
pub mod backend_gemini;
pub mod cache;
pub mod config;
pub mod db;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod query;
pub mod search;
pub mod server;
