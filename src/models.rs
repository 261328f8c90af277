//! Core data models used throughout tg-scout.
//!
//! These types represent the parsed query, the canonical channel record,
//! and the enums every backend's output is normalized into.

use serde::{Deserialize, Serialize};

/// Sentinel description used when an upstream supplies none.
pub const NO_DESCRIPTION: &str = "No description available.";

/// Canonical channel record, independent of which backend produced it.
///
/// Every field is always populated: heuristic fields fall back to their
/// documented sentinel (`0` members, `Language::All`, `Category::All`)
/// rather than being absent. `id` is regenerated at normalization time
/// and is not stable across searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub username: String,
    pub description: String,
    /// Approximate subscriber count. `0` means unknown, never "zero
    /// subscribers"; web results rarely expose real counts.
    pub members: u64,
    pub category: Category,
    pub language: Language,
    pub status: ChannelStatus,
    /// Free-text relative time ("3 hours", "Recently") or "Unknown".
    pub last_active: String,
    pub avatar_url: String,
    pub verified: bool,
}

/// Channel topic category. `All` doubles as "uncategorized" since no backend
/// reliably supplies this signal, so web-sourced records default to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    All,
    Crypto,
    News,
    Tech,
    Movies,
    Fitness,
    Education,
    Humor,
    Finance,
    Art,
}

/// Detected content language. `All` is the unknown sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    All,
    English,
    Spanish,
    Russian,
    Hindi,
    German,
}

/// Availability status classified from upstream page text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelStatus {
    Active,
    Banned,
    Deleted,
    Unknown,
}

impl std::fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChannelStatus::Active => "Active",
            ChannelStatus::Banned => "Banned",
            ChannelStatus::Deleted => "Deleted",
            ChannelStatus::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Language::All => "All",
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::Russian => "Russian",
            Language::Hindi => "Hindi",
            Language::German => "German",
        };
        write!(f, "{}", s)
    }
}

/// Parsed, backend-agnostic representation of a raw search string.
///
/// Produced by [`crate::query::parse`] once per request and discarded
/// after normalization. Exact phrases, exclusions, and `intitle:` terms
/// are recorded here for adapters that build natural-language prompts,
/// but remain verbatim in `free_text` for indexes with native operator
/// support.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredQuery {
    pub free_text: String,
    /// Whitelisted two-letter language code from a `lang:` operator.
    pub language: Option<String>,
    pub excluded: Vec<String>,
    pub title_must_contain: Option<String>,
    pub exact_phrases: Vec<String>,
}
