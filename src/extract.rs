//! Heuristic field extraction from upstream page text.
//!
//! Search indexes return scraped `t.me` page titles and snippets, not
//! structured channel metadata. Everything here is a pure function over
//! strings: no I/O, no hidden state, each extractor degrading to its
//! documented sentinel (`0` members, `Language::All`, `Active`) instead
//! of failing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{ChannelStatus, Language};

static BANNED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)unavailable due to|copyright infringement|pornograph|blocked in your country|violated.{0,60}local laws|legal.{0,60}grounds",
    )
    .unwrap()
});

static DELETED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)channel not found|page not found|deleted account|doesn['’]t exist|no longer exists",
    )
    .unwrap()
});

static MEMBERS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,\s]\d+)*)\s*([km])?\s*(?:subscribers|members|subs)\b").unwrap()
});

/// Extract the channel handle from a `t.me/...` URL.
///
/// The `/s/` preview-mode segment is stripped first so that
/// `https://t.me/s/cryptosignals` yields `cryptosignals`, not `s`.
/// Returns the literal `"unknown"` when no path segment exists.
pub fn extract_username(url: &str) -> String {
    let cleaned = url.replacen("/s/", "/", 1);
    cleaned
        .split('/')
        .filter(|part| !part.is_empty())
        .last()
        .map(|part| part.to_lowercase())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Clean upstream boilerplate from a scraped page title.
///
/// Falls back to the extracted username when nothing usable is left
/// (banned and deleted pages often title themselves just "Telegram").
pub fn clean_name(raw_title: &str, username: &str) -> String {
    static SUFFIX_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r" – Telegram.*$").unwrap());
    static SUFFIX_PIPE: Lazy<Regex> = Lazy::new(|| Regex::new(r" \| Telegram.*$").unwrap());
    static PREFIX_CONTACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Telegram: Contact @").unwrap());
    static PREFIX_PLAIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Telegram: ").unwrap());

    let name = SUFFIX_DASH.replace(raw_title, "");
    let name = SUFFIX_PIPE.replace(&name, "");
    let name = PREFIX_CONTACT.replace(&name, "");
    let name = PREFIX_PLAIN.replace(&name, "");
    let name = name.trim();

    if name.is_empty() || name.eq_ignore_ascii_case("telegram") {
        username.to_string()
    } else {
        name.to_string()
    }
}

/// Classify a channel's availability from its title and description.
///
/// Banned patterns are checked before Deleted ones: a takedown page can
/// resemble both, and Banned is the more specific state.
pub fn classify_status(text: &str) -> ChannelStatus {
    if BANNED_RE.is_match(text) {
        ChannelStatus::Banned
    } else if DELETED_RE.is_match(text) {
        ChannelStatus::Deleted
    } else {
        ChannelStatus::Active
    }
}

/// Extract a subscriber count from free text, e.g. "12.3K subscribers".
///
/// `k`/`m` suffixes multiply by 1 000 / 1 000 000. A comma is a decimal
/// separator only when a multiplier suffix is present ("12,3K" → 12300);
/// without one it is treated as a thousands separator and stripped
/// ("1,234 members" → 1234). No match returns `0` (unknown).
pub fn extract_members(text: &str) -> u64 {
    let caps = match MEMBERS_RE.captures(text) {
        Some(caps) => caps,
        None => return 0,
    };

    let mut number: String = caps[1].chars().filter(|c| !c.is_whitespace()).collect();
    let multiplier = match caps.get(2).map(|m| m.as_str().to_lowercase()) {
        Some(s) if s == "k" => 1_000.0,
        Some(s) if s == "m" => 1_000_000.0,
        _ => 1.0,
    };

    if multiplier > 1.0 {
        number = number.replace(',', ".");
    } else {
        number = number.replace(',', "");
    }

    match number.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => (value * multiplier).floor() as u64,
        _ => 0,
    }
}

/// Detect the channel language, best effort.
///
/// Priority: script ranges (Cyrillic, Devanagari), then an upstream
/// declared language string, then a small stop-word sweep with English
/// checked last. `Language::All` is the unknown sentinel.
pub fn detect_language(text: &str, declared: Option<&str>) -> Language {
    if text.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c)) {
        return Language::Russian;
    }
    if text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c)) {
        return Language::Hindi;
    }

    if let Some(raw) = declared {
        let mapped = map_declared_language(raw);
        if mapped != Language::All {
            return mapped;
        }
    }

    // Pad with spaces so single-word articles match on word boundaries.
    let padded = format!(" {} ", text.to_lowercase());
    const GERMAN: &[&str] = &[" der ", " und ", " ist ", " die ", " das "];
    const SPANISH: &[&str] = &[" de ", " y ", " el ", " la ", " en español "];
    const ENGLISH: &[&str] = &[" the ", " and ", " of ", " in ", " for "];

    if GERMAN.iter().any(|w| padded.contains(w)) {
        return Language::German;
    }
    if SPANISH.iter().any(|w| padded.contains(w)) {
        return Language::Spanish;
    }
    if ENGLISH.iter().any(|w| padded.contains(w)) {
        return Language::English;
    }

    Language::All
}

/// Map an upstream-declared language string (a name like "Русский" or a
/// two-letter code like "en-US") to a [`Language`].
pub fn map_declared_language(raw: &str) -> Language {
    let lower = raw.trim().to_lowercase();
    if lower.is_empty() {
        return Language::All;
    }
    if lower.contains("english") {
        return Language::English;
    }
    if lower.contains("spanish") || lower.contains("español") {
        return Language::Spanish;
    }
    if lower.contains("russian") || lower.contains("русский") {
        return Language::Russian;
    }
    if lower.contains("hindi") {
        return Language::Hindi;
    }
    if lower.contains("german") || lower.contains("deutsch") {
        return Language::German;
    }
    match lower.get(..2) {
        Some("en") => Language::English,
        Some("es") => Language::Spanish,
        Some("ru") => Language::Russian,
        Some("hi") => Language::Hindi,
        Some("de") => Language::German,
        _ => Language::All,
    }
}

/// Placeholder avatar URL generated from the cleaned channel name.
pub fn placeholder_avatar(name: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background=229ED9&color=fff",
        urlencoding::encode(name)
    )
}

/// Whether an upstream image URL is a generic platform logo rather than
/// a real channel avatar.
pub fn is_generic_logo(url: &str) -> bool {
    url.contains("telegram-logo")
}
