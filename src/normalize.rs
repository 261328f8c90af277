//! Per-backend payload normalization.
//!
//! Converts each backend's raw payload into the canonical [`Channel`]
//! shape. Pure transformation: no I/O, no side effects beyond fresh id
//! generation. Individual field extraction degrades to sentinels
//! independently; a malformed members string or missing snippet never
//! drops a record. Only a structurally unrecoverable payload (not a
//! list at all) yields an empty result list.

use serde_json::Value;
use uuid::Uuid;

use crate::backend::{BackendKind, RawPayload};
use crate::extract;
use crate::models::{Category, Channel, NO_DESCRIPTION};

/// Normalize one backend call's payload into canonical channel records.
pub fn normalize(kind: BackendKind, raw: &RawPayload) -> Vec<Channel> {
    match (kind, raw) {
        (BackendKind::AiGrounded, RawPayload::Text(text)) => normalize_ai(text),
        (BackendKind::AiGrounded, RawPayload::Json(json)) => normalize_ai_items(json),
        (BackendKind::WebIndex, RawPayload::Json(json)) => normalize_web_index(json),
        (BackendKind::RawWeb, RawPayload::Json(json)) => normalize_raw_web(json),
        // A web backend handing back free text has nothing we can use.
        (_, RawPayload::Text(_)) => Vec::new(),
    }
}

/// Extract the first-`[`-to-last-`]` substring of free-form model output
/// and parse it as JSON.
///
/// Models wrap their arrays in code fences and commentary; slicing to
/// the outermost brackets strips all of that. Returns `None` when no
/// bracket pair exists or the slice is not valid JSON; callers treat
/// that as an empty result set, not an error.
pub fn extract_json_array(text: &str) -> Option<Value> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn normalize_ai(text: &str) -> Vec<Channel> {
    match extract_json_array(text) {
        Some(json) => normalize_ai_items(&json),
        None => Vec::new(),
    }
}

fn normalize_ai_items(json: &Value) -> Vec<Channel> {
    let items = match json.as_array() {
        Some(items) => items,
        None => return Vec::new(),
    };

    items.iter().map(ai_item_to_channel).collect()
}

fn ai_item_to_channel(item: &Value) -> Channel {
    let name = item
        .get("name")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown Channel")
        .to_string();
    let username = item
        .get("username")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_start_matches('@').to_lowercase())
        .unwrap_or_else(|| "unknown".to_string());
    let description = item
        .get("description")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_DESCRIPTION)
        .to_string();
    // Models sometimes emit counts as floats or strings.
    let members = match item.get("members") {
        Some(Value::Number(n)) => n.as_f64().filter(|v| *v >= 0.0).unwrap_or(0.0) as u64,
        Some(Value::String(s)) => s.parse::<u64>().unwrap_or(0),
        _ => 0,
    };
    let declared = item.get("language").and_then(|v| v.as_str());
    let text = format!("{} {}", name, description);

    Channel {
        id: format!("gen-{}", Uuid::new_v4()),
        language: extract::detect_language(&text, declared),
        status: extract::classify_status(&text),
        avatar_url: extract::placeholder_avatar(&name),
        name,
        username,
        description,
        members,
        category: Category::All,
        last_active: "Recently".to_string(),
        verified: false,
    }
}

fn normalize_web_index(json: &Value) -> Vec<Channel> {
    let items = match json.get("items").and_then(|v| v.as_array()) {
        Some(items) => items,
        None => return Vec::new(),
    };

    items
        .iter()
        .filter(|item| link_of(item).contains("t.me/"))
        .map(web_index_item_to_channel)
        .collect()
}

fn link_of(item: &Value) -> &str {
    item.get("link").and_then(|v| v.as_str()).unwrap_or("")
}

fn web_index_item_to_channel(item: &Value) -> Channel {
    let username = extract::extract_username(link_of(item));

    let metatags = item
        .pointer("/pagemap/metatags/0")
        .cloned()
        .unwrap_or(Value::Null);

    let raw_title = metatags
        .get("og:title")
        .and_then(|v| v.as_str())
        .or_else(|| item.get("title").and_then(|v| v.as_str()))
        .unwrap_or("");
    let description = metatags
        .get("og:description")
        .and_then(|v| v.as_str())
        .or_else(|| item.get("snippet").and_then(|v| v.as_str()))
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_DESCRIPTION)
        .to_string();
    let snippet = item.get("snippet").and_then(|v| v.as_str()).unwrap_or("");

    let status = extract::classify_status(&format!("{} {}", raw_title, description));
    let name = extract::clean_name(raw_title, &username);

    let avatar_url = metatags
        .get("og:image")
        .and_then(|v| v.as_str())
        .or_else(|| {
            item.pointer("/pagemap/cse_image/0/src")
                .and_then(|v| v.as_str())
        })
        .filter(|url| !extract::is_generic_logo(url))
        .map(|url| url.to_string())
        .unwrap_or_else(|| extract::placeholder_avatar(&name));

    let members = match extract::extract_members(&description) {
        0 => extract::extract_members(snippet),
        n => n,
    };

    let language = extract::detect_language(&format!("{} {}", description, name), None);

    Channel {
        id: format!("cse-{}", Uuid::new_v4()),
        name,
        username,
        description,
        members,
        category: Category::All,
        language,
        status,
        last_active: "Recently".to_string(),
        avatar_url,
        verified: false,
    }
}

fn normalize_raw_web(json: &Value) -> Vec<Channel> {
    let results = match json.pointer("/web/results").and_then(|v| v.as_array()) {
        Some(results) => results,
        None => return Vec::new(),
    };

    results
        .iter()
        .filter(|r| url_of(r).contains("t.me/"))
        .map(raw_web_result_to_channel)
        .collect()
}

fn url_of(result: &Value) -> &str {
    result.get("url").and_then(|v| v.as_str()).unwrap_or("")
}

fn raw_web_result_to_channel(result: &Value) -> Channel {
    let username = extract::extract_username(url_of(result));

    let title = result.get("title").and_then(|v| v.as_str()).unwrap_or("");
    let description = result
        .get("description")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_DESCRIPTION)
        .to_string();

    let name = extract::clean_name(title, &username);
    let status = extract::classify_status(&format!("{} {}", title, description));
    let declared = result.get("language").and_then(|v| v.as_str());
    let language = extract::detect_language(&format!("{} {}", description, name), declared);
    let members = extract::extract_members(&description);
    let last_active = result
        .get("age")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("Recently")
        .to_string();

    Channel {
        id: format!("web-{}", Uuid::new_v4()),
        avatar_url: extract::placeholder_avatar(&name),
        name,
        username,
        description,
        members,
        category: Category::All,
        language,
        status,
        last_active,
        verified: false,
    }
}
