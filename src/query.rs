//! Informal search-operator parsing.
//!
//! Users type operators the way they do in a web search box: `lang:ru`,
//! `cat:crypto`, `"exact phrase"`, `-excluded`, `intitle:signals`. This
//! module splits a raw query into a [`StructuredQuery`] without ever
//! failing: malformed operator syntax (an unterminated quote, a stray
//! hyphen) is passed through unchanged as literal text.
//!
//! Only `lang:` is removed from the free text, because it maps to a
//! native index parameter. `cat:`/`category:` are folded back into the
//! free text as bare keywords since no upstream supports real category
//! filtering, so the word itself is the best we can do. Phrases,
//! exclusions, and `intitle:` stay verbatim in the free text for indexes
//! that interpret them natively; adapters without native support read
//! them from the structured fields instead.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::StructuredQuery;

/// Language codes accepted by the `lang:` operator. Codes outside this
/// list are stripped from the query but produce no restriction.
const LANG_WHITELIST: &[&str] = &["en", "es", "ru", "de", "fr", "it", "pt", "zh"];

static LANG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"lang:([A-Za-z-]+)\s*").unwrap());
static CAT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bcat(?:egory)?:(\w+)").unwrap());
static PHRASE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).unwrap());
static EXCLUDE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)-(\w+)").unwrap());
static INTITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bintitle:(\w+)").unwrap());

/// Parse a raw query string into a [`StructuredQuery`].
///
/// Never fails; the worst case is a query that comes back as pure free
/// text with no structured fields set.
pub fn parse(raw: &str) -> StructuredQuery {
    let mut free_text = raw.trim().to_string();
    let mut language = None;

    // lang:<code>, first occurrence only. Always removed, mapped only
    // when the code is whitelisted.
    let lang_match = LANG_RE
        .captures(&free_text)
        .map(|caps| (caps[1].to_lowercase(), caps.get(0).unwrap().range()));
    if let Some((code, span)) = lang_match {
        free_text.replace_range(span, "");
        if LANG_WHITELIST.contains(&code.as_str()) {
            language = Some(code);
        }
    }

    // cat:word / category:word, any number of times, folded to the bare
    // keyword.
    free_text = CAT_RE.replace_all(&free_text, "$1").into_owned();
    free_text = free_text.trim().to_string();

    let exact_phrases: Vec<String> = PHRASE_RE
        .captures_iter(&free_text)
        .map(|c| c[1].to_string())
        .collect();

    let excluded: Vec<String> = EXCLUDE_RE
        .captures_iter(&free_text)
        .map(|c| c[1].to_string())
        .collect();

    let title_must_contain = INTITLE_RE
        .captures(&free_text)
        .map(|c| c[1].to_string());

    StructuredQuery {
        free_text,
        language,
        excluded,
        title_must_contain,
        exact_phrases,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_query_passes_through() {
        let q = parse("bitcoin trading signals");
        assert_eq!(q.free_text, "bitcoin trading signals");
        assert!(q.language.is_none());
        assert!(q.excluded.is_empty());
        assert!(q.exact_phrases.is_empty());
        assert!(q.title_must_contain.is_none());
    }

    #[test]
    fn lang_operator_extracted_and_removed() {
        let q = parse("crypto news lang:ru");
        assert_eq!(q.free_text, "crypto news");
        assert_eq!(q.language.as_deref(), Some("ru"));
    }

    #[test]
    fn lang_operator_first_match_only() {
        let q = parse("lang:es foo lang:de");
        assert_eq!(q.language.as_deref(), Some("es"));
        assert!(!q.free_text.contains("lang:es"));
        // The second occurrence is left as literal text.
        assert!(q.free_text.contains("lang:de"));
    }

    #[test]
    fn unknown_lang_code_dropped_silently() {
        let q = parse("news lang:xx");
        assert_eq!(q.free_text, "news");
        assert!(q.language.is_none());
    }

    #[test]
    fn category_operator_folds_to_bare_keyword() {
        let q = parse("cat:crypto daily category:news");
        assert_eq!(q.free_text, "crypto daily news");
    }

    #[test]
    fn phrases_recorded_but_retained() {
        let q = parse(r#""daily signals" crypto"#);
        assert_eq!(q.exact_phrases, vec!["daily signals"]);
        assert!(q.free_text.contains(r#""daily signals""#));
    }

    #[test]
    fn exclusions_recorded_but_retained() {
        let q = parse("crypto -scam -spam");
        assert_eq!(q.excluded, vec!["scam", "spam"]);
        assert!(q.free_text.contains("-scam"));
    }

    #[test]
    fn hyphen_inside_word_is_not_an_exclusion() {
        let q = parse("e-commerce deals");
        assert!(q.excluded.is_empty());
    }

    #[test]
    fn intitle_recorded_but_retained() {
        let q = parse("intitle:airdrop crypto");
        assert_eq!(q.title_must_contain.as_deref(), Some("airdrop"));
        assert!(q.free_text.contains("intitle:airdrop"));
    }

    #[test]
    fn unterminated_quote_passes_through() {
        let q = parse(r#"crypto "unterminated"#);
        assert!(q.exact_phrases.is_empty());
        assert_eq!(q.free_text, r#"crypto "unterminated"#);
    }

    #[test]
    fn whitespace_trimmed() {
        let q = parse("   bitcoin   ");
        assert_eq!(q.free_text, "bitcoin");
    }
}
