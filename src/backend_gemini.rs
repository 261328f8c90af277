//! AI-grounded search backend.
//!
//! Calls a Gemini-style `generateContent` endpoint with a web-search tool
//! enabled and asks for a JSON array of channels. The model is free to
//! wrap that array in commentary or code fences; this adapter returns the
//! raw text untouched and leaves JSON extraction to the normalizer.
//!
//! Operators have no native support here, so the prompt embeds their
//! semantics as inline rules. The `lang:` operator was already stripped
//! from the free text by the parser, which is why it is re-stated as an
//! explicit instruction when present.

use serde_json::json;

use crate::backend::{Backend, BackendKind, RawPayload};
use crate::config::GeminiConfig;
use crate::error::UpstreamError;
use crate::models::StructuredQuery;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiBackend {
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiBackend {
    /// Create the backend from config plus the `GEMINI_API_KEY`
    /// environment variable.
    pub fn from_env(config: &GeminiConfig, client: reqwest::Client) -> Result<Self, UpstreamError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| UpstreamError::new("gemini", "GEMINI_API_KEY not set"))?;
        Ok(Self {
            model: config.model.clone(),
            api_key,
            client,
        })
    }

    async fn generate(&self, prompt: &str, with_search_tool: bool) -> Result<String, UpstreamError> {
        let url = format!("{}/{}:generateContent", API_BASE, self.model);

        let mut body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "response_mime_type": "application/json" },
        });
        if with_search_tool {
            body["tools"] = json!([{ "google_search": {} }]);
        }

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::new("gemini", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(UpstreamError::with_status(
                "gemini",
                status.as_u16(),
                body_text,
            ));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::new("gemini", e.to_string()))?;

        Ok(extract_model_text(&payload))
    }

    /// Ask the model for short suggestion tags related to a query.
    /// Returns raw model text; the caller extracts the JSON array.
    pub async fn suggest(&self, query: &str) -> Result<String, UpstreamError> {
        let prompt = format!(
            "Given the user search query \"{}\" for a Telegram channel discovery app, \
             provide 5 short, relevant tags, synonyms, or related categories that would \
             help the user find what they are looking for. \
             Return strictly a JSON array of strings.",
            query
        );
        self.generate(&prompt, false).await
    }
}

#[async_trait::async_trait]
impl Backend for GeminiBackend {
    fn id(&self) -> String {
        "gemini".to_string()
    }

    fn kind(&self) -> BackendKind {
        BackendKind::AiGrounded
    }

    async fn search(&self, query: &StructuredQuery) -> Result<RawPayload, UpstreamError> {
        let prompt = build_search_prompt(query);
        let text = self.generate(&prompt, true).await?;
        Ok(RawPayload::Text(text))
    }
}

/// Build the grounded-search prompt for a parsed query.
fn build_search_prompt(query: &StructuredQuery) -> String {
    let mut prompt = format!(
        "Search for public Telegram channels related to: \"{}\".\n\
         Interpret operators: \"phrase\" means the exact phrase must appear, \
         -word excludes a topic, intitle:word requires the word in the channel title.\n\
         Focus on finding active channels. Return a list of at least 5 channels.\n\
         Respond with a JSON array of objects with fields: \
         name, username, description, members (number), language.",
        query.free_text
    );

    if let Some(code) = &query.language {
        prompt.push_str(&format!(
            "\nOnly include channels whose primary language code is \"{}\".",
            code
        ));
    }
    if !query.excluded.is_empty() {
        prompt.push_str(&format!(
            "\nExclude channels about: {}.",
            query.excluded.join(", ")
        ));
    }
    if let Some(word) = &query.title_must_contain {
        prompt.push_str(&format!(
            "\nOnly include channels whose title contains \"{}\".",
            word
        ));
    }

    prompt
}

/// Pull the generated text out of a `generateContent` response.
/// A response with no candidates yields an empty string, which the
/// normalizer turns into an empty result set.
fn extract_model_text(payload: &serde_json::Value) -> String {
    let parts = payload
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array());

    match parts {
        Some(parts) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join(""),
        None => String::new(),
    }
}
