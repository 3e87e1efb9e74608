//! JSON web search capability (Serper-style API).
//!
//! The API key comes from the `SERPER_API_KEY` environment variable; it is
//! read at construction and never stored anywhere else. A missing key is
//! reported when the capability is invoked, not at registry build time, so
//! requests whose roles never search still work without a key.

use super::{Capability, failure, names};
use crate::error::Result;
use reqwest::blocking::Client;
use serde_json::{Value, json};

/// Environment variable holding the search API key.
pub const API_KEY_VAR: &str = "SERPER_API_KEY";

/// Default search endpoint.
const DEFAULT_ENDPOINT: &str = "https://google.serper.dev/search";

/// Number of results requested per search.
const RESULT_COUNT: u32 = 5;

/// Web search backed by a Serper-compatible JSON API.
pub struct WebSearch {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl WebSearch {
    /// Build the capability, reading the API key from the environment.
    pub fn from_env(client: Client) -> Self {
        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: std::env::var(API_KEY_VAR).ok(),
        }
    }

    /// Override the endpoint (used by tests against a local server).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Capability for WebSearch {
    fn name(&self) -> &str {
        names::WEB_SEARCH
    }

    fn invoke(&self, query: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            failure(
                names::WEB_SEARCH,
                format!("{} is not set", API_KEY_VAR),
            )
        })?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", api_key)
            .json(&json!({ "q": query, "num": RESULT_COUNT }))
            .send()
            .map_err(|e| failure(names::WEB_SEARCH, format!("request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| failure(names::WEB_SEARCH, format!("search API error: {}", e)))?;

        let body: Value = response
            .json()
            .map_err(|e| failure(names::WEB_SEARCH, format!("invalid response: {}", e)))?;

        Ok(format_results(&body))
    }
}

/// Render the API response as plain text usable in a prompt.
fn format_results(body: &Value) -> String {
    let mut lines = Vec::new();

    if let Some(organic) = body.get("organic").and_then(Value::as_array) {
        for entry in organic {
            let title = entry.get("title").and_then(Value::as_str).unwrap_or("");
            let snippet = entry.get("snippet").and_then(Value::as_str).unwrap_or("");
            let link = entry.get("link").and_then(Value::as_str).unwrap_or("");
            if title.is_empty() && snippet.is_empty() {
                continue;
            }
            lines.push(format!("- {} : {} ({})", title, snippet, link));
        }
    }

    if lines.is_empty() {
        "Aucun résultat de recherche.".to_string()
    } else {
        lines.join("\n")
    }
}
