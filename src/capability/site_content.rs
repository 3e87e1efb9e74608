//! Company site retrieval capability.
//!
//! Fetches the company's public site once and returns a tag-stripped,
//! size-bounded text extract. The target URL is derived from the company
//! field at construction: a full URL is used as-is, a bare domain gets a
//! scheme, and a plain name is expanded to `https://www.{name}.com`.

use super::{Capability, failure, names};
use crate::error::Result;
use regex::Regex;
use reqwest::blocking::Client;
use std::sync::LazyLock;

/// Upper bound on the extract, in characters. Keeps the prompt bounded
/// even for heavy marketing pages.
const MAX_EXTRACT_CHARS: usize = 4000;

static SCRIPT_BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)\b.*?</(script|style|noscript)>")
        .expect("invalid script block regex")
});

static TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("invalid tag regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

/// Fetches a fixed site and returns a readable text extract.
pub struct SiteContent {
    client: Client,
    url: String,
}

impl SiteContent {
    /// Derive the site URL from the request's company field.
    pub fn for_company(client: Client, company: &str) -> Self {
        Self {
            client,
            url: site_url(company),
        }
    }

    /// The derived URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Capability for SiteContent {
    fn name(&self) -> &str {
        names::SITE_CONTENT
    }

    fn invoke(&self, _query: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| {
                failure(
                    names::SITE_CONTENT,
                    format!("failed to fetch '{}': {}", self.url, e),
                )
            })?
            .error_for_status()
            .map_err(|e| {
                failure(
                    names::SITE_CONTENT,
                    format!("'{}' returned an error status: {}", self.url, e),
                )
            })?;

        let html = response.text().map_err(|e| {
            failure(
                names::SITE_CONTENT,
                format!("failed to read body of '{}': {}", self.url, e),
            )
        })?;

        let text = strip_tags(&html);
        if text.is_empty() {
            return Err(failure(
                names::SITE_CONTENT,
                format!("'{}' produced no readable text", self.url),
            ));
        }

        Ok(text)
    }
}

/// Derive a fetchable URL from the company field.
fn site_url(company: &str) -> String {
    let company = company.trim();
    if company.contains("://") {
        company.to_string()
    } else if company.contains('.') {
        format!("https://{}", company)
    } else {
        format!("https://www.{}.com", company.to_lowercase())
    }
}

/// Strip markup and collapse whitespace, bounding the result size.
fn strip_tags(html: &str) -> String {
    let without_blocks = SCRIPT_BLOCKS.replace_all(html, " ");
    let without_tags = TAGS.replace_all(&without_blocks, " ");
    let collapsed = WHITESPACE.replace_all(&without_tags, " ");
    collapsed.trim().chars().take(MAX_EXTRACT_CHARS).collect()
}
