//! External capabilities agents may use during task execution.
//!
//! A capability is a named, blocking external action (web search, site
//! content retrieval, local file read). The registry maps capability names
//! declared in `roles.yaml` to instances; resolution is permissive by
//! design: unknown names are dropped rather than rejected, so definition
//! files may declare capabilities a given build does not provide.
//!
//! Capability failures during execution become the owning task's Failed
//! state; they are never swallowed.

pub mod file_read;
pub mod site_content;
pub mod web_search;

pub use file_read::FileRead;
pub use site_content::SiteContent;
pub use web_search::WebSearch;

use crate::error::{PlumeError, Result};
use crate::request::GenerationRequest;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Capability names recognized by the standard registry.
pub mod names {
    /// JSON web search (Serper-style API).
    pub const WEB_SEARCH: &str = "web_search";
    /// Plain fetch of the company site.
    pub const SITE_CONTENT: &str = "site_content";
    /// Read of the résumé text artifact.
    pub const FILE_READ: &str = "file_read";
}

/// HTTP timeout for the outbound capabilities.
const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

/// A named external action an agent may invoke while its task is Running.
///
/// `invoke` is blocking: the executor waits for it to settle before the
/// task can complete.
pub trait Capability: Send + Sync {
    /// The registry name of this capability.
    fn name(&self) -> &str;

    /// Perform the action. `query` is the resolved instruction text of the
    /// task being executed; capabilities bound to fixed resources (file
    /// read, site fetch) may ignore it.
    fn invoke(&self, query: &str) -> Result<String>;
}

/// Build a capability failure error.
pub(crate) fn failure(name: &str, message: impl std::fmt::Display) -> PlumeError {
    PlumeError::Capability {
        name: name.to_string(),
        message: message.to_string(),
    }
}

/// Name-keyed set of capability instances.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    entries: BTreeMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability under its own name. Re-registering a name
    /// replaces the previous instance.
    pub fn register(&mut self, capability: Arc<dyn Capability>) {
        self.entries
            .insert(capability.name().to_string(), capability);
    }

    /// Look up a capability by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.entries.get(name).cloned()
    }

    /// Resolve a list of declared names to instances, preserving the
    /// declaration order. Unknown names are silently dropped.
    pub fn resolve(&self, declared: &[String]) -> Vec<Arc<dyn Capability>> {
        declared.iter().filter_map(|n| self.get(n)).collect()
    }

    /// The standard registry for one generation request: web search, site
    /// content retrieval, and a file read bound to the résumé artifact.
    pub fn standard(request: &GenerationRequest) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| PlumeError::Config(format!("failed to build HTTP client: {}", e)))?;

        let mut registry = Self::new();
        registry.register(Arc::new(WebSearch::from_env(client.clone())));
        registry.register(Arc::new(SiteContent::for_company(client, &request.company)));
        registry.register(Arc::new(FileRead::new(&request.cv_path)));
        Ok(registry)
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
