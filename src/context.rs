//! Per-request substitution context.
//!
//! The context is a flat mapping from placeholder name to string value,
//! built once from the request's form fields and immutable afterwards.
//! Every placeholder a role or task template may reference must be present
//! here; the key set is fixed and known at build time.

use crate::request::GenerationRequest;
use std::collections::BTreeMap;

/// Placeholder keys available to role and task templates.
pub mod keys {
    /// Free-text candidate notes (with the style directive appended).
    pub const CANDIDATE_PROFILE: &str = "candidate_profile";
    /// Path to the résumé text artifact.
    pub const CV_PATH: &str = "cv_path";
    /// Company identifier (name or site).
    pub const COMPANY_URL: &str = "company_url";
    /// Job/role description text.
    pub const HIRING_NEEDS: &str = "hiring_needs";
    /// Grammatical gender marker for the letter.
    pub const GENDER: &str = "gender";
}

/// Fixed French orthography/punctuation directive appended to the candidate
/// notes before they enter the context. This is a post-processing rule of
/// the context builder, not an option.
pub const STYLE_DIRECTIVE: &str = ". Important : utiliser les principes de \
ponctuation et d'orthographe du français : pas de tiret semi-cadratin, \
majuscules uniquement pour les noms propres et en début de phrase.";

/// The per-request placeholder mapping.
#[derive(Debug, Clone)]
pub struct Context {
    vars: BTreeMap<String, String>,
}

impl Context {
    /// Build the context from a validated request.
    ///
    /// The candidate notes get [`STYLE_DIRECTIVE`] appended; all other
    /// fields are carried verbatim.
    pub fn build(request: &GenerationRequest) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert(
            keys::CANDIDATE_PROFILE.to_string(),
            format!("{}{}", request.candidate_profile, STYLE_DIRECTIVE),
        );
        vars.insert(keys::CV_PATH.to_string(), request.cv_path.clone());
        vars.insert(keys::COMPANY_URL.to_string(), request.company.clone());
        vars.insert(keys::HIRING_NEEDS.to_string(), request.job_description.clone());
        vars.insert(keys::GENDER.to_string(), request.gender.as_str().to_string());
        Self { vars }
    }

    /// Build a context from explicit pairs. Intended for tests and for the
    /// `check` command's synthetic context.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a placeholder value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// The full mapping, for template resolution.
    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// The fixed key set every request-built context provides.
    pub fn known_keys() -> [&'static str; 5] {
        [
            keys::CANDIDATE_PROFILE,
            keys::CV_PATH,
            keys::COMPANY_URL,
            keys::HIRING_NEEDS,
            keys::GENDER,
        ]
    }
}
