//! Generation request: the raw form fields for one cover letter.
//!
//! A request is built once per generation, validated before the pipeline is
//! constructed, and discarded when the request ends. It also produces the
//! session-parameter export handed to downstream exporters for audit.

use crate::config::roles::names as role_names;
use crate::error::{PlumeError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Character cap applied to the job description in the session-parameter
/// export. Longer descriptions are cut and get an ellipsis marker.
pub const JOB_DESCRIPTION_EXPORT_LIMIT: usize = 500;

/// Marker appended to a truncated job description in the export.
const ELLIPSIS_MARKER: &str = "...";

/// Grammatical gender marker used to steer letter agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Feminine,
    Masculine,
}

impl Gender {
    /// The French form injected into templates and exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Feminine => "féminin",
            Gender::Masculine => "masculin",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = PlumeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "féminin" | "feminin" | "f" => Ok(Gender::Feminine),
            "masculin" | "m" => Ok(Gender::Masculine),
            other => Err(PlumeError::Config(format!(
                "unknown gender marker '{}': expected 'féminin' or 'masculin'",
                other
            ))),
        }
    }
}

/// Per-role sampling temperatures, caller-chosen in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperatures {
    pub research: f32,
    pub cv_extractor: f32,
    pub writer: f32,
    pub review: f32,
}

impl Default for Temperatures {
    /// Defaults matching the original slider presets: creative research,
    /// strict extraction, mid writing, careful review.
    fn default() -> Self {
        Self {
            research: 0.8,
            cv_extractor: 0.3,
            writer: 0.6,
            review: 0.4,
        }
    }
}

impl Temperatures {
    /// The override map consumed by the agent factory, keyed by role name.
    pub fn overrides(&self) -> BTreeMap<String, f32> {
        BTreeMap::from([
            (role_names::RESEARCH.to_string(), self.research),
            (role_names::CV_EXTRACTOR.to_string(), self.cv_extractor),
            (role_names::WRITER.to_string(), self.writer),
            (role_names::REVIEW.to_string(), self.review),
        ])
    }

    /// Check every value is a sampling temperature in [0.0, 1.0].
    pub fn validate(&self) -> Result<()> {
        for (role, value) in [
            (role_names::RESEARCH, self.research),
            (role_names::CV_EXTRACTOR, self.cv_extractor),
            (role_names::WRITER, self.writer),
            (role_names::REVIEW, self.review),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PlumeError::Config(format!(
                    "temperature for role '{}' must be in [0.0, 1.0], got {}",
                    role, value
                )));
            }
        }
        Ok(())
    }
}

/// The raw form fields for one generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Free-text candidate notes the models cannot guess.
    pub candidate_profile: String,
    /// Gender marker for letter agreement.
    pub gender: Gender,
    /// Path to the résumé text artifact (already converted upstream).
    pub cv_path: String,
    /// Company name or site.
    pub company: String,
    /// Job/role description, or a few keywords for a spontaneous
    /// application.
    pub job_description: String,
    /// Per-role sampling temperatures.
    pub temperatures: Temperatures,
}

impl GenerationRequest {
    /// Validate the request preconditions.
    ///
    /// The résumé reference, company name, and job description must be
    /// non-empty; temperatures must be in range. This is checked before
    /// the pipeline is built, never retried internally.
    pub fn validate(&self) -> Result<()> {
        if self.cv_path.trim().is_empty() {
            return Err(PlumeError::MissingRequiredField("résumé path"));
        }
        if self.company.trim().is_empty() {
            return Err(PlumeError::MissingRequiredField("company name"));
        }
        if self.job_description.trim().is_empty() {
            return Err(PlumeError::MissingRequiredField("job description"));
        }
        self.temperatures.validate()
    }

    /// The flat session-parameter mapping handed to exporters for audit.
    ///
    /// The candidate notes are exported as they enter the pipeline, style
    /// directive included.
    pub fn session_params(&self) -> SessionParams {
        SessionParams {
            company: self.company.clone(),
            gender: self.gender.as_str().to_string(),
            candidate_profile: format!(
                "{}{}",
                self.candidate_profile,
                crate::context::STYLE_DIRECTIVE
            ),
            research_temperature: self.temperatures.research,
            cv_extractor_temperature: self.temperatures.cv_extractor,
            writer_temperature: self.temperatures.writer,
            review_temperature: self.temperatures.review,
            job_description: truncate_chars(&self.job_description, JOB_DESCRIPTION_EXPORT_LIMIT),
        }
    }
}

/// Session parameters recorded alongside a generated letter.
///
/// Field labels match the exported document's French table headings.
#[derive(Debug, Clone, Serialize)]
pub struct SessionParams {
    #[serde(rename = "Entreprise")]
    pub company: String,
    #[serde(rename = "Genre candidat")]
    pub gender: String,
    #[serde(rename = "Profil candidat")]
    pub candidate_profile: String,
    #[serde(rename = "Température recherche")]
    pub research_temperature: f32,
    #[serde(rename = "Température extracteur CV")]
    pub cv_extractor_temperature: f32,
    #[serde(rename = "Température rédacteur")]
    pub writer_temperature: f32,
    #[serde(rename = "Température relecteur")]
    pub review_temperature: f32,
    #[serde(rename = "Description du poste")]
    pub job_description: String,
}

/// Cut `text` to at most `max` characters, appending the ellipsis marker
/// when anything was cut. Counts characters, not bytes.
fn truncate_chars(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}{ELLIPSIS_MARKER}")
    } else {
        head
    }
}
