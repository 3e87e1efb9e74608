//! Agent role definitions (`roles.yaml`).
//!
//! # File Format
//!
//! ```yaml
//! roles:
//!   - name: research
//!     role: "Analyste de l'entreprise {company_url}"
//!     goal: "Identifier la culture de {company_url}"
//!     backstory: "Tu es un veilleur stratégique..."
//!     tools: [web_search, site_content]
//!     temperature: 0.8
//!     max_iter: 3
//!     allow_delegation: false
//! ```
//!
//! `role`, `goal` and `backstory` are templates; `tools` lists capability
//! names resolved through the capability registry (unknown names are
//! dropped there, not here). Definitions are an ordered list: when two
//! entries share a name, the later one wins at agent construction.

use crate::error::{PlumeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Well-known role names wired by the pipeline assembler.
pub mod names {
    pub const RESEARCH: &str = "research";
    pub const CV_EXTRACTOR: &str = "cv_extractor";
    pub const WRITER: &str = "writer";
    pub const REVIEW: &str = "review";
}

/// Default sampling temperature when a definition omits one.
const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Default reasoning-iteration bound when a definition omits one.
const DEFAULT_MAX_ITER: u32 = 3;

/// One agent persona declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDefinition {
    /// Identifier referenced by the assembler and temperature overrides.
    pub name: String,

    /// One-line identity statement (template).
    pub role: String,

    /// Objective statement (template).
    pub goal: String,

    /// Persona narrative (template).
    pub backstory: String,

    /// Capability names this role may use.
    #[serde(default)]
    pub tools: Vec<String>,

    /// Default sampling temperature, overridden per request.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum reasoning iterations for the completion backend.
    #[serde(default = "default_max_iter")]
    pub max_iter: u32,

    /// Whether this role may delegate its work to another agent. Carried
    /// for the backend; the fixed pipeline never delegates.
    #[serde(default)]
    pub allow_delegation: bool,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_iter() -> u32 {
    DEFAULT_MAX_ITER
}

/// The full role definition set, in declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RolesConfig {
    /// Role declarations in file order.
    pub roles: Vec<RoleDefinition>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl RolesConfig {
    /// Load role definitions from a YAML file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            PlumeError::Config(format!(
                "failed to read roles config '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(Some(Self::from_yaml(&content)?))
    }

    /// Parse role definitions from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: RolesConfig = serde_yaml::from_str(yaml)
            .map_err(|e| PlumeError::Config(format!("failed to parse roles.yaml: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// The role set embedded in the binary.
    pub fn builtin() -> Self {
        Self::from_yaml(include_str!("../../config/roles.yaml"))
            .expect("built-in roles.yaml is valid")
    }

    /// Validate the definition set.
    ///
    /// Validation rules:
    /// - at least one role is declared
    /// - identifiers are lowercase snake_case
    /// - `role`, `goal` and `backstory` are non-empty
    /// - temperatures are in [0.0, 1.0] and `max_iter` is positive
    ///
    /// Duplicate names are allowed: the later declaration wins when agents
    /// are built.
    pub fn validate(&self) -> Result<()> {
        if self.roles.is_empty() {
            return Err(PlumeError::Config(
                "roles.yaml validation failed: no roles declared".to_string(),
            ));
        }

        for def in &self.roles {
            if !super::is_valid_name(&def.name) {
                return Err(PlumeError::Config(format!(
                    "roles.yaml validation failed: invalid role name '{}'",
                    def.name
                )));
            }

            for (field, value) in [
                ("role", &def.role),
                ("goal", &def.goal),
                ("backstory", &def.backstory),
            ] {
                if value.trim().is_empty() {
                    return Err(PlumeError::Config(format!(
                        "roles.yaml validation failed: role '{}' has empty {}",
                        def.name, field
                    )));
                }
            }

            if !(0.0..=1.0).contains(&def.temperature) {
                return Err(PlumeError::Config(format!(
                    "roles.yaml validation failed: role '{}' has temperature {} outside [0.0, 1.0]",
                    def.name, def.temperature
                )));
            }

            if def.max_iter == 0 {
                return Err(PlumeError::Config(format!(
                    "roles.yaml validation failed: role '{}' has max_iter of 0",
                    def.name
                )));
            }
        }

        Ok(())
    }

    /// Iterate over declarations in file order.
    pub fn iter(&self) -> impl Iterator<Item = &RoleDefinition> {
        self.roles.iter()
    }

    /// Number of declarations (duplicates included).
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Whether no roles are declared.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let yaml = r#"
roles:
  - name: writer
    role: "Rédacteur"
    goal: "Écrire la lettre pour {company_url}"
    backstory: "Tu écris des candidatures."
"#;
        let config = RolesConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.len(), 1);

        let def = &config.roles[0];
        assert_eq!(def.name, "writer");
        assert_eq!(def.temperature, 0.5);
        assert_eq!(def.max_iter, 3);
        assert!(!def.allow_delegation);
        assert!(def.tools.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
roles:
  - name: research
    role: "Analyste"
    goal: "Comprendre {company_url}"
    backstory: "Veilleur stratégique."
    tools: [web_search, site_content]
    temperature: 0.8
    max_iter: 5
    allow_delegation: true
"#;
        let config = RolesConfig::from_yaml(yaml).unwrap();
        let def = &config.roles[0];
        assert_eq!(def.tools, vec!["web_search", "site_content"]);
        assert_eq!(def.temperature, 0.8);
        assert_eq!(def.max_iter, 5);
        assert!(def.allow_delegation);
    }

    #[test]
    fn empty_file_fails_validation() {
        assert!(RolesConfig::from_yaml("").is_err());
    }

    #[test]
    fn invalid_name_fails() {
        let yaml = r#"
roles:
  - name: "Cv-Extractor"
    role: "x"
    goal: "y"
    backstory: "z"
"#;
        let err = RolesConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("invalid role name"));
    }

    #[test]
    fn empty_template_field_fails() {
        let yaml = r#"
roles:
  - name: writer
    role: "Rédacteur"
    goal: ""
    backstory: "z"
"#;
        let err = RolesConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("empty goal"));
    }

    #[test]
    fn out_of_range_temperature_fails() {
        let yaml = r#"
roles:
  - name: writer
    role: "x"
    goal: "y"
    backstory: "z"
    temperature: 1.2
"#;
        let err = RolesConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn zero_max_iter_fails() {
        let yaml = r#"
roles:
  - name: writer
    role: "x"
    goal: "y"
    backstory: "z"
    max_iter: 0
"#;
        let err = RolesConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("max_iter"));
    }

    #[test]
    fn duplicate_names_are_allowed() {
        let yaml = r#"
roles:
  - name: writer
    role: "Premier"
    goal: "y"
    backstory: "z"
  - name: writer
    role: "Second"
    goal: "y"
    backstory: "z"
"#;
        let config = RolesConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn unknown_fields_are_preserved() {
        let yaml = r#"
roles:
  - name: writer
    role: "x"
    goal: "y"
    backstory: "z"
    future_field: "kept"
top_level_future: true
"#;
        let config = RolesConfig::from_yaml(yaml).unwrap();
        assert!(config.roles[0].extra.contains_key("future_field"));
        assert!(config.extra.contains_key("top_level_future"));
    }

    #[test]
    fn builtin_config_declares_the_four_pipeline_roles() {
        let config = RolesConfig::builtin();
        let names: Vec<&str> = config.iter().map(|d| d.name.as_str()).collect();
        assert!(names.contains(&names::RESEARCH));
        assert!(names.contains(&names::CV_EXTRACTOR));
        assert!(names.contains(&names::WRITER));
        assert!(names.contains(&names::REVIEW));
    }

    #[test]
    fn load_missing_file_returns_none() {
        let loaded = RolesConfig::load("/nonexistent/roles.yaml").unwrap();
        assert!(loaded.is_none());
    }
}
