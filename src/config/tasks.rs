//! Task definitions (`tasks.yaml`).
//!
//! # File Format
//!
//! ```yaml
//! tasks:
//!   - name: draft_letter
//!     description: "Rédige la lettre pour {company_url}..."
//!     expected_output: "Une lettre complète en français."
//!     async_execution: false
//! ```
//!
//! Declaration order is load-bearing: the executor runs tasks in this
//! order and the final artifact is the last task's output. Neither agent
//! assignment nor dependencies appear here; the pipeline assembler wires
//! both by name.

use crate::error::{PlumeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// One unit-of-work declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Identifier referenced by the assembler's wiring tables.
    pub name: String,

    /// Instruction text (template).
    pub description: String,

    /// Expected-output description (template).
    pub expected_output: String,

    /// Whether the task could run fire-and-forget. Parsed and carried;
    /// the sequential executor treats it as data.
    #[serde(default)]
    pub async_execution: bool,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// The full task definition set, in declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    /// Task declarations in file order.
    pub tasks: Vec<TaskDefinition>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl TasksConfig {
    /// Load task definitions from a YAML file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            PlumeError::Config(format!(
                "failed to read tasks config '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(Some(Self::from_yaml(&content)?))
    }

    /// Parse task definitions from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: TasksConfig = serde_yaml::from_str(yaml)
            .map_err(|e| PlumeError::Config(format!("failed to parse tasks.yaml: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// The task set embedded in the binary.
    pub fn builtin() -> Self {
        Self::from_yaml(include_str!("../../config/tasks.yaml"))
            .expect("built-in tasks.yaml is valid")
    }

    /// Validate the definition set.
    ///
    /// Validation rules:
    /// - at least one task is declared
    /// - identifiers are lowercase snake_case and unique (the assembler
    ///   wires dependencies by name, so duplicates would be ambiguous)
    /// - `description` and `expected_output` are non-empty
    pub fn validate(&self) -> Result<()> {
        if self.tasks.is_empty() {
            return Err(PlumeError::Config(
                "tasks.yaml validation failed: no tasks declared".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for def in &self.tasks {
            if !super::is_valid_name(&def.name) {
                return Err(PlumeError::Config(format!(
                    "tasks.yaml validation failed: invalid task name '{}'",
                    def.name
                )));
            }

            if !seen.insert(def.name.as_str()) {
                return Err(PlumeError::Config(format!(
                    "tasks.yaml validation failed: duplicate task name '{}'",
                    def.name
                )));
            }

            for (field, value) in [
                ("description", &def.description),
                ("expected_output", &def.expected_output),
            ] {
                if value.trim().is_empty() {
                    return Err(PlumeError::Config(format!(
                        "tasks.yaml validation failed: task '{}' has empty {}",
                        def.name, field
                    )));
                }
            }
        }

        Ok(())
    }

    /// Iterate over declarations in file order.
    pub fn iter(&self) -> impl Iterator<Item = &TaskDefinition> {
        self.tasks.iter()
    }

    /// Number of declared tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks are declared.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
