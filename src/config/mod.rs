//! Declarative definition sets for the pipeline.
//!
//! Two YAML files drive a generation request: `roles.yaml` declares the
//! agent personas and `tasks.yaml` declares the units of work, both with
//! `{placeholder}` template fields resolved against the request context.
//! Built-in copies of both files are embedded so the binary works without
//! external configuration; `--roles`/`--tasks` override them.

pub mod roles;
pub mod tasks;

pub use roles::{RoleDefinition, RolesConfig};
pub use tasks::{TaskDefinition, TasksConfig};

use regex::Regex;
use std::sync::LazyLock;

/// Regex for valid role and task identifiers.
static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("invalid name regex"));

/// Check a definition identifier is a lowercase snake_case name.
pub(crate) fn is_valid_name(name: &str) -> bool {
    NAME_REGEX.is_match(name)
}
