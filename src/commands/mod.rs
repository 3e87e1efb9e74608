//! Command implementations for plume.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the definition-file loaders shared between
//! commands.

mod check;
mod generate;

use crate::cli::Command;
use plume::config::{RolesConfig, TasksConfig};
use plume::error::{PlumeError, Result};
use std::path::Path;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Generate(args) => generate::cmd_generate(args),
        Command::Check(args) => check::cmd_check(args),
    }
}

/// Load role definitions from `path`, or the built-in set without one.
/// A path that points at a missing file is an error, not a fallback.
pub(crate) fn load_roles(path: Option<&Path>) -> Result<RolesConfig> {
    match path {
        Some(path) => RolesConfig::load(path)?.ok_or_else(|| {
            PlumeError::Config(format!("roles config '{}' not found", path.display()))
        }),
        None => Ok(RolesConfig::builtin()),
    }
}

/// Load task definitions from `path`, or the built-in set without one.
pub(crate) fn load_tasks(path: Option<&Path>) -> Result<TasksConfig> {
    match path {
        Some(path) => TasksConfig::load(path)?.ok_or_else(|| {
            PlumeError::Config(format!("tasks config '{}' not found", path.display()))
        }),
        None => Ok(TasksConfig::builtin()),
    }
}
