//! Implementation of the `plume check` command.
//!
//! Static validation of the definition files: every placeholder they
//! reference must be a known context key, and the assembler's wiring
//! tables must be satisfiable by the declared names. Nothing is executed.

use crate::cli::CheckArgs;
use plume::config::{RolesConfig, TasksConfig};
use plume::context::Context;
use plume::error::{PlumeError, Result};
use plume::pipeline::assembler::ASSIGNMENTS;
use plume::template;
use std::collections::BTreeSet;

/// Execute the `plume check` command.
pub fn cmd_check(args: CheckArgs) -> Result<()> {
    let roles = super::load_roles(args.roles.as_deref())?;
    let tasks = super::load_tasks(args.tasks.as_deref())?;

    let problems = check_definitions(&roles, &tasks)?;
    if !problems.is_empty() {
        return Err(PlumeError::Config(format!(
            "definition check failed:\n  - {}",
            problems.join("\n  - ")
        )));
    }

    println!(
        "OK: {} roles, {} tasks, wiring satisfiable, all placeholders known",
        roles.len(),
        tasks.len()
    );
    Ok(())
}

/// Collect every problem in the definition sets. Placeholder syntax errors
/// abort immediately; unknown placeholders and wiring gaps accumulate so
/// one run reports them all.
fn check_definitions(roles: &RolesConfig, tasks: &TasksConfig) -> Result<Vec<String>> {
    let known: BTreeSet<&str> = Context::known_keys().into_iter().collect();
    let mut problems = Vec::new();

    for def in roles.iter() {
        for (field, text) in [
            ("role", &def.role),
            ("goal", &def.goal),
            ("backstory", &def.backstory),
        ] {
            check_field(&known, "role", &def.name, field, text, &mut problems)?;
        }
    }

    for def in tasks.iter() {
        for (field, text) in [
            ("description", &def.description),
            ("expected_output", &def.expected_output),
        ] {
            check_field(&known, "task", &def.name, field, text, &mut problems)?;
        }
    }

    let role_names: BTreeSet<&str> = roles.iter().map(|d| d.name.as_str()).collect();
    let task_names: BTreeSet<&str> = tasks.iter().map(|d| d.name.as_str()).collect();
    for (task_name, role_name) in ASSIGNMENTS {
        if !task_names.contains(task_name) {
            problems.push(format!(
                "wiring needs task '{}', absent from tasks.yaml",
                task_name
            ));
        }
        if !role_names.contains(role_name) {
            problems.push(format!(
                "wiring needs role '{}', absent from roles.yaml",
                role_name
            ));
        }
    }

    Ok(problems)
}

fn check_field(
    known: &BTreeSet<&str>,
    scope: &str,
    name: &str,
    field: &str,
    text: &str,
    problems: &mut Vec<String>,
) -> Result<()> {
    let referenced = template::placeholders(text).map_err(|e| {
        PlumeError::Config(format!("{} '{}' {}: {}", scope, name, field, e))
    })?;

    for placeholder in referenced {
        if !known.contains(placeholder.as_str()) {
            problems.push(format!(
                "{} '{}' {} references unknown placeholder '{{{}}}'",
                scope, name, field, placeholder
            ));
        }
    }

    Ok(())
}
