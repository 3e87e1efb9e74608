//! Pipeline assembly: agent binding and dependency wiring.
//!
//! Wiring is keyed by task name, not list position, so reordering the
//! definition file cannot silently rewire the graph. The tables are fixed
//! at compile time: the dependency relation is a DAG by construction and
//! never user-editable at runtime.
//!
//! The research tasks feed nothing forward explicitly; their findings
//! reach the writer through the templated instruction fields. The writer
//! must see the literal résumé analysis, and the reviewer the literal
//! draft, so only those two edges exist.

use crate::agent::Agent;
use crate::config::roles::names as role_names;
use crate::error::{PlumeError, Result};
use crate::task::Task;
use std::collections::BTreeMap;

/// Task names wired by the assembler.
pub mod task_names {
    pub const COMPANY_CULTURE: &str = "company_culture";
    pub const ROLE_REQUIREMENTS: &str = "role_requirements";
    pub const CV_ANALYSIS: &str = "cv_analysis";
    pub const DRAFT_LETTER: &str = "draft_letter";
    pub const REVIEW_LETTER: &str = "review_letter";
}

/// Fixed assignment table: task name → role name.
pub const ASSIGNMENTS: &[(&str, &str)] = &[
    (task_names::COMPANY_CULTURE, role_names::RESEARCH),
    (task_names::ROLE_REQUIREMENTS, role_names::RESEARCH),
    (task_names::CV_ANALYSIS, role_names::CV_EXTRACTOR),
    (task_names::DRAFT_LETTER, role_names::WRITER),
    (task_names::REVIEW_LETTER, role_names::REVIEW),
];

/// Fixed dependency table: task name → upstream task names, in the order
/// their outputs are fed to the task.
pub const DEPENDENCIES: &[(&str, &[&str])] = &[
    (task_names::DRAFT_LETTER, &[task_names::CV_ANALYSIS]),
    (task_names::REVIEW_LETTER, &[task_names::DRAFT_LETTER]),
];

/// The task whose output is retained separately as the draft.
pub const DRAFT_TASK: &str = task_names::DRAFT_LETTER;

/// An executable pipeline: agents bound, dependencies wired.
#[derive(Debug)]
pub struct Pipeline {
    pub(crate) agents: BTreeMap<String, Agent>,
    pub(crate) tasks: Vec<Task>,
}

impl Pipeline {
    /// Tasks in execution order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Look up a task by name.
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Position of a task in execution order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.name == name)
    }

    /// The bound agents, keyed by role name.
    pub fn agents(&self) -> &BTreeMap<String, Agent> {
        &self.agents
    }
}

/// Bind each task to its agent and wire the dependency chain.
///
/// Fails with [`PlumeError::UnknownRole`] when the assignment table names
/// a role absent from `agents`, and with a configuration error when the
/// task set does not match the wiring tables (missing task, unassigned
/// extra task, or a dependency declared after its dependent).
pub fn assemble(agents: BTreeMap<String, Agent>, mut tasks: Vec<Task>) -> Result<Pipeline> {
    for (task_name, role_name) in ASSIGNMENTS {
        let Some(task) = tasks.iter_mut().find(|t| t.name == *task_name) else {
            return Err(PlumeError::Config(format!(
                "assignment table references task '{}' absent from tasks.yaml",
                task_name
            )));
        };

        if !agents.contains_key(*role_name) {
            return Err(PlumeError::UnknownRole((*role_name).to_string()));
        }

        task.agent = Some((*role_name).to_string());
    }

    for task in &tasks {
        if task.agent.is_none() {
            return Err(PlumeError::Config(format!(
                "task '{}' has no entry in the assignment table",
                task.name
            )));
        }
    }

    for (task_name, upstream) in DEPENDENCIES {
        let position = tasks
            .iter()
            .position(|t| t.name == *task_name)
            .expect("assignment pass verified the task exists");

        for dep_name in *upstream {
            match tasks.iter().position(|t| t.name == *dep_name) {
                Some(dep_position) if dep_position < position => {}
                Some(_) => {
                    return Err(PlumeError::Config(format!(
                        "task '{}' depends on '{}', which is declared after it",
                        task_name, dep_name
                    )));
                }
                None => {
                    return Err(PlumeError::Config(format!(
                        "task '{}' depends on unknown task '{}'",
                        task_name, dep_name
                    )));
                }
            }
        }

        tasks[position].depends_on = upstream.iter().map(|s| s.to_string()).collect();
    }

    Ok(Pipeline { agents, tasks })
}
