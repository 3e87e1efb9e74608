//! Runtime task model and task construction.
//!
//! A task is one resolved unit of work. The task factory resolves the
//! definition templates against the request context and leaves both agent
//! assignment and dependencies unset; the pipeline assembler fills them.
//! A task moves Pending → Running → Completed or Failed, its output slot
//! written exactly once by its own execution and read only by dependents.

use crate::config::TasksConfig;
use crate::context::Context;
use crate::error::{PlumeError, Result};
use crate::template;

/// Execution state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Not started; dependencies may still be outstanding.
    Pending,
    /// Currently executing (capability calls included).
    Running,
    /// Finished with an output.
    Completed,
    /// Finished with an error; the pipeline halts.
    Failed,
}

/// A runtime task instance.
#[derive(Debug, Clone)]
pub struct Task {
    /// Definition name, used by the assembler's wiring tables.
    pub name: String,
    /// Resolved instruction text.
    pub description: String,
    /// Resolved expected-output description.
    pub expected_output: String,
    /// Fire-and-forget hint carried from the definition.
    pub async_execution: bool,
    /// Assigned role name. Set by the assembler only.
    pub agent: Option<String>,
    /// Names of tasks whose output this task reads, in dependency
    /// declaration order. Set by the assembler only.
    pub depends_on: Vec<String>,

    state: TaskState,
    output: Option<String>,
    failure: Option<String>,
}

impl Task {
    /// Create a pending, unassigned task.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
        async_execution: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            expected_output: expected_output.into(),
            async_execution,
            agent: None,
            depends_on: Vec::new(),
            state: TaskState::Pending,
            output: None,
            failure: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Completed output, if any.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Failure message, if any.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Transition Pending → Running.
    pub(crate) fn start(&mut self) {
        debug_assert_eq!(self.state, TaskState::Pending, "task started twice");
        self.state = TaskState::Running;
    }

    /// Transition Running → Completed, writing the output slot once.
    pub(crate) fn complete(&mut self, output: String) {
        debug_assert_eq!(self.state, TaskState::Running, "completed a non-running task");
        self.state = TaskState::Completed;
        self.output = Some(output);
    }

    /// Transition Running → Failed.
    pub(crate) fn fail(&mut self, message: String) {
        debug_assert_eq!(self.state, TaskState::Running, "failed a non-running task");
        self.state = TaskState::Failed;
        self.failure = Some(message);
    }
}

/// Build the runtime tasks in definition declaration order.
///
/// Instruction and expected-output templates are resolved against the
/// context; an unresolvable placeholder aborts construction with no tasks
/// returned. Agent assignment and dependencies are left unset.
pub fn build_tasks(config: &TasksConfig, context: &Context) -> Result<Vec<Task>> {
    let mut tasks = Vec::with_capacity(config.len());

    for def in config.iter() {
        let resolve = |field: &'static str, text: &str| -> Result<String> {
            template::resolve(text, context.vars()).map_err(|source| {
                PlumeError::TemplateResolution {
                    scope: "task",
                    name: def.name.clone(),
                    field,
                    source,
                }
            })
        };

        tasks.push(Task::new(
            def.name.clone(),
            resolve("description", &def.description)?,
            resolve("expected_output", &def.expected_output)?,
            def.async_execution,
        ));
    }

    Ok(tasks)
}
