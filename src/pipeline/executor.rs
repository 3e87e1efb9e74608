//! Pipeline execution.
//!
//! The executor runs the assembled task graph to completion. It is
//! deliberately sequential: tasks run in declaration order, which is one
//! valid topological order of the fixed dependency graph, so every task's
//! dependencies are Completed before it enters Running. A task that fails
//! halts all further scheduling; completed tasks are not rolled back and
//! a failed run is restarted in full by the caller with fresh state.

use crate::backend::{CompletionBackend, CompletionRequest};
use crate::error::{PlumeError, Result};
use crate::events::{Event, EventAction, EventLog};
use crate::pipeline::assembler::{DRAFT_TASK, Pipeline};
use crate::task::{Task, TaskState};
use serde_json::json;
use std::time::Instant;

/// Output of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The final letter: output of the last task in sequence order.
    pub letter: String,
    /// The writer's draft, retained separately so exporters can include
    /// it alongside the final version.
    pub draft: String,
}

/// Runs one assembled pipeline against a completion backend.
pub struct Executor<'a> {
    backend: &'a dyn CompletionBackend,
    events: Option<&'a EventLog>,
}

impl<'a> Executor<'a> {
    /// Create an executor over a backend.
    pub fn new(backend: &'a dyn CompletionBackend) -> Self {
        Self {
            backend,
            events: None,
        }
    }

    /// Record task transitions to a run log.
    pub fn with_event_log(mut self, events: &'a EventLog) -> Self {
        self.events = Some(events);
        self
    }

    /// Run every task to completion and return the final letter and the
    /// draft.
    ///
    /// The pipeline is taken by mutable reference so the caller can
    /// inspect per-task states afterwards, including after a failure.
    pub fn execute(&self, pipeline: &mut Pipeline) -> Result<PipelineResult> {
        for i in 0..pipeline.tasks.len() {
            let task_name = pipeline.tasks[i].name.clone();

            // Gather dependency outputs in dependency-declaration order.
            // The assembler only wires backward edges, so every
            // dependency has already run.
            let dep_names = pipeline.tasks[i].depends_on.clone();
            let mut dep_outputs: Vec<(String, String)> = Vec::with_capacity(dep_names.len());
            for dep_name in &dep_names {
                let dep = pipeline.task(dep_name).ok_or_else(|| {
                    PlumeError::Config(format!(
                        "task '{}' depends on unknown task '{}'",
                        task_name, dep_name
                    ))
                })?;
                match (dep.state(), dep.output()) {
                    (TaskState::Completed, Some(output)) => {
                        dep_outputs.push((dep_name.clone(), output.to_string()));
                    }
                    _ => {
                        return Err(PlumeError::TaskExecution {
                            task: task_name,
                            message: format!("dependency '{}' has not completed", dep_name),
                        });
                    }
                }
            }

            let agent = {
                let role = pipeline.tasks[i].agent.clone().ok_or_else(|| {
                    PlumeError::Config(format!("task '{}' has no agent bound", task_name))
                })?;
                pipeline
                    .agents
                    .get(&role)
                    .cloned()
                    .ok_or(PlumeError::UnknownRole(role))?
            };

            pipeline.tasks[i].start();
            self.log(
                EventAction::TaskStart,
                &task_name,
                json!({ "agent": agent.name }),
            )?;
            let started = Instant::now();

            // Capability calls are blocking; the task cannot complete
            // until they settle, and a failure is the task's failure.
            let mut materials: Vec<(String, String)> = Vec::new();
            let mut capability_failure = None;
            for capability in &agent.capabilities {
                match capability.invoke(&pipeline.tasks[i].description) {
                    Ok(material) => materials.push((capability.name().to_string(), material)),
                    Err(err) => {
                        capability_failure = Some(err);
                        break;
                    }
                }
            }
            if let Some(err) = capability_failure {
                pipeline.tasks[i].fail(err.to_string());
                self.log(
                    EventAction::TaskFail,
                    &task_name,
                    json!({ "error": err.to_string() }),
                )?;
                return Err(err);
            }

            let request = CompletionRequest {
                role: agent.name.clone(),
                system: agent.system_prompt(),
                prompt: compose_prompt(&pipeline.tasks[i], &dep_outputs, &materials),
                temperature: agent.temperature,
                max_iter: agent.max_iter,
            };

            match self.backend.complete(&request) {
                Ok(output) => {
                    self.log(
                        EventAction::TaskComplete,
                        &task_name,
                        json!({
                            "duration_ms": started.elapsed().as_millis() as u64,
                            "chars": output.chars().count(),
                        }),
                    )?;
                    pipeline.tasks[i].complete(output);
                }
                Err(source) => {
                    let message = source.to_string();
                    pipeline.tasks[i].fail(message.clone());
                    self.log(
                        EventAction::TaskFail,
                        &task_name,
                        json!({ "error": message }),
                    )?;
                    return Err(PlumeError::TaskExecution {
                        task: task_name,
                        message,
                    });
                }
            }
        }

        let letter = pipeline
            .tasks
            .last()
            .and_then(|t| t.output())
            .map(str::to_string)
            .ok_or_else(|| PlumeError::Config("pipeline has no tasks".to_string()))?;

        let draft = pipeline
            .task(DRAFT_TASK)
            .and_then(|t| t.output())
            .map(str::to_string)
            .ok_or_else(|| {
                PlumeError::Config(format!("pipeline has no '{}' task", DRAFT_TASK))
            })?;

        Ok(PipelineResult { letter, draft })
    }

    fn log(&self, action: EventAction, task: &str, details: serde_json::Value) -> Result<()> {
        if let Some(events) = self.events {
            events.append(&Event::new(action).with_task(task).with_details(details))?;
        }
        Ok(())
    }
}

/// Assemble the task prompt: instruction, dependency context in
/// dependency-declaration order, capability material, expected output.
fn compose_prompt(
    task: &Task,
    dep_outputs: &[(String, String)],
    materials: &[(String, String)],
) -> String {
    let mut prompt = format!("# Mission\n{}\n", task.description.trim());

    if !dep_outputs.is_empty() {
        prompt.push_str("\n# Contexte des tâches précédentes\n");
        for (name, output) in dep_outputs {
            prompt.push_str(&format!("\n## {}\n{}\n", name, output.trim()));
        }
    }

    if !materials.is_empty() {
        prompt.push_str("\n# Documentation\n");
        for (name, material) in materials {
            prompt.push_str(&format!("\n## {}\n{}\n", name, material.trim()));
        }
    }

    prompt.push_str(&format!(
        "\n# Résultat attendu\n{}\n",
        task.expected_output.trim()
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::build_agents;
    use crate::capability::{Capability, CapabilityRegistry};
    use crate::config::{RolesConfig, TasksConfig};
    use crate::context::Context;
    use crate::pipeline::assemble;
    use crate::task::build_tasks;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Scripted backend: records every request, optionally failing the
    /// request whose prompt contains a marker.
    struct FakeBackend {
        calls: RefCell<Vec<CompletionRequest>>,
        fail_on: Option<&'static str>,
    }

    impl FakeBackend {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail_on: None,
            }
        }

        fn failing_on(marker: &'static str) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail_on: Some(marker),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|c| c.prompt.clone()).collect()
        }

        fn roles(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|c| c.role.clone()).collect()
        }
    }

    impl CompletionBackend for FakeBackend {
        fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String> {
            self.calls.borrow_mut().push(request.clone());
            if let Some(marker) = self.fail_on
                && request.prompt.contains(marker)
            {
                anyhow::bail!("panne simulée du modèle");
            }
            Ok(format!(
                "sortie {} #{}",
                request.role,
                self.calls.borrow().len()
            ))
        }
    }

    fn context() -> Context {
        Context::from_pairs([
            ("candidate_profile", "stage 6 mois"),
            ("cv_path", "cv_md.md"),
            ("company_url", "netflix"),
            ("hiring_needs", "data analyst junior"),
            ("gender", "féminin"),
        ])
    }

    fn builtin_pipeline(registry: &CapabilityRegistry) -> Pipeline {
        builtin_pipeline_with_roles(&RolesConfig::builtin(), registry)
    }

    fn builtin_pipeline_with_roles(
        roles: &RolesConfig,
        registry: &CapabilityRegistry,
    ) -> Pipeline {
        let context = context();
        let agents = build_agents(roles, &context, &BTreeMap::new(), registry).unwrap();
        let tasks = build_tasks(&TasksConfig::builtin(), &context).unwrap();
        assemble(agents, tasks).unwrap()
    }

    /// Map a recorded prompt back to the task it served.
    fn task_of_prompt(prompt: &str) -> &'static str {
        for (marker, task) in [
            ("Recherche la culture", "company_culture"),
            ("Analyse la description de poste", "role_requirements"),
            ("Analyse le CV", "cv_analysis"),
            ("Rédige la lettre", "draft_letter"),
            ("Relis la lettre", "review_letter"),
        ] {
            if prompt.contains(marker) {
                return task;
            }
        }
        panic!("prompt matches no known task: {prompt}");
    }

    #[test]
    fn runs_all_five_tasks_and_returns_letter_and_draft() {
        let backend = FakeBackend::new();
        let mut pipeline = builtin_pipeline(&CapabilityRegistry::new());

        let result = Executor::new(&backend).execute(&mut pipeline).unwrap();

        assert!(!result.letter.is_empty());
        assert!(!result.draft.is_empty());
        for task in pipeline.tasks() {
            assert_eq!(task.state(), TaskState::Completed, "task {}", task.name);
        }
        assert_eq!(
            backend.roles(),
            vec!["research", "research", "cv_extractor", "writer", "review"]
        );
    }

    #[test]
    fn dependencies_complete_before_dependents_start() {
        let backend = FakeBackend::new();
        let mut pipeline = builtin_pipeline(&CapabilityRegistry::new());

        Executor::new(&backend).execute(&mut pipeline).unwrap();

        let order: Vec<&str> = backend
            .prompts()
            .iter()
            .map(|p| task_of_prompt(p))
            .collect();
        let position =
            |name: &str| order.iter().position(|t| *t == name).unwrap();

        assert!(position("cv_analysis") < position("draft_letter"));
        assert!(position("draft_letter") < position("review_letter"));
        assert_eq!(order.len(), 5);
    }

    #[test]
    fn draft_equals_the_writer_task_output_exactly() {
        let backend = FakeBackend::new();
        let mut pipeline = builtin_pipeline(&CapabilityRegistry::new());

        let result = Executor::new(&backend).execute(&mut pipeline).unwrap();

        assert_eq!(
            result.draft,
            pipeline.task("draft_letter").unwrap().output().unwrap()
        );
        assert_eq!(
            result.letter,
            pipeline.task("review_letter").unwrap().output().unwrap()
        );
        assert_ne!(result.draft, result.letter);
    }

    #[test]
    fn dependent_prompts_carry_the_literal_upstream_output() {
        let backend = FakeBackend::new();
        let mut pipeline = builtin_pipeline(&CapabilityRegistry::new());

        Executor::new(&backend).execute(&mut pipeline).unwrap();

        let prompts = backend.prompts();
        let writer_prompt = prompts
            .iter()
            .find(|p| task_of_prompt(p) == "draft_letter")
            .unwrap();
        let cv_output = pipeline.task("cv_analysis").unwrap().output().unwrap();
        assert!(writer_prompt.contains("## cv_analysis"));
        assert!(writer_prompt.contains(cv_output));

        let review_prompt = prompts
            .iter()
            .find(|p| task_of_prompt(p) == "review_letter")
            .unwrap();
        let draft_output = pipeline.task("draft_letter").unwrap().output().unwrap();
        assert!(review_prompt.contains("## draft_letter"));
        assert!(review_prompt.contains(draft_output));
    }

    #[test]
    fn failed_task_halts_scheduling_and_leaves_downstream_pending() {
        let backend = FakeBackend::failing_on("Analyse le CV");
        let mut pipeline = builtin_pipeline(&CapabilityRegistry::new());

        let err = Executor::new(&backend).execute(&mut pipeline).unwrap_err();

        match &err {
            PlumeError::TaskExecution { task, message } => {
                assert_eq!(task, "cv_analysis");
                assert!(message.contains("panne simulée"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Upstream results are not rolled back.
        assert_eq!(
            pipeline.task("company_culture").unwrap().state(),
            TaskState::Completed
        );
        assert_eq!(
            pipeline.task("role_requirements").unwrap().state(),
            TaskState::Completed
        );
        assert_eq!(
            pipeline.task("cv_analysis").unwrap().state(),
            TaskState::Failed
        );
        // Dependents never left Pending.
        assert_eq!(
            pipeline.task("draft_letter").unwrap().state(),
            TaskState::Pending
        );
        assert_eq!(
            pipeline.task("review_letter").unwrap().state(),
            TaskState::Pending
        );
        // No further backend calls happened after the failure.
        assert_eq!(backend.calls.borrow().len(), 3);
    }

    struct Boom;

    impl Capability for Boom {
        fn name(&self) -> &str {
            "boom"
        }

        fn invoke(&self, _query: &str) -> crate::error::Result<String> {
            Err(crate::capability::failure("boom", "réseau indisponible"))
        }
    }

    #[test]
    fn capability_failure_fails_the_owning_task() {
        let roles_yaml = r#"
roles:
  - name: research
    role: "Analyste"
    goal: "g"
    backstory: "b"
  - name: cv_extractor
    role: "Extracteur"
    goal: "g"
    backstory: "b"
    tools: [boom]
  - name: writer
    role: "Rédacteur"
    goal: "g"
    backstory: "b"
  - name: review
    role: "Relecteur"
    goal: "g"
    backstory: "b"
"#;
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(Boom));

        let backend = FakeBackend::new();
        let roles = RolesConfig::from_yaml(roles_yaml).unwrap();
        let mut pipeline = builtin_pipeline_with_roles(&roles, &registry);

        let err = Executor::new(&backend).execute(&mut pipeline).unwrap_err();

        assert!(matches!(err, PlumeError::Capability { .. }));
        let failed = pipeline.task("cv_analysis").unwrap();
        assert_eq!(failed.state(), TaskState::Failed);
        assert!(failed.failure().unwrap().contains("réseau indisponible"));
        assert_eq!(
            pipeline.task("draft_letter").unwrap().state(),
            TaskState::Pending
        );
        // The backend was never reached for the failed task.
        assert_eq!(backend.calls.borrow().len(), 2);
    }

    #[test]
    fn capability_material_is_injected_into_the_prompt() {
        struct CvFixture;

        impl Capability for CvFixture {
            fn name(&self) -> &str {
                "file_read"
            }

            fn invoke(&self, _query: &str) -> crate::error::Result<String> {
                Ok("# CV\nData analyst, 5 ans chez ACME.".to_string())
            }
        }

        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(CvFixture));

        let backend = FakeBackend::new();
        let mut pipeline = builtin_pipeline(&registry);

        Executor::new(&backend).execute(&mut pipeline).unwrap();

        let prompts = backend.prompts();
        let cv_prompt = prompts
            .iter()
            .find(|p| task_of_prompt(p) == "cv_analysis")
            .unwrap();
        assert!(cv_prompt.contains("# Documentation"));
        assert!(cv_prompt.contains("## file_read"));
        assert!(cv_prompt.contains("Data analyst, 5 ans chez ACME."));
    }

    #[test]
    fn events_record_each_task_transition() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::new(dir.path().join("events.ndjson"));

        let backend = FakeBackend::new();
        let mut pipeline = builtin_pipeline(&CapabilityRegistry::new());

        Executor::new(&backend)
            .with_event_log(&log)
            .execute(&mut pipeline)
            .unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let events: Vec<Event> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        // start + complete per task.
        assert_eq!(events.len(), 10);
        assert_eq!(events[0].action, EventAction::TaskStart);
        assert_eq!(events[0].task.as_deref(), Some("company_culture"));
        assert_eq!(events[9].action, EventAction::TaskComplete);
        assert_eq!(events[9].task.as_deref(), Some("review_letter"));
    }

    #[test]
    fn failed_run_logs_a_task_fail_event() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::new(dir.path().join("events.ndjson"));

        let backend = FakeBackend::failing_on("Analyse le CV");
        let mut pipeline = builtin_pipeline(&CapabilityRegistry::new());

        Executor::new(&backend)
            .with_event_log(&log)
            .execute(&mut pipeline)
            .unwrap_err();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let last: Event = serde_json::from_str(content.lines().last().unwrap()).unwrap();
        assert_eq!(last.action, EventAction::TaskFail);
        assert_eq!(last.task.as_deref(), Some("cv_analysis"));
    }

    #[test]
    fn compose_prompt_orders_sections() {
        let task = Task::new("t", "Fais la chose.", "Un résultat.", false);
        let deps = vec![
            ("premiere".to_string(), "sortie un".to_string()),
            ("seconde".to_string(), "sortie deux".to_string()),
        ];
        let materials = vec![("file_read".to_string(), "contenu cv".to_string())];

        let prompt = compose_prompt(&task, &deps, &materials);

        let mission = prompt.find("# Mission").unwrap();
        let context = prompt.find("# Contexte des tâches précédentes").unwrap();
        let first = prompt.find("## premiere").unwrap();
        let second = prompt.find("## seconde").unwrap();
        let docs = prompt.find("# Documentation").unwrap();
        let expected = prompt.find("# Résultat attendu").unwrap();

        assert!(mission < context);
        assert!(context < first);
        assert!(first < second, "dependency order must be preserved");
        assert!(second < docs);
        assert!(docs < expected);
    }

    #[test]
    fn compose_prompt_omits_empty_sections() {
        let task = Task::new("t", "Fais la chose.", "Un résultat.", false);
        let prompt = compose_prompt(&task, &[], &[]);
        assert!(!prompt.contains("# Contexte"));
        assert!(!prompt.contains("# Documentation"));
        assert!(prompt.contains("# Mission"));
        assert!(prompt.contains("# Résultat attendu"));
    }
}
