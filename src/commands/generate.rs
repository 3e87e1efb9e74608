//! Implementation of the `plume generate` command.
//!
//! Runs one full generation request: validate the form fields, build the
//! context and both factories' outputs, assemble the pipeline, execute it
//! against the configured agent command, and write the artifacts.

use crate::cli::GenerateArgs;
use plume::agent::build_agents;
use plume::backend::CommandBackend;
use plume::capability::CapabilityRegistry;
use plume::context::Context;
use plume::error::{PlumeError, Result};
use plume::events::{Event, EventAction, EventLog};
use plume::pipeline::{Executor, assemble};
use plume::request::{GenerationRequest, Temperatures};
use plume::task::build_tasks;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

/// Execute the `plume generate` command.
pub fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let request = build_request(&args)?;
    request.validate()?;

    let roles = super::load_roles(args.roles.as_deref())?;
    let task_definitions = super::load_tasks(args.tasks.as_deref())?;

    let context = Context::build(&request);
    let registry = CapabilityRegistry::standard(&request)?;
    let agents = build_agents(
        &roles,
        &context,
        &request.temperatures.overrides(),
        &registry,
    )?;
    let tasks = build_tasks(&task_definitions, &context)?;
    let mut pipeline = assemble(agents, tasks)?;

    let mut backend = CommandBackend::new(&args.agent_command);
    if args.timeout_seconds > 0 {
        backend = backend.with_timeout(Duration::from_secs(args.timeout_seconds));
    }

    let event_log = args.events.as_ref().map(EventLog::new);
    if let Some(log) = &event_log {
        log.append(
            &Event::new(EventAction::RequestStart).with_details(json!({
                "company": request.company,
                "gender": request.gender.as_str(),
            })),
        )?;
    }

    let mut executor = Executor::new(&backend);
    if let Some(log) = &event_log {
        executor = executor.with_event_log(log);
    }

    let result = match executor.execute(&mut pipeline) {
        Ok(result) => result,
        Err(err) => {
            if let Some(log) = &event_log {
                log.append(
                    &Event::new(EventAction::RequestFail)
                        .with_details(json!({ "error": err.to_string() })),
                )?;
            }
            return Err(err);
        }
    };

    if let Some(log) = &event_log {
        log.append(
            &Event::new(EventAction::RequestComplete).with_details(json!({
                "letter_chars": result.letter.chars().count(),
                "draft_chars": result.draft.chars().count(),
            })),
        )?;
    }

    match &args.output {
        Some(path) => {
            write_artifact(path, &result.letter)?;
            eprintln!("Letter written to {}", path.display());
        }
        None => println!("{}", result.letter),
    }

    if let Some(path) = &args.draft_output {
        write_artifact(path, &result.draft)?;
        eprintln!("Draft written to {}", path.display());
    }

    if let Some(path) = &args.params_output {
        let params = serde_json::to_string_pretty(&request.session_params())
            .map_err(|e| PlumeError::Config(format!("failed to serialize session parameters: {}", e)))?;
        write_artifact(path, &params)?;
        eprintln!("Session parameters written to {}", path.display());
    }

    Ok(())
}

/// Build the request from CLI arguments. Empty fields are left empty here;
/// `GenerationRequest::validate` is the single precondition check.
fn build_request(args: &GenerateArgs) -> Result<GenerationRequest> {
    let job_description = match (&args.job_description, &args.job_description_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
            PlumeError::Config(format!(
                "failed to read job description '{}': {}",
                path.display(),
                e
            ))
        })?,
        (None, None) => String::new(),
    };

    let defaults = Temperatures::default();
    let temperatures = Temperatures {
        research: args.temp_research.unwrap_or(defaults.research),
        cv_extractor: args.temp_cv_extractor.unwrap_or(defaults.cv_extractor),
        writer: args.temp_writer.unwrap_or(defaults.writer),
        review: args.temp_review.unwrap_or(defaults.review),
    };

    Ok(GenerationRequest {
        candidate_profile: args.profile.clone(),
        gender: args.gender.into(),
        cv_path: args.cv.to_string_lossy().into_owned(),
        company: args.company.clone(),
        job_description,
        temperatures,
    })
}

fn write_artifact(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| {
        PlumeError::Config(format!("failed to write '{}': {}", path.display(), e))
    })
}
