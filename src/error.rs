//! Error types for the plume pipeline.
//!
//! Uses thiserror for derive macros and provides user-actionable error
//! messages. Structural errors (missing fields, unresolved templates,
//! unknown roles, bad configuration) are detected before any task runs and
//! abort the request with no partial output; capability and task execution
//! errors surface the owning task's Failed state.

use crate::exit_codes;
use crate::template::ResolveError;
use thiserror::Error;

/// Main error type for plume operations.
#[derive(Error, Debug)]
pub enum PlumeError {
    /// A required request field was empty. Checked before the pipeline is
    /// built; the UI layer is expected to prevent this.
    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    /// A role or task template referenced a placeholder with no matching
    /// context key, or used invalid placeholder syntax.
    #[error("template resolution failed for {scope} '{name}' ({field}): {source}")]
    TemplateResolution {
        /// What kind of definition failed ("role" or "task").
        scope: &'static str,
        /// The definition's identifier.
        name: String,
        /// The template field that failed to resolve.
        field: &'static str,
        #[source]
        source: ResolveError,
    },

    /// The pipeline assembler referenced a role absent from the built
    /// agent set.
    #[error("pipeline references unknown role '{0}'")]
    UnknownRole(String),

    /// An external capability call failed during task execution.
    #[error("capability '{name}' failed: {message}")]
    Capability { name: String, message: String },

    /// A task's underlying work failed.
    #[error("task '{task}' failed: {message}")]
    TaskExecution { task: String, message: String },

    /// Definition files could not be loaded, parsed, or validated, or some
    /// other input was invalid.
    #[error("{0}")]
    Config(String),
}

impl PlumeError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            PlumeError::MissingRequiredField(_)
            | PlumeError::TemplateResolution { .. }
            | PlumeError::UnknownRole(_)
            | PlumeError::Config(_) => exit_codes::INPUT_ERROR,
            PlumeError::Capability { .. } | PlumeError::TaskExecution { .. } => {
                exit_codes::PIPELINE_FAILURE
            }
        }
    }

    /// Whether this error was detected before any task executed.
    pub fn is_structural(&self) -> bool {
        self.exit_code() == exit_codes::INPUT_ERROR
    }
}

/// Result type alias for plume operations.
pub type Result<T> = std::result::Result<T, PlumeError>;
