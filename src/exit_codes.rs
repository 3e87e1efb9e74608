//! Exit code constants for the plume CLI.
//!
//! - 0: Success
//! - 1: Input error (bad request fields, unresolved templates, bad config)
//! - 2: Pipeline failure (a task failed during execution)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Input error: missing request fields, unresolvable templates, unknown
/// roles, or invalid definition files. Nothing was executed.
pub const INPUT_ERROR: i32 = 1;

/// Pipeline failure: a task reached the Failed state during execution.
pub const PIPELINE_FAILURE: i32 = 2;
