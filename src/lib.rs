//! Plume: cover letter generation pipeline.
//!
//! Plume turns a résumé, a company name and a job description into a
//! generated cover letter by running a fixed pipeline of four templated
//! agent roles (researcher, résumé extractor, writer, reviewer) over five
//! named tasks with a hardcoded dependency chain.
//!
//! The crate is organized around the request lifecycle:
//!
//! - [`request`] / [`context`]: form fields, validation, and the
//!   per-request placeholder mapping
//! - [`config`]: declarative role and task definition sets (YAML)
//! - [`template`]: `{placeholder}` resolution, failing loudly on unknown
//!   keys
//! - [`agent`] / [`task`]: the two factories producing runtime instances
//! - [`capability`]: named external actions (web search, site content,
//!   file read) resolved through a permissive registry
//! - [`pipeline`]: assembly (name-keyed agent binding and dependency
//!   wiring) and sequential execution
//! - [`backend`]: the completion seam; the default backend shells out to
//!   a configurable command
//! - [`events`]: append-only NDJSON run log

pub mod agent;
pub mod backend;
pub mod capability;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod pipeline;
pub mod request;
pub mod task;
pub mod template;

pub use error::{PlumeError, Result};
