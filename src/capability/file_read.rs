//! Local file read capability, bound to the résumé text artifact.
//!
//! The artifact is written once before the pipeline starts (by the
//! upstream format converter) and read-only thereafter; this capability is
//! its only reader inside the pipeline.

use super::{Capability, failure, names};
use crate::error::Result;
use std::path::PathBuf;

/// Reads a fixed file and returns its content as the capability material.
pub struct FileRead {
    path: PathBuf,
}

impl FileRead {
    /// Bind the capability to a file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The bound path.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Capability for FileRead {
    fn name(&self) -> &str {
        names::FILE_READ
    }

    fn invoke(&self, _query: &str) -> Result<String> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            failure(
                names::FILE_READ,
                format!("failed to read '{}': {}", self.path.display(), e),
            )
        })?;

        if content.trim().is_empty() {
            return Err(failure(
                names::FILE_READ,
                format!("'{}' is empty", self.path.display()),
            ));
        }

        Ok(content)
    }
}
