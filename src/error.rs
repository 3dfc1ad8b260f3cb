//! Error taxonomy for the session core.
//!
//! Library code returns these typed errors; the CLI boundary wraps them with
//! `anyhow` context. Process execution failures are deliberately absent here:
//! the runner reports them as values inside `CommandResult`.

use std::path::PathBuf;
use thiserror::Error;

use crate::profiles::ProfileType;

/// Failures opening a trace directory or capture file.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to load trace: {0}")]
    LoadFailure(String),

    /// The trace loaded, but the follow-up analysis refresh failed.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Profile selection and persistence problems. `FallbackUsed` is non-fatal:
/// the caller logs it and continues with the built-in default.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("no usable stored profile for {0}; using built-in default")]
    FallbackUsed(ProfileType),

    #[error("failed to persist profile preferences: {0}")]
    PersistFailure(String),
}

/// Failures from the analysis engine collaborator.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis engine failure: {0}")]
    EngineFailure(String),
}

/// Failures resolving a process ID from listing output.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("process not found in listing output")]
    NotFound,
}
