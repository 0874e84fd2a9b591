use std::fmt;
use thiserror::Error;
use crate::pipeline::batch::RunState;

/// Mapping field a batch cannot start without
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    EmailColumn,
    ListName,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredField::EmailColumn => f.write_str("Email column"),
            RequiredField::ListName => f.write_str("List name"),
        }
    }
}

/// The mapping or list name is not usable; nothing has been processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationConfigError {
    #[error("{0} is required")]
    Missing(RequiredField),
    #[error("Column '{column}' not found. Available columns: {}", available.join(", "))]
    UnknownColumn { column: String, available: Vec<String> },
}

/// A DNS lookup that did not produce an answer.
///
/// Always contained at the row boundary and reported as
/// "Domain verification failed".
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("DNS request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("DNS resolver returned HTTP {0}")]
    Status(u16),
    #[error("Malformed DNS response: {0}")]
    Decode(String),
}

/// Terminal failures of a batch run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The uploaded file could not be read as CSV
    #[error("Failed to read CSV file: {0}")]
    Parse(String),

    #[error(transparent)]
    Config(#[from] ValidationConfigError),

    /// The run handle is not in a state that allows the operation
    #[error("Cannot {action} while the run is {state}")]
    InvalidState { action: &'static str, state: RunState },

    /// Something unexpected aborted the loop; no results are kept
    #[error("An error occurred during validation: {0}")]
    Batch(String),
}

impl PipelineError {
    /// True for errors caused by the input rather than the system
    pub fn is_user_error(&self) -> bool {
        matches!(self, PipelineError::Parse(_) | PipelineError::Config(_))
    }
}
