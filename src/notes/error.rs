//! Error taxonomy for experiment note operations

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Coarse classification of a [`NoteError`], exposed to API clients.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    NotFound,
    Validation,
    Store,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::NotFound => write!(f, "not_found"),
            Self::Validation => write!(f, "validation"),
            Self::Store => write!(f, "store"),
        }
    }
}

/// Failure of a note operation.
///
/// Store failures carry the driver's message (with its context chain) but
/// never a backtrace.
#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    /// The graph store is unconfigured or unreachable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The referenced experiment does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request is malformed (unknown category, missing field, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A statement failed while talking to the graph store.
    #[error("graph store failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl NoteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Store(_) => ErrorKind::Store,
        }
    }

    pub fn experiment_not_found(id: Uuid) -> Self {
        Self::NotFound(format!("Experiment {} not found", id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type NoteResult<T> = std::result::Result<T, NoteError>;
