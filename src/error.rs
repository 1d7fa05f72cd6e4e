//! Crate-wide error taxonomy.

use std::path::PathBuf;

use crate::{core::validate::ValidationError, persist::PersistError};

/// Coarse error class, used by the orchestrator to pick abort, skip, or alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Question source is missing.
    NotFound,
    /// A source could not be parsed as structured data.
    Format,
    /// A record violates a schema invariant.
    Validation,
    /// Every question has already been published.
    Exhausted,
    /// Ledger persistence failed.
    Io,
    /// Configuration could not be loaded.
    Config,
    /// A rendering, publishing, or notification stage failed.
    Stage,
}

/// Errors surfaced by the store, ledger, selector, and pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Question source does not exist.
    #[error("question source not found: {}", .path.display())]
    NotFound {
        /// Missing path.
        path: PathBuf,
    },
    /// Source is not parseable.
    #[error("cannot parse {source_name}: {detail}")]
    Format {
        /// Path or label of the source.
        source_name: String,
        /// Parser message.
        detail: String,
    },
    /// Source exists but could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        /// Source path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Record failed schema validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No eligible question remains.
    #[error("all {total} questions have been used; add questions or reset the usage ledger")]
    Exhausted {
        /// Store size at the time of the call.
        total: usize,
    },
    /// Ledger read or write failed.
    #[error("usage ledger: {0}")]
    Ledger(#[from] PersistError),
    /// Config file missing fields or malformed.
    #[error("config {}: {detail}", .path.display())]
    Config {
        /// Config file path.
        path: PathBuf,
        /// Parser message.
        detail: String,
    },
    /// External stage failure.
    #[error("{stage} failed: {detail}")]
    Stage {
        /// Stage name.
        stage: &'static str,
        /// Failure message.
        detail: String,
    },
}

impl Error {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Format { .. } => ErrorKind::Format,
            Self::Read { .. } => ErrorKind::Io,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Exhausted { .. } => ErrorKind::Exhausted,
            Self::Ledger(PersistError::Corrupt { .. }) => ErrorKind::Format,
            Self::Ledger(_) => ErrorKind::Io,
            Self::Config { .. } => ErrorKind::Config,
            Self::Stage { .. } => ErrorKind::Stage,
        }
    }
}

/// Result alias defaulting to [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
