//! Error taxonomy for the pipeline tracker
//!
//! Every boundary operation fails with one of these kinds. Kinds map directly
//! to the propagation policy: InvalidInput, PathRejected, StoreWrite and
//! InvalidTimestamp are never swallowed; NotFound, Corrupted and UnknownAgent
//! are surfaced with context but also never silently dropped.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("path rejected: {path} ({reason})")]
    PathRejected { path: PathBuf, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid timestamp for agent '{agent}': {reason}")]
    InvalidTimestamp { agent: String, reason: String },

    #[error("failed to write session store: {0}")]
    StoreWrite(String),

    #[error("corrupted session document at {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },

    #[error("unknown agent: '{0}'")]
    UnknownAgent(String),
}

impl TrackerError {
    /// Exit code used by the CLI shell (§6.6: "non-zero propagation for
    /// validation errors"). `1` is reserved for logical failure (a `verify_*`
    /// call returning false, unknown subcommand, missing arguments); every
    /// error kind below gets its own higher code so scripts can distinguish
    /// "ran and failed" from "rejected before running".
    pub fn exit_code(&self) -> i32 {
        match self {
            TrackerError::InvalidInput(_) => 2,
            TrackerError::PathRejected { .. } => 3,
            TrackerError::UnknownAgent(_) => 4,
            TrackerError::NotFound(_) => 5,
            TrackerError::InvalidTimestamp { .. } => 6,
            TrackerError::StoreWrite(_) => 7,
            TrackerError::Corrupted { .. } => 8,
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        TrackerError::InvalidInput(msg.into())
    }

    pub fn path_rejected(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        TrackerError::PathRejected {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        TrackerError::StoreWrite(err.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Corrupted {
            path: PathBuf::new(),
            reason: err.to_string(),
        }
    }
}
