//! Stage-level error types.
//!
//! Per-document problems become `EtlFailureData` records and never surface
//! here; a `StageError` aborts the whole stage run.

use std::path::PathBuf;

use thiserror::Error;

use super::join::JoinError;
use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum StageError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Join error: {0}")]
    Join(#[from] JoinError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Error, Debug)]
pub enum DependencyParseError {
    #[error("Dependency parser unreachable at {0}")]
    Connection(String),

    #[error("Dependency parser request failed: {0}")]
    Http(String),

    #[error("Dependency parser returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Dependency parser returned an empty document")]
    EmptyResponse,
}
