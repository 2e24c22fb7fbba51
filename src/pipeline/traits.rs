//! Seams between stage logic and its collaborators.
//!
//! Stages take a `&Connection` plus these traits so tests can swap the
//! parser service or inspect what a run would persist.

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::Connection;

use super::error::DependencyParseError;
use crate::db::DatabaseError;
use crate::models::{DocumentCriteria, EtlFailureData, ProcessingStatus, StatusUpdate, UpsertOp};

/// Chunked per-document artifacts keyed by criteria.
pub trait ArtifactStore: Send + Sync {
    fn put(
        &self,
        conn: &Connection,
        document_id: &str,
        criteria: &DocumentCriteria,
        chunks: &[String],
    ) -> Result<(), DatabaseError>;

    /// Concatenated content for each requested criteria that exists.
    fn get_all(
        &self,
        conn: &Connection,
        document_id: &str,
        criteria: &BTreeSet<DocumentCriteria>,
    ) -> Result<BTreeMap<DocumentCriteria, String>, DatabaseError>;
}

/// The processing-status ledger.
pub trait StatusStore: Send + Sync {
    fn load_all(&self, conn: &Connection) -> Result<Vec<ProcessingStatus>, DatabaseError>;

    fn get(
        &self,
        conn: &Connection,
        document_id: &str,
    ) -> Result<Option<ProcessingStatus>, DatabaseError>;

    /// Apply a batch of monotonic updates atomically.
    fn apply(&self, conn: &Connection, updates: &[StatusUpdate]) -> Result<usize, DatabaseError>;
}

pub trait FailureStore: Send + Sync {
    fn record(&self, conn: &Connection, failures: &[EtlFailureData]) -> Result<(), DatabaseError>;

    fn for_document(
        &self,
        conn: &Connection,
        document_id: &str,
    ) -> Result<Vec<EtlFailureData>, DatabaseError>;
}

/// Relational evidence tables.
pub trait EvidenceStore: Send + Sync {
    fn apply(&self, conn: &Connection, ops: &[UpsertOp]) -> Result<usize, DatabaseError>;
}

/// External dependency-parse service: text in, CoNLL-U out.
pub trait DependencyParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<String, DependencyParseError>;
}
