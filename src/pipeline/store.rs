//! SQLite-backed implementations of the store traits.

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::Connection;

use super::traits::{ArtifactStore, EvidenceStore, FailureStore, StatusStore};
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::{DocumentCriteria, EtlFailureData, ProcessingStatus, StatusUpdate, UpsertOp};

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteArtifactStore;

impl SqliteArtifactStore {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactStore for SqliteArtifactStore {
    fn put(
        &self,
        conn: &Connection,
        document_id: &str,
        criteria: &DocumentCriteria,
        chunks: &[String],
    ) -> Result<(), DatabaseError> {
        repository::put_artifact(conn, document_id, criteria, chunks)
    }

    fn get_all(
        &self,
        conn: &Connection,
        document_id: &str,
        criteria: &BTreeSet<DocumentCriteria>,
    ) -> Result<BTreeMap<DocumentCriteria, String>, DatabaseError> {
        repository::get_artifacts(conn, document_id, criteria)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteStatusStore;

impl SqliteStatusStore {
    pub fn new() -> Self {
        Self
    }
}

impl StatusStore for SqliteStatusStore {
    fn load_all(&self, conn: &Connection) -> Result<Vec<ProcessingStatus>, DatabaseError> {
        repository::load_statuses(conn)
    }

    fn get(
        &self,
        conn: &Connection,
        document_id: &str,
    ) -> Result<Option<ProcessingStatus>, DatabaseError> {
        repository::get_status(conn, document_id)
    }

    fn apply(&self, conn: &Connection, updates: &[StatusUpdate]) -> Result<usize, DatabaseError> {
        repository::apply_status_updates(conn, updates)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteFailureStore;

impl SqliteFailureStore {
    pub fn new() -> Self {
        Self
    }
}

impl FailureStore for SqliteFailureStore {
    fn record(&self, conn: &Connection, failures: &[EtlFailureData]) -> Result<(), DatabaseError> {
        repository::insert_failures(conn, failures)
    }

    fn for_document(
        &self,
        conn: &Connection,
        document_id: &str,
    ) -> Result<Vec<EtlFailureData>, DatabaseError> {
        repository::failures_for_document(conn, document_id)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteEvidenceStore;

impl SqliteEvidenceStore {
    pub fn new() -> Self {
        Self
    }
}

impl EvidenceStore for SqliteEvidenceStore {
    fn apply(&self, conn: &Connection, ops: &[UpsertOp]) -> Result<usize, DatabaseError> {
        repository::apply_upserts(conn, ops)
    }
}
