//! Failure side channel.
//!
//! Stages hand per-document problems to a `FailureReporter`, which stamps
//! them with the stage descriptor and time, logs them, and collects them for
//! a single write once the stage completes.

use chrono::Utc;
use rusqlite::Connection;

use super::traits::FailureStore;
use crate::db::DatabaseError;
use crate::models::{DocumentCriteria, EtlFailureData};

pub struct FailureReporter {
    stage: DocumentCriteria,
    failures: Vec<EtlFailureData>,
}

impl FailureReporter {
    pub fn new(stage: DocumentCriteria) -> Self {
        Self {
            stage,
            failures: Vec::new(),
        }
    }

    pub fn report(&mut self, document_id: &str, message: impl AsRef<str>) -> &EtlFailureData {
        let failure = EtlFailureData::new(
            self.stage.clone(),
            document_id,
            message,
            None,
            Utc::now(),
        );
        self.push(failure)
    }

    pub fn report_error(
        &mut self,
        document_id: &str,
        message: impl AsRef<str>,
        error: &dyn std::error::Error,
    ) -> &EtlFailureData {
        let failure = EtlFailureData::from_error(
            self.stage.clone(),
            document_id,
            message,
            error,
            Utc::now(),
        );
        self.push(failure)
    }

    fn push(&mut self, failure: EtlFailureData) -> &EtlFailureData {
        tracing::warn!(
            stage = %failure.stage,
            document_id = %failure.document_id,
            cause = failure.cause.as_deref().unwrap_or(""),
            "{}",
            failure.message
        );
        self.failures.push(failure);
        let last = self.failures.len() - 1;
        &self.failures[last]
    }

    pub fn failures(&self) -> &[EtlFailureData] {
        &self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_failures(self) -> Vec<EtlFailureData> {
        self.failures
    }

    /// Persist collected failures.
    pub fn flush(&self, conn: &Connection, store: &dyn FailureStore) -> Result<(), DatabaseError> {
        if self.is_empty() {
            return Ok(());
        }
        store.record(conn, &self.failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{DocumentFormat, DocumentType, PipelineKey};
    use crate::pipeline::store::SqliteFailureStore;

    fn stage() -> DocumentCriteria {
        DocumentCriteria::new(
            DocumentType::DependencyParse,
            DocumentFormat::Conllu,
            PipelineKey::DependencyParse,
            "0.1",
        )
    }

    #[test]
    fn reports_carry_stage_and_cause() {
        let mut reporter = FailureReporter::new(stage());
        reporter.report("d1", "missing sentence annotations");
        let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "read timed out");
        let failure = reporter.report_error("d2", "parser call failed", &err);

        assert_eq!(failure.stage, stage());
        assert_eq!(failure.cause.as_deref(), Some("read timed out"));
        assert_eq!(reporter.failures().len(), 2);
        assert_eq!(reporter.failures()[0].cause, None);
    }

    #[test]
    fn flush_persists_once() {
        let conn = open_memory_database().unwrap();
        let store = SqliteFailureStore::new();
        let mut reporter = FailureReporter::new(stage());
        reporter.report("d1", "bad encoding");
        reporter.flush(&conn, &store).unwrap();
        reporter.flush(&conn, &store).unwrap();

        assert_eq!(store.for_document(&conn, "d1").unwrap().len(), 1);
    }
}
