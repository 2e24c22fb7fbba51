use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::*;

/// Apply upserts in one transaction. Every statement overwrites all non-key
/// columns on a key conflict, so replaying the same ops leaves the tables
/// unchanged.
pub fn apply_upserts(conn: &Connection, ops: &[UpsertOp]) -> Result<usize, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut assertion_stmt = tx.prepare(
            "INSERT INTO assertion (assertion_id, subject_curie, object_curie, association_curie)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(assertion_id) DO UPDATE SET
                subject_curie = excluded.subject_curie,
                object_curie = excluded.object_curie,
                association_curie = excluded.association_curie",
        )?;
        let mut evidence_stmt = tx.prepare(
            "INSERT INTO evidence
             (evidence_id, assertion_id, document_id, sentence, subject_entity_id, object_entity_id,
              document_zone, document_publication_type, document_year_published)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(evidence_id) DO UPDATE SET
                assertion_id = excluded.assertion_id,
                document_id = excluded.document_id,
                sentence = excluded.sentence,
                subject_entity_id = excluded.subject_entity_id,
                object_entity_id = excluded.object_entity_id,
                document_zone = excluded.document_zone,
                document_publication_type = excluded.document_publication_type,
                document_year_published = excluded.document_year_published",
        )?;
        let mut entity_stmt = tx.prepare(
            "INSERT INTO entity (entity_id, span, covered_text)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(entity_id) DO UPDATE SET
                span = excluded.span,
                covered_text = excluded.covered_text",
        )?;
        let mut score_stmt = tx.prepare(
            "INSERT INTO evidence_score (evidence_id, predicate_curie, score)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(evidence_id, predicate_curie) DO UPDATE SET
                score = excluded.score",
        )?;

        for op in ops {
            match op {
                UpsertOp::Assertion(row) => {
                    assertion_stmt.execute(params![
                        row.assertion_id,
                        row.subject_curie,
                        row.object_curie,
                        row.association_curie,
                    ])?;
                }
                UpsertOp::Evidence(row) => {
                    evidence_stmt.execute(params![
                        row.evidence_id,
                        row.assertion_id,
                        row.document_id,
                        row.sentence,
                        row.subject_entity_id,
                        row.object_entity_id,
                        row.document_zone,
                        row.document_publication_type,
                        row.document_year_published,
                    ])?;
                }
                UpsertOp::Entity(row) => {
                    entity_stmt.execute(params![row.entity_id, row.span, row.covered_text])?;
                }
                UpsertOp::EvidenceScore(row) => {
                    score_stmt.execute(params![row.evidence_id, row.predicate_curie, row.score])?;
                }
            }
        }
    }
    tx.commit()?;
    Ok(ops.len())
}

pub fn count_rows(conn: &Connection, table: EvidenceTable) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", table.as_str()),
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn get_evidence(conn: &Connection, evidence_id: &str) -> Result<Option<EvidenceRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT evidence_id, assertion_id, document_id, sentence, subject_entity_id, object_entity_id,
                document_zone, document_publication_type, document_year_published
         FROM evidence WHERE evidence_id = ?1",
    )?;
    let mut rows = stmt.query_map(params![evidence_id], |row| {
        Ok(EvidenceRow {
            evidence_id: row.get(0)?,
            assertion_id: row.get(1)?,
            document_id: row.get(2)?,
            sentence: row.get(3)?,
            subject_entity_id: row.get(4)?,
            object_entity_id: row.get(5)?,
            document_zone: row.get(6)?,
            document_publication_type: row.get(7)?,
            document_year_published: row.get(8)?,
        })
    })?;
    let row = rows.next().transpose()?;
    Ok(row)
}

pub fn scores_for_evidence(
    conn: &Connection,
    evidence_id: &str,
) -> Result<Vec<EvidenceScoreRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT evidence_id, predicate_curie, score FROM evidence_score
         WHERE evidence_id = ?1 ORDER BY predicate_curie ASC",
    )?;
    let rows = stmt
        .query_map(params![evidence_id], |row| {
            Ok(EvidenceScoreRow {
                evidence_id: row.get(0)?,
                predicate_curie: row.get(1)?,
                score: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Tables written by the evidence upserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceTable {
    Assertion,
    Evidence,
    Entity,
    EvidenceScore,
}

impl EvidenceTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assertion => "assertion",
            Self::Evidence => "evidence",
            Self::Entity => "entity",
            Self::EvidenceScore => "evidence_score",
        }
    }
}
