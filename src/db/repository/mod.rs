//! Repository layer: table-scoped database operations.
//!
//! Stage code reaches these through the store traits in
//! `pipeline::traits`; the functions are public for direct inspection.

mod artifact;
mod evidence;
mod failure;
mod status;

pub use artifact::*;
pub use evidence::*;
pub use failure::*;
pub use status::*;

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;
    use rusqlite::{params, Connection};

    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::db::DatabaseError;
    use crate::models::*;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn criteria(doc_type: DocumentType, version: &str) -> DocumentCriteria {
        DocumentCriteria::new(doc_type, DocumentFormat::Text, PipelineKey::Orig, version)
    }

    // ── status ledger ──────────────────────────────────────

    #[test]
    fn status_update_creates_ledger_entry() {
        let conn = test_db();
        let update = StatusUpdate::new(
            "PMC1",
            ProcessingStatusFlag::TextDone,
            criteria(DocumentType::Text, "0.1"),
            2,
        )
        .with_collection(Some("CORD19".into()));

        apply_status_updates(&conn, &[update]).unwrap();

        let status = get_status(&conn, "PMC1").unwrap().unwrap();
        assert!(status.is_enabled(ProcessingStatusFlag::TextDone));
        assert_eq!(status.flag_state(ProcessingStatusFlag::TextDone).unwrap().chunk_count, 2);
        assert!(status.in_collection("CORD19"));
    }

    #[test]
    fn unknown_document_has_no_status() {
        let conn = test_db();
        assert!(get_status(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn reprocessing_overwrites_criteria_without_clearing_flags() {
        let conn = test_db();
        apply_status_updates(
            &conn,
            &[
                StatusUpdate::new("d", ProcessingStatusFlag::TextDone, criteria(DocumentType::Text, "0.1"), 1),
                StatusUpdate::new("d", ProcessingStatusFlag::DpDone, criteria(DocumentType::DependencyParse, "0.1"), 1),
            ],
        )
        .unwrap();
        apply_status_updates(
            &conn,
            &[StatusUpdate::new("d", ProcessingStatusFlag::TextDone, criteria(DocumentType::Text, "0.2"), 4)],
        )
        .unwrap();

        let status = get_status(&conn, "d").unwrap().unwrap();
        assert!(status.is_enabled(ProcessingStatusFlag::DpDone));
        let text = status.flag_state(ProcessingStatusFlag::TextDone).unwrap();
        assert_eq!(text.criteria.pipeline_version, "0.2");
        assert_eq!(text.chunk_count, 4);
    }

    #[test]
    fn load_statuses_ordered_with_collections() {
        let conn = test_db();
        apply_status_updates(
            &conn,
            &[
                StatusUpdate::new("b", ProcessingStatusFlag::TextDone, criteria(DocumentType::Text, "0.1"), 1),
                StatusUpdate::new("a", ProcessingStatusFlag::TextDone, criteria(DocumentType::Text, "0.1"), 1)
                    .with_collection(Some("X".into())),
            ],
        )
        .unwrap();

        let all = load_statuses(&conn).unwrap();
        let ids: Vec<_> = all.iter().map(|s| s.document_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(all[0].in_collection("X"));
        assert!(!all[1].in_collection("X"));
    }

    #[test]
    fn corrupt_flag_value_surfaces_invalid_enum() {
        let conn = test_db();
        apply_status_updates(
            &conn,
            &[StatusUpdate::new("d", ProcessingStatusFlag::TextDone, criteria(DocumentType::Text, "0.1"), 1)],
        )
        .unwrap();
        conn.execute("UPDATE processing_flag SET flag = 'BOGUS_DONE'", []).unwrap();

        let err = load_statuses(&conn).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }

    // ── artifacts ──────────────────────────────────────────

    #[test]
    fn artifact_chunks_round_trip_in_order() {
        let conn = test_db();
        let c = criteria(DocumentType::Text, "0.1");
        let chunks = vec!["first ".to_string(), "second ".to_string(), "third".to_string()];
        put_artifact(&conn, "d", &c, &chunks).unwrap();

        assert_eq!(get_artifact(&conn, "d", &c).unwrap(), Some(chunks));
        assert_eq!(get_artifact(&conn, "other", &c).unwrap(), None);
    }

    #[test]
    fn artifact_replacement_drops_stale_chunks() {
        let conn = test_db();
        let c = criteria(DocumentType::Text, "0.1");
        put_artifact(&conn, "d", &c, &["a".into(), "b".into(), "c".into()]).unwrap();
        put_artifact(&conn, "d", &c, &["z".into()]).unwrap();

        assert_eq!(get_artifact(&conn, "d", &c).unwrap(), Some(vec!["z".to_string()]));
    }

    #[test]
    fn missing_chunk_reported_as_corrupt() {
        let conn = test_db();
        let c = criteria(DocumentType::Text, "0.1");
        put_artifact(&conn, "d", &c, &["a".into(), "b".into()]).unwrap();
        conn.execute("DELETE FROM document_artifact WHERE chunk_index = 0", []).unwrap();

        let err = get_artifact(&conn, "d", &c).unwrap_err();
        assert!(matches!(err, DatabaseError::CorruptArtifact { .. }));
    }

    #[test]
    fn get_artifacts_omits_absent_criteria() {
        let conn = test_db();
        let text = criteria(DocumentType::Text, "0.1");
        let sentences = criteria(DocumentType::Sentence, "0.1");
        put_artifact(&conn, "d", &text, &["Hello ".into(), "world".into()]).unwrap();

        let wanted: BTreeSet<_> = [text.clone(), sentences].into_iter().collect();
        let found = get_artifacts(&conn, "d", &wanted).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[&text], "Hello world");
    }

    // ── failures ───────────────────────────────────────────

    #[test]
    fn failures_persist_with_stage() {
        let conn = test_db();
        let stage = DocumentCriteria::new(
            DocumentType::DependencyParse,
            DocumentFormat::Conllu,
            PipelineKey::DependencyParse,
            "0.1",
        );
        let failure = EtlFailureData::new(stage.clone(), "d1", "parser down", Some("503".into()), Utc::now());
        insert_failures(&conn, &[failure.clone()]).unwrap();
        // same failure id is written once
        insert_failures(&conn, &[failure]).unwrap();

        let stored = failures_for_document(&conn, "d1").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].stage, stage);
        assert_eq!(stored[0].cause.as_deref(), Some("503"));
        assert!(failures_for_document(&conn, "d2").unwrap().is_empty());
        assert_eq!(list_failures(&conn).unwrap().len(), 1);
    }

    // ── evidence upserts ───────────────────────────────────

    fn ops(score: f64, zone: &str) -> Vec<UpsertOp> {
        vec![
            UpsertOp::Assertion(AssertionRow {
                assertion_id: "a1".into(),
                subject_curie: "CHEBI:1".into(),
                object_curie: "PR:1".into(),
                association_curie: "biolink:ChemicalToGeneAssociation".into(),
            }),
            UpsertOp::Evidence(EvidenceRow {
                evidence_id: "e1".into(),
                assertion_id: "a1".into(),
                document_id: "d".into(),
                sentence: "s".into(),
                subject_entity_id: "s1".into(),
                object_entity_id: "o1".into(),
                document_zone: zone.into(),
                document_publication_type: "Journal Article".into(),
                document_year_published: 2020,
            }),
            UpsertOp::Entity(EntityRow {
                entity_id: "s1".into(),
                span: "0|3".into(),
                covered_text: "abc".into(),
            }),
            UpsertOp::Entity(EntityRow {
                entity_id: "o1".into(),
                span: "5|8".into(),
                covered_text: "def".into(),
            }),
            UpsertOp::EvidenceScore(EvidenceScoreRow {
                evidence_id: "e1".into(),
                predicate_curie: "false".into(),
                score,
            }),
        ]
    }

    #[test]
    fn upserts_are_idempotent() {
        let conn = test_db();
        apply_upserts(&conn, &ops(0.1, "abstract")).unwrap();
        apply_upserts(&conn, &ops(0.1, "abstract")).unwrap();

        assert_eq!(count_rows(&conn, EvidenceTable::Assertion).unwrap(), 1);
        assert_eq!(count_rows(&conn, EvidenceTable::Evidence).unwrap(), 1);
        assert_eq!(count_rows(&conn, EvidenceTable::Entity).unwrap(), 2);
        assert_eq!(count_rows(&conn, EvidenceTable::EvidenceScore).unwrap(), 1);
    }

    #[test]
    fn upserts_overwrite_non_key_columns() {
        let conn = test_db();
        apply_upserts(&conn, &ops(0.1, "abstract")).unwrap();
        apply_upserts(&conn, &ops(0.7, "title")).unwrap();

        let evidence = get_evidence(&conn, "e1").unwrap().unwrap();
        assert_eq!(evidence.document_zone, "title");
        let scores = scores_for_evidence(&conn, "e1").unwrap();
        assert_eq!(scores.len(), 1);
        assert!((scores[0].score - 0.7).abs() < f64::EPSILON);

        let year: i32 = conn
            .query_row(
                "SELECT document_year_published FROM evidence WHERE evidence_id = ?1",
                params!["e1"],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(year, 2020);
    }
}
