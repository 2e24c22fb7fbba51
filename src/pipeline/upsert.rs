//! Extracted sentences → content-addressed evidence rows.
//!
//! Every id is a hash of the row's semantic content, so writing the same
//! sentence twice lands on the same keys and leaves the tables unchanged.

use serde::{Deserialize, Serialize};

use super::identity;
use crate::models::{
    AssertionRow, BiolinkAssociation, EntityMention, EntityRow, EvidenceRow, EvidenceScoreRow,
    ExtractedSentence, UpsertOp,
};

/// Largest year the evidence table stores; later years are clamped.
pub const MAX_YEAR_PUBLISHED: i32 = 2155;

pub fn clamp_year(year: i32) -> i32 {
    year.min(MAX_YEAR_PUBLISHED)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateScore {
    pub predicate_curie: String,
    pub score: f64,
}

/// Everything written for one accepted sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceRecord {
    pub assertion: AssertionRow,
    pub evidence: EvidenceRow,
    pub subject: EntityRow,
    pub object: EntityRow,
    pub scores: Vec<PredicateScore>,
}

impl EvidenceRecord {
    /// Subject is whichever entity carries the association's subject
    /// placeholder; if neither does, entity 2.
    pub fn from_sentence(
        es: &ExtractedSentence,
        association: &BiolinkAssociation,
        scores: Vec<PredicateScore>,
    ) -> Self {
        let (subject, object) = if es.entity1.placeholder == association.subject_placeholder {
            (&es.entity1, &es.entity2)
        } else {
            (&es.entity2, &es.entity1)
        };
        let subject_span = subject.span_str();
        let object_span = object.span_str();
        let sentence = es.sentence_text.as_str();
        let document_id = es.document_id.as_str();

        let assertion_id =
            identity::assertion_id(&subject.id, &object.id, &association.association_id);
        let evidence_id = identity::evidence_id(
            document_id,
            sentence,
            &subject.id,
            &subject_span,
            &object.id,
            &object_span,
        );
        let subject_entity = entity_row(document_id, sentence, subject, subject_span);
        let object_entity = entity_row(document_id, sentence, object, object_span);

        Self {
            assertion: AssertionRow {
                assertion_id: assertion_id.clone(),
                subject_curie: subject.id.clone(),
                object_curie: object.id.clone(),
                association_curie: association.association_id.clone(),
            },
            evidence: EvidenceRow {
                evidence_id,
                assertion_id,
                document_id: document_id.to_string(),
                sentence: sentence.to_string(),
                subject_entity_id: subject_entity.entity_id.clone(),
                object_entity_id: object_entity.entity_id.clone(),
                document_zone: es.metadata.zone.clone(),
                document_publication_type: es.metadata.publication_types_str(),
                document_year_published: clamp_year(es.metadata.year_published),
            },
            subject: subject_entity,
            object: object_entity,
            scores,
        }
    }

    /// Assertion, evidence, subject and object entities, then one score row
    /// per predicate.
    pub fn to_upserts(&self) -> Vec<UpsertOp> {
        let mut ops = Vec::with_capacity(4 + self.scores.len());
        ops.push(UpsertOp::Assertion(self.assertion.clone()));
        ops.push(UpsertOp::Evidence(self.evidence.clone()));
        ops.push(UpsertOp::Entity(self.subject.clone()));
        ops.push(UpsertOp::Entity(self.object.clone()));
        ops.extend(self.scores.iter().map(|s| {
            UpsertOp::EvidenceScore(EvidenceScoreRow {
                evidence_id: self.evidence.evidence_id.clone(),
                predicate_curie: s.predicate_curie.clone(),
                score: s.score,
            })
        }));
        ops
    }
}

/// Direct extraction path: rows for a sentence without classifier scores.
pub fn map_extracted_sentence(
    es: &ExtractedSentence,
    association: &BiolinkAssociation,
) -> Vec<UpsertOp> {
    EvidenceRecord::from_sentence(es, association, Vec::new()).to_upserts()
}

fn entity_row(document_id: &str, sentence: &str, mention: &EntityMention, span: String) -> EntityRow {
    EntityRow {
        entity_id: identity::entity_id(document_id, sentence, &mention.id, &span),
        span,
        covered_text: mention.covered_text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{apply_upserts, count_rows, get_evidence, EvidenceTable};
    use crate::db::sqlite::open_memory_database;
    use crate::models::{DocumentMetadata, Span};

    fn association() -> BiolinkAssociation {
        BiolinkAssociation {
            association_id: "biolink:ChemicalToGeneAssociation".into(),
            subject_placeholder: "@CHEMICAL$".into(),
            object_placeholder: "@GENE$".into(),
            predicate_curies: vec!["biolink:entity_negatively_regulates_entity".into(), "false".into()],
        }
    }

    fn mention(placeholder: &str, id: &str, text: &str, start: usize) -> EntityMention {
        EntityMention {
            placeholder: placeholder.into(),
            id: id.into(),
            covered_text: text.into(),
            spans: vec![Span::new(start, start + text.chars().count())],
        }
    }

    fn sentence(year: i32) -> ExtractedSentence {
        ExtractedSentence {
            document_id: "PMC7".into(),
            entity1: mention("@GENE$", "PR:000013408", "PTGS2", 17),
            entity2: mention("@CHEMICAL$", "CHEBI:15365", "Aspirin", 0),
            keyword: None,
            sentence_text: "Aspirin inhibits PTGS2.".into(),
            sentence_span: Span::new(0, 23),
            metadata: DocumentMetadata {
                year_published: year,
                zone: "title".into(),
                publication_types: vec!["Journal Article".into(), "Review".into()],
            },
        }
    }

    fn scores() -> Vec<PredicateScore> {
        vec![
            PredicateScore {
                predicate_curie: "biolink:entity_negatively_regulates_entity".into(),
                score: 0.92,
            },
            PredicateScore {
                predicate_curie: "false".into(),
                score: 0.08,
            },
        ]
    }

    #[test]
    fn roles_follow_subject_placeholder() {
        let record = EvidenceRecord::from_sentence(&sentence(2020), &association(), scores());
        assert_eq!(record.assertion.subject_curie, "CHEBI:15365");
        assert_eq!(record.assertion.object_curie, "PR:000013408");
        assert_eq!(record.subject.span, "0|7");
        assert_eq!(record.object.covered_text, "PTGS2");
        assert_eq!(record.evidence.document_publication_type, "Journal Article|Review");
    }

    #[test]
    fn ids_are_hashes_of_plain_concatenation() {
        let record = EvidenceRecord::from_sentence(&sentence(2020), &association(), scores());
        assert_eq!(
            record.assertion.assertion_id,
            identity::content_id(&[
                "CHEBI:15365PR:000013408biolink:ChemicalToGeneAssociation"
            ])
        );
        assert_eq!(
            record.subject.entity_id,
            identity::content_id(&["PMC7Aspirin inhibits PTGS2.CHEBI:153650|7"])
        );
        assert_eq!(record.evidence.subject_entity_id, record.subject.entity_id);
        assert_eq!(record.evidence.assertion_id, record.assertion.assertion_id);
    }

    #[test]
    fn year_clamped_to_storable_range() {
        assert_eq!(clamp_year(2200), 2155);
        assert_eq!(clamp_year(1999), 1999);
        let record = EvidenceRecord::from_sentence(&sentence(2200), &association(), scores());
        assert_eq!(record.evidence.document_year_published, 2155);
    }

    #[test]
    fn one_score_row_per_predicate() {
        let ops = EvidenceRecord::from_sentence(&sentence(2020), &association(), scores()).to_upserts();
        let tables: Vec<_> = ops.iter().map(UpsertOp::table).collect();
        assert_eq!(
            tables,
            vec!["assertion", "evidence", "entity", "entity", "evidence_score", "evidence_score"]
        );
        assert_eq!(map_extracted_sentence(&sentence(2020), &association()).len(), 4);
    }

    #[test]
    fn mapping_twice_leaves_store_unchanged() {
        let conn = open_memory_database().unwrap();
        let first = EvidenceRecord::from_sentence(&sentence(2020), &association(), scores());
        let second = EvidenceRecord::from_sentence(&sentence(2020), &association(), scores());
        assert_eq!(first, second);

        apply_upserts(&conn, &first.to_upserts()).unwrap();
        let before = get_evidence(&conn, &first.evidence.evidence_id).unwrap();
        apply_upserts(&conn, &second.to_upserts()).unwrap();
        let after = get_evidence(&conn, &first.evidence.evidence_id).unwrap();

        assert_eq!(before, after);
        assert_eq!(count_rows(&conn, EvidenceTable::Assertion).unwrap(), 1);
        assert_eq!(count_rows(&conn, EvidenceTable::Entity).unwrap(), 2);
        assert_eq!(count_rows(&conn, EvidenceTable::EvidenceScore).unwrap(), 2);
    }
}
