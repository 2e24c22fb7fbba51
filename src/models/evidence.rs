//! Rows of the relational evidence schema and the upsert operations that
//! write them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionRow {
    pub assertion_id: String,
    pub subject_curie: String,
    pub object_curie: String,
    pub association_curie: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRow {
    pub evidence_id: String,
    pub assertion_id: String,
    pub document_id: String,
    pub sentence: String,
    pub subject_entity_id: String,
    pub object_entity_id: String,
    pub document_zone: String,
    pub document_publication_type: String,
    pub document_year_published: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRow {
    pub entity_id: String,
    pub span: String,
    pub covered_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceScoreRow {
    pub evidence_id: String,
    pub predicate_curie: String,
    pub score: f64,
}

/// Insert-or-overwrite on the row's key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpsertOp {
    Assertion(AssertionRow),
    Evidence(EvidenceRow),
    Entity(EntityRow),
    EvidenceScore(EvidenceScoreRow),
}

impl UpsertOp {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Assertion(_) => "assertion",
            Self::Evidence(_) => "evidence",
            Self::Entity(_) => "entity",
            Self::EvidenceScore(_) => "evidence_score",
        }
    }
}
