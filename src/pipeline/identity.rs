//! Content-addressed identifiers.
//!
//! Each id is the SHA-256 hex digest of its fields concatenated with no
//! separator. The field order is part of the stored data's identity and must
//! not change.

use sha2::{Digest, Sha256};

use crate::models::ExtractedSentence;

/// SHA-256 of the plain concatenation of `parts`, lowercase hex.
pub fn content_id(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

pub fn assertion_id(subject_curie: &str, object_curie: &str, association_curie: &str) -> String {
    content_id(&[subject_curie, object_curie, association_curie])
}

pub fn evidence_id(
    document_id: &str,
    sentence: &str,
    subject_curie: &str,
    subject_span: &str,
    object_curie: &str,
    object_span: &str,
) -> String {
    content_id(&[
        document_id,
        sentence,
        subject_curie,
        subject_span,
        object_curie,
        object_span,
    ])
}

pub fn entity_id(document_id: &str, sentence: &str, curie: &str, span: &str) -> String {
    content_id(&[document_id, sentence, curie, span])
}

/// Keys metadata and classifier lines for one extracted sentence.
pub fn sentence_id(es: &ExtractedSentence) -> String {
    content_id(&[
        &es.document_id,
        &es.sentence_text,
        &es.entity1.id,
        &es.entity1.span_str(),
        &es.entity2.id,
        &es.entity2.span_str(),
    ])
}
