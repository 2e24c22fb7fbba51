//! Sentence-level concept co-occurrence extraction.
//!
//! Pairs two CRF-confirmed concept families within sentences and writes the
//! candidates out for relation classification.

pub mod annotation;
pub mod engine;
pub mod keywords;
pub mod stage;

pub use annotation::{parse_bionlp, AnnotationError, DocumentText, TextAnnotation};
pub use engine::{ConceptFamily, ConceptPairing, SentenceExtractor};
pub use keywords::KeywordMatcher;
pub use stage::{SentenceExtractionStage, SentenceFiles};

use thiserror::Error;

use crate::models::DocumentCriteria;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("Missing artifacts for {document_id}: {missing:?}")]
    MissingArtifacts {
        document_id: String,
        missing: Vec<String>,
    },

    #[error("Bad annotations in {criteria}: {source}")]
    Annotation {
        criteria: DocumentCriteria,
        #[source]
        source: AnnotationError,
    },
}
