//! Relation classifier output → stored evidence.

pub mod scores;
pub mod storage;

pub use scores::{parse_classifier_line, ClassifierLine};
pub use storage::ClassifiedSentenceStorage;

use thiserror::Error;

use crate::models::MetadataLineError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassificationError {
    #[error("Classifier line has {found} columns, expected {expected}")]
    ColumnCount { expected: usize, found: usize },

    #[error("Invalid score in column {column}: {value}")]
    InvalidScore { column: usize, value: String },

    #[error("Invalid metadata line: {0}")]
    Metadata(#[from] MetadataLineError),
}
