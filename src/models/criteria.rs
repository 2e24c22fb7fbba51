use serde::{Deserialize, Serialize};

use super::enums::{DocumentFormat, DocumentType, PipelineKey};

/// Identifies one stored artifact variant.
///
/// Two criteria are the same artifact slot iff all four fields match, so the
/// type is used directly as a map key when joining artifacts per document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentCriteria {
    pub document_type: DocumentType,
    pub document_format: DocumentFormat,
    pub pipeline: PipelineKey,
    pub pipeline_version: String,
}

impl DocumentCriteria {
    pub fn new(
        document_type: DocumentType,
        document_format: DocumentFormat,
        pipeline: PipelineKey,
        pipeline_version: impl Into<String>,
    ) -> Self {
        Self {
            document_type,
            document_format,
            pipeline,
            pipeline_version: pipeline_version.into(),
        }
    }
}

impl std::fmt::Display for DocumentCriteria {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.document_type, self.document_format, self.pipeline, self.pipeline_version
        )
    }
}
