use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::criteria::DocumentCriteria;

/// Stored message limit in bytes.
pub const MAX_FAILURE_MESSAGE_BYTES: usize = 1500;

/// A per-document failure captured at one stage. Written once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtlFailureData {
    pub failure_id: String,
    pub stage: DocumentCriteria,
    pub document_id: String,
    pub message: String,
    pub cause: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl EtlFailureData {
    pub fn new(
        stage: DocumentCriteria,
        document_id: impl Into<String>,
        message: impl AsRef<str>,
        cause: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            failure_id: Uuid::new_v4().to_string(),
            stage,
            document_id: document_id.into(),
            message: truncate_to_bytes(message.as_ref(), MAX_FAILURE_MESSAGE_BYTES).to_string(),
            cause,
            occurred_at,
        }
    }

    /// Capture an error and its source chain as the cause.
    pub fn from_error(
        stage: DocumentCriteria,
        document_id: impl Into<String>,
        message: impl AsRef<str>,
        error: &dyn std::error::Error,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self::new(stage, document_id, message, Some(error_chain(error)), occurred_at)
    }
}

/// `error: source: source ...`
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char.
pub fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
