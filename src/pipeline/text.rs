//! Text extraction stage: plain-text files → chunked TEXT artifacts and the
//! first status entry for each document.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use super::error::StageError;
use super::failure::FailureReporter;
use super::output::StageOutput;
use super::traits::{ArtifactStore, FailureStore, StatusStore};
use crate::models::{DocumentCriteria, ProcessingStatusFlag, StatusUpdate};

/// Default artifact chunk limit in bytes.
pub const DEFAULT_MAX_CHUNK_BYTES: usize = 1_000_000;

/// File name without directories or `suffix`.
pub fn document_id_from_path(path: &Path, suffix: &str) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    match name.strip_suffix(suffix) {
        Some(stripped) if !suffix.is_empty() && !stripped.is_empty() => stripped.to_string(),
        _ => name,
    }
}

/// Split `text` into pieces of at most `max_bytes`, never inside a char.
/// Empty text yields a single empty chunk.
pub fn chunk_content(text: &str, max_bytes: usize) -> Vec<String> {
    let max_bytes = max_bytes.max(4);
    let mut chunks = Vec::new();
    let mut rest = text;
    while rest.len() > max_bytes {
        let mut end = max_bytes;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        chunks.push(head.to_string());
        rest = tail;
    }
    chunks.push(rest.to_string());
    chunks
}

pub struct TextExtractionStage {
    /// Criteria the TEXT artifact is stored and flagged under.
    pub output: DocumentCriteria,
    pub file_suffix: String,
    pub collection: Option<String>,
    pub max_chunk_bytes: usize,
}

impl TextExtractionStage {
    /// Store one document's text. The status update is emitted, not applied.
    pub fn process_document(
        &self,
        conn: &Connection,
        artifacts: &dyn ArtifactStore,
        document_id: &str,
        text: &str,
    ) -> Result<StageOutput<String>, StageError> {
        let chunks = chunk_content(text, self.max_chunk_bytes);
        artifacts.put(conn, document_id, &self.output, &chunks)?;

        let mut out = StageOutput::new();
        out.push_status(
            StatusUpdate::new(
                document_id,
                ProcessingStatusFlag::TextDone,
                self.output.clone(),
                chunks.len() as u32,
            )
            .with_collection(self.collection.clone()),
        );
        out.push(document_id.to_string());
        Ok(out)
    }

    pub fn run(
        &self,
        conn: &Connection,
        artifacts: &dyn ArtifactStore,
        statuses: &dyn StatusStore,
        failures: &dyn FailureStore,
        files: &[PathBuf],
    ) -> Result<StageOutput<String>, StageError> {
        tracing::info!(stage = %self.output, files = files.len(), "Text extraction starting");

        let mut reporter = FailureReporter::new(self.output.clone());
        let mut output = StageOutput::new();
        for path in files {
            let document_id = document_id_from_path(path, &self.file_suffix);
            let text = match std::fs::read(path) {
                Ok(bytes) => String::from_utf8(bytes).map_err(|e| e.utf8_error()),
                Err(e) => {
                    let source = path.display().to_string();
                    reporter.report_error(&source, "Unable to read input file", &e);
                    continue;
                }
            };
            match text {
                Ok(text) => output.extend(self.process_document(conn, artifacts, &document_id, &text)?),
                Err(e) => {
                    reporter.report_error(
                        &document_id,
                        "Failure saving text file. Likely encoding issue with input document.",
                        &e,
                    );
                }
            }
        }

        statuses.apply(conn, &output.status_updates)?;
        reporter.flush(conn, failures)?;
        output.failures = reporter.into_failures();

        tracing::info!(
            stage = %self.output,
            documents = output.primary.len(),
            failures = output.failures.len(),
            "Text extraction finished"
        );
        Ok(output)
    }
}
