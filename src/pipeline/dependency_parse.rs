//! Dependency parse stage: TEXT artifact → external parser → CoNLL-U
//! artifact.

use std::collections::BTreeSet;
use std::time::Duration;

use rusqlite::Connection;

use super::error::{DependencyParseError, StageError};
use super::failure::FailureReporter;
use super::gate::{success_status_updates, StageGate};
use super::output::StageOutput;
use super::text::chunk_content;
use super::traits::{ArtifactStore, DependencyParser, FailureStore, StatusStore};
use crate::models::{DocumentCriteria, ProcessingStatusFlag};

/// Parser service reached by HTTP POST of the plain text.
pub struct HttpDependencyParser {
    uri: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpDependencyParser {
    pub fn new(uri: &str, timeout_secs: u64) -> Result<Self, DependencyParseError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DependencyParseError::Http(e.to_string()))?;

        Ok(Self {
            uri: uri.to_string(),
            client,
            timeout_secs,
        })
    }
}

impl DependencyParser for HttpDependencyParser {
    fn parse(&self, text: &str) -> Result<String, DependencyParseError> {
        let response = self
            .client
            .post(&self.uri)
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(text.to_string())
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    DependencyParseError::Connection(self.uri.clone())
                } else if e.is_timeout() {
                    DependencyParseError::Http(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    DependencyParseError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(DependencyParseError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let conllu = response
            .text()
            .map_err(|e| DependencyParseError::Http(e.to_string()))?;
        if conllu.trim().is_empty() {
            return Err(DependencyParseError::EmptyResponse);
        }
        Ok(conllu)
    }
}

pub struct DependencyParseStage {
    /// Criteria of the TEXT artifact read.
    pub input: DocumentCriteria,
    /// Criteria the CONLLU artifact is stored and flagged under.
    pub output: DocumentCriteria,
    pub collection: Option<String>,
    pub max_chunk_bytes: usize,
}

impl DependencyParseStage {
    pub fn gate(&self) -> StageGate {
        StageGate::new(ProcessingStatusFlag::DpDone, [ProcessingStatusFlag::TextDone])
            .with_collection(self.collection.clone())
    }

    pub fn run(
        &self,
        conn: &Connection,
        artifacts: &dyn ArtifactStore,
        statuses: &dyn StatusStore,
        failures: &dyn FailureStore,
        parser: &dyn DependencyParser,
    ) -> Result<StageOutput<String>, StageError> {
        let eligible = self.gate().eligible(&statuses.load_all(conn)?);
        tracing::info!(stage = %self.output, documents = eligible.len(), "Dependency parse starting");

        let wanted: BTreeSet<DocumentCriteria> = [self.input.clone()].into_iter().collect();
        let mut reporter = FailureReporter::new(self.output.clone());
        let mut output = StageOutput::new();
        let mut chunk_counts = Vec::new();

        for document_id in &eligible {
            let Some(text) = artifacts.get_all(conn, document_id, &wanted)?.remove(&self.input) else {
                reporter.report(document_id, format!("Missing {} artifact", self.input));
                continue;
            };
            match parser.parse(&text) {
                Ok(conllu) => {
                    let chunks = chunk_content(&conllu, self.max_chunk_bytes);
                    artifacts.put(conn, document_id, &self.output, &chunks)?;
                    chunk_counts.push(chunks.len() as u32);
                    output.push(document_id.clone());
                }
                Err(e) => {
                    reporter.report_error(document_id, "Dependency parse failed", &e);
                }
            }
        }

        output.failures = reporter.into_failures();
        output.status_updates = success_status_updates(
            output.primary.iter().map(String::as_str).zip(chunk_counts),
            &output.failures,
            ProcessingStatusFlag::DpDone,
            &self.output,
        );
        statuses.apply(conn, &output.status_updates)?;
        if !output.failures.is_empty() {
            failures.record(conn, &output.failures)?;
        }

        tracing::info!(
            stage = %self.output,
            parsed = output.primary.len(),
            failures = output.failures.len(),
            "Dependency parse finished"
        );
        Ok(output)
    }
}
