//! Classified sentence storage: classifier output ⋈ sentence metadata →
//! evidence upserts.
//!
//! Both inputs are keyed by sentence id. A key present in only one file is
//! expected (the classifier header line, sentences the classifier skipped)
//! and produces nothing. A key appearing twice in one file aborts the run.

use std::path::Path;

use rusqlite::Connection;

use super::scores::parse_classifier_line;
use super::ClassificationError;
use crate::models::{BiolinkAssociation, DocumentCriteria, ExtractedSentence, UpsertOp};
use crate::pipeline::error::StageError;
use crate::pipeline::failure::FailureReporter;
use crate::pipeline::join::{join_pair, key_lines, PairJoin};
use crate::pipeline::output::StageOutput;
use crate::pipeline::traits::{EvidenceStore, FailureStore};
use crate::pipeline::upsert::EvidenceRecord;

const CLASSIFIER_TAG: &str = "classifier_output";
const METADATA_TAG: &str = "sentence_metadata";

pub struct ClassifiedSentenceStorage {
    pub association: BiolinkAssociation,
    /// A real predicate must score strictly above this.
    pub threshold: f64,
    /// Descriptor stamped on failures.
    pub stage: DocumentCriteria,
}

impl ClassifiedSentenceStorage {
    /// Evidence for one joined pair, or `None` when every real predicate
    /// scores at or below the threshold.
    pub fn process_pair(
        &self,
        classifier_line: &str,
        metadata_line: &str,
    ) -> Result<Option<EvidenceRecord>, ClassificationError> {
        let classified = parse_classifier_line(classifier_line, &self.association)?;
        if !classified.meets_threshold(self.threshold) {
            return Ok(None);
        }
        let sentence = ExtractedSentence::from_tsv(metadata_line)?;
        Ok(Some(EvidenceRecord::from_sentence(
            &sentence,
            &self.association,
            classified.scores,
        )))
    }

    /// Join the two line sets and map accepted pairs. Pure apart from logging.
    pub fn map_lines<C, M>(
        &self,
        classifier_lines: C,
        metadata_lines: M,
    ) -> Result<StageOutput<EvidenceRecord>, StageError>
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        let joined = join_pair(
            CLASSIFIER_TAG,
            key_lines(classifier_lines, 0),
            METADATA_TAG,
            key_lines(metadata_lines, 0),
        )?;

        let mut reporter = FailureReporter::new(self.stage.clone());
        let mut output = StageOutput::new();
        for (sentence_id, pair) in joined {
            match pair {
                PairJoin::Both(classifier_line, metadata_line) => {
                    match self.process_pair(&classifier_line, &metadata_line) {
                        Ok(Some(record)) => output.push(record),
                        Ok(None) => {
                            tracing::debug!(sentence_id = %sentence_id, "Below inclusion threshold");
                        }
                        Err(e) => {
                            let document_id = metadata_document_id(&metadata_line).unwrap_or(&sentence_id);
                            reporter.report_error(
                                document_id,
                                format!("Unable to store classified sentence {sentence_id}"),
                                &e,
                            );
                        }
                    }
                }
                PairJoin::LeftOnly(_) => {
                    tracing::debug!(sentence_id = %sentence_id, "Classifier line without metadata");
                }
                PairJoin::RightOnly(_) => {
                    tracing::debug!(sentence_id = %sentence_id, "Metadata line without classifier output");
                }
            }
        }
        output.failures = reporter.into_failures();
        Ok(output)
    }

    /// Map and persist. Upserts are applied in one transaction.
    pub fn store_lines<C, M>(
        &self,
        conn: &Connection,
        evidence: &dyn EvidenceStore,
        failures: &dyn FailureStore,
        classifier_lines: C,
        metadata_lines: M,
    ) -> Result<StageOutput<EvidenceRecord>, StageError>
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        let output = self.map_lines(classifier_lines, metadata_lines)?;
        self.persist(conn, evidence, failures, output)
    }

    /// Read both files, then map and persist. Lines that are not valid
    /// UTF-8 are reported against the file they came from.
    pub fn run(
        &self,
        conn: &Connection,
        evidence: &dyn EvidenceStore,
        failures: &dyn FailureStore,
        classifier_output: &Path,
        sentence_metadata: &Path,
    ) -> Result<StageOutput<EvidenceRecord>, StageError> {
        let mut reporter = FailureReporter::new(self.stage.clone());
        let classifier = read_lines(classifier_output, &mut reporter)?;
        let metadata = read_lines(sentence_metadata, &mut reporter)?;
        tracing::info!(
            classifier_lines = classifier.len(),
            metadata_lines = metadata.len(),
            "Classified sentence storage starting"
        );

        let mut output = self.map_lines(classifier, metadata)?;
        output.failures.extend(reporter.into_failures());
        self.persist(conn, evidence, failures, output)
    }

    fn persist(
        &self,
        conn: &Connection,
        evidence: &dyn EvidenceStore,
        failures: &dyn FailureStore,
        output: StageOutput<EvidenceRecord>,
    ) -> Result<StageOutput<EvidenceRecord>, StageError> {
        let ops: Vec<UpsertOp> = output.primary.iter().flat_map(EvidenceRecord::to_upserts).collect();
        let written = evidence.apply(conn, &ops)?;
        if !output.failures.is_empty() {
            failures.record(conn, &output.failures)?;
        }

        tracing::info!(
            stage = %self.stage,
            evidence = output.primary.len(),
            rows = written,
            failures = output.failures.len(),
            "Classified sentences stored"
        );
        Ok(output)
    }
}

fn read_lines(path: &Path, reporter: &mut FailureReporter) -> Result<Vec<String>, StageError> {
    let bytes = std::fs::read(path).map_err(|e| StageError::io(path, e))?;
    let source = path.display().to_string();

    let mut lines = Vec::new();
    for (index, raw) in bytes.split(|b| *b == b'\n').enumerate() {
        match String::from_utf8(raw.to_vec()) {
            Ok(line) => lines.push(line),
            Err(e) => {
                reporter.report_error(
                    &source,
                    format!("Line {} is not valid UTF-8", index + 1),
                    &e.utf8_error(),
                );
            }
        }
    }
    Ok(lines)
}

fn metadata_document_id(line: &str) -> Option<&str> {
    line.split('\t').nth(1).filter(|id| !id.is_empty())
}
