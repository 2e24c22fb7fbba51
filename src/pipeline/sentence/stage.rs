//! Sentence extraction stage: gated documents → joined artifacts →
//! extracted sentences → metadata and classifier-input files.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use super::engine::SentenceExtractor;
use super::ExtractionError;
use crate::models::{DocumentCriteria, DocumentMetadata, ExtractedSentence};
use crate::pipeline::error::StageError;
use crate::pipeline::failure::FailureReporter;
use crate::pipeline::gate::StageGate;
use crate::pipeline::join::{co_group, Joined};
use crate::pipeline::output::StageOutput;
use crate::pipeline::traits::{ArtifactStore, FailureStore, StatusStore};

/// Where extracted sentences are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceFiles {
    /// One metadata TSV line per sentence.
    pub metadata: PathBuf,
    /// `sentenceId \t sentenceWithPlaceholders` lines for the classifier.
    pub classifier_input: PathBuf,
}

pub struct SentenceExtractionStage {
    pub extractor: SentenceExtractor,
    pub gate: StageGate,
    /// Descriptor stamped on failures.
    pub stage: DocumentCriteria,
}

/// One document's artifacts after joining on document id.
pub type JoinedArtifacts = Joined<String, DocumentCriteria, String>;

impl SentenceExtractionStage {
    /// Extract one joined document. Incomplete groups and bad annotations
    /// become failures.
    pub fn process_document(
        &self,
        joined: JoinedArtifacts,
        metadata: &BTreeMap<String, DocumentMetadata>,
        reporter: &mut FailureReporter,
    ) -> StageOutput<ExtractedSentence> {
        let default_metadata = DocumentMetadata::default();
        let (document_id, result) = match joined {
            Joined::Complete { key, values } => {
                let doc_metadata = metadata.get(&key).unwrap_or(&default_metadata);
                let result = self.extractor.extract(&key, &values, doc_metadata);
                (key, result)
            }
            Joined::Incomplete { key, present } => {
                let missing = self
                    .extractor
                    .required_criteria()
                    .difference(&present)
                    .map(ToString::to_string)
                    .collect();
                let error = ExtractionError::MissingArtifacts {
                    document_id: key.clone(),
                    missing,
                };
                (key, Err(error))
            }
        };

        match result {
            Ok(sentences) => {
                let mut out = StageOutput::new();
                out.primary.extend(sentences);
                out
            }
            Err(e) => StageOutput::failure(
                reporter
                    .report_error(&document_id, "Unable to extract sentences", &e)
                    .clone(),
            ),
        }
    }

    /// Join every eligible document's required artifacts by document id.
    /// Each artifact criteria is one tagged source; documents with no
    /// artifacts at all are still returned, as empty incomplete groups.
    pub fn join_artifacts(
        &self,
        conn: &Connection,
        artifacts: &dyn ArtifactStore,
        eligible: &[String],
    ) -> Result<Vec<JoinedArtifacts>, StageError> {
        let required = self.extractor.required_criteria();
        let mut sources: BTreeMap<DocumentCriteria, Vec<(String, String)>> = BTreeMap::new();
        for document_id in eligible {
            for (criteria, content) in artifacts.get_all(conn, document_id, &required)? {
                sources
                    .entry(criteria)
                    .or_default()
                    .push((document_id.clone(), content));
            }
        }

        let mut groups: BTreeMap<String, _> = co_group(sources)
            .into_iter()
            .map(|group| (group.key().clone(), group))
            .collect();

        let mut joined = Vec::with_capacity(eligible.len());
        for document_id in eligible {
            match groups.remove(document_id) {
                Some(group) => joined.push(group.resolve(&required)?),
                None => joined.push(Joined::Incomplete {
                    key: document_id.clone(),
                    present: BTreeSet::new(),
                }),
            }
        }
        Ok(joined)
    }

    pub fn run(
        &self,
        conn: &Connection,
        statuses: &dyn StatusStore,
        artifacts: &dyn ArtifactStore,
        failures: &dyn FailureStore,
        metadata: &BTreeMap<String, DocumentMetadata>,
        files: &SentenceFiles,
    ) -> Result<StageOutput<ExtractedSentence>, StageError> {
        let eligible = self.gate.eligible(&statuses.load_all(conn)?);
        tracing::info!(stage = %self.stage, documents = eligible.len(), "Sentence extraction starting");

        let mut reporter = FailureReporter::new(self.stage.clone());
        let output: StageOutput<ExtractedSentence> = self
            .join_artifacts(conn, artifacts, &eligible)?
            .into_iter()
            .map(|joined| self.process_document(joined, metadata, &mut reporter))
            .collect();

        let written = write_sentence_files(&output.primary, files)?;
        reporter.flush(conn, failures)?;

        tracing::info!(
            stage = %self.stage,
            sentences = written,
            failures = output.failures.len(),
            "Sentence extraction finished"
        );
        Ok(output)
    }
}

/// Write both files. Sentences sharing an id are written once.
pub fn write_sentence_files(
    sentences: &[ExtractedSentence],
    files: &SentenceFiles,
) -> Result<usize, StageError> {
    let mut metadata = create(&files.metadata)?;
    let mut classifier = create(&files.classifier_input)?;

    let mut seen = BTreeSet::new();
    for sentence in sentences {
        let id = sentence.sentence_id();
        if !seen.insert(id.clone()) {
            tracing::debug!(sentence_id = %id, "Duplicate sentence id skipped");
            continue;
        }
        writeln!(metadata, "{}", sentence.to_tsv())
            .map_err(|e| StageError::io(&files.metadata, e))?;
        writeln!(classifier, "{}", sentence.to_classifier_input())
            .map_err(|e| StageError::io(&files.classifier_input, e))?;
    }

    metadata.flush().map_err(|e| StageError::io(&files.metadata, e))?;
    classifier
        .flush()
        .map_err(|e| StageError::io(&files.classifier_input, e))?;
    Ok(seen.len())
}

fn create(path: &Path) -> Result<BufWriter<File>, StageError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| StageError::io(path, e))
}
