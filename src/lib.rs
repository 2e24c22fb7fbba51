pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;

use std::collections::BTreeMap;

use rusqlite::Connection;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, PipelineConfig, StageKind};
use crate::db::DatabaseError;
use crate::models::{DocumentFormat, DocumentType, PipelineKey};
use crate::pipeline::classification::ClassifiedSentenceStorage;
use crate::pipeline::dependency_parse::{DependencyParseStage, HttpDependencyParser};
use crate::pipeline::sentence::{SentenceExtractionStage, SentenceExtractor, SentenceFiles};
use crate::pipeline::store::{
    SqliteArtifactStore, SqliteEvidenceStore, SqliteFailureStore, SqliteStatusStore,
};
use crate::pipeline::text::TextExtractionStage;
use crate::pipeline::{DependencyParseError, StageError, StageGate};

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Parser(#[from] DependencyParseError),
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}

/// Run the stage selected by the configuration in `TM_PROVIDER_CONFIG`.
/// Returns the number of primary outputs the stage produced.
pub fn run() -> Result<usize, RunError> {
    init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::load_config_from_env()?;
    let conn = db::sqlite::open_database(&config.database_path)?;
    run_stage(&conn, &config)
}

/// Dispatch one configured stage against `conn`.
pub fn run_stage(conn: &Connection, config: &PipelineConfig) -> Result<usize, RunError> {
    let artifacts = SqliteArtifactStore::new();
    let statuses = SqliteStatusStore::new();
    let failures = SqliteFailureStore::new();

    let (produced, failed) = match config.stage {
        StageKind::TextExtraction => {
            let stage = TextExtractionStage {
                output: config.text_criteria(),
                file_suffix: config.file_suffix.clone(),
                collection: config.collection.clone(),
                max_chunk_bytes: config.max_chunk_bytes,
            };
            let output = stage.run(conn, &artifacts, &statuses, &failures, &config.input_files)?;
            (output.primary.len(), output.failures.len())
        }
        StageKind::DependencyParse => {
            let parser = HttpDependencyParser::new(
                &config.dependency_parser_uri,
                config.dependency_parser_timeout_secs,
            )?;
            let stage = DependencyParseStage {
                input: config.text_criteria(),
                output: config.criteria(
                    DocumentType::DependencyParse,
                    DocumentFormat::Conllu,
                    PipelineKey::DependencyParse,
                ),
                collection: config.collection.clone(),
                max_chunk_bytes: config.max_chunk_bytes,
            };
            let output = stage.run(conn, &artifacts, &statuses, &failures, &parser)?;
            (output.primary.len(), output.failures.len())
        }
        StageKind::SentenceExtraction => {
            let extraction = config.extraction.as_ref().ok_or_else(|| {
                ConfigError::Invalid("sentence_extraction needs an extraction section".into())
            })?;
            let metadata = match &extraction.document_metadata_path {
                Some(path) => config::load_document_metadata(path)?,
                None => BTreeMap::new(),
            };
            let stage = SentenceExtractionStage {
                extractor: SentenceExtractor::new(
                    config.text_criteria(),
                    extraction.sentences.clone(),
                    extraction.pairing.clone(),
                    config.keyword_matcher()?,
                ),
                gate: StageGate::requiring(extraction.required_flags.iter().copied())
                    .with_collection(config.collection.clone()),
                stage: config.criteria(
                    DocumentType::SentenceCooccurrence,
                    DocumentFormat::Tsv,
                    PipelineKey::SentenceExtraction,
                ),
            };
            let files = SentenceFiles {
                metadata: config.sentence_metadata_path.clone(),
                classifier_input: config.classifier_input_path.clone(),
            };
            let output = stage.run(conn, &statuses, &artifacts, &failures, &metadata, &files)?;
            (output.primary.len(), output.failures.len())
        }
        StageKind::ClassifiedSentenceStorage => {
            let storage = ClassifiedSentenceStorage {
                association: config.association.clone(),
                threshold: config.inclusion_threshold,
                stage: config.criteria(
                    DocumentType::SentenceCooccurrence,
                    DocumentFormat::Tsv,
                    PipelineKey::ClassifiedSentenceStorage,
                ),
            };
            let output = storage.run(
                conn,
                &SqliteEvidenceStore::new(),
                &failures,
                &config.classifier_output_path,
                &config.sentence_metadata_path,
            )?;
            (output.primary.len(), output.failures.len())
        }
    };

    if failed > 0 {
        tracing::warn!(stage = ?config.stage, failures = failed, "Run completed with failures");
    }
    Ok(produced)
}
