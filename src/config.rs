//! Application constants and pipeline configuration.
//!
//! Configuration is a JSON file; every field except the association has a
//! default. `stage` selects what a run executes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    BiolinkAssociation, DocumentCriteria, DocumentFormat, DocumentMetadata, DocumentType,
    PipelineKey, ProcessingStatusFlag,
};
use crate::pipeline::sentence::{ConceptPairing, KeywordMatcher};
use crate::pipeline::text::DEFAULT_MAX_CHUNK_BYTES;

/// Application-level constants
pub const APP_NAME: &str = "tm-provider";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "TM_PROVIDER_CONFIG";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "tm_provider=info,warn"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("{CONFIG_ENV} is not set")]
    MissingPath,
}

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// The stage one run executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    TextExtraction,
    DependencyParse,
    SentenceExtraction,
    #[default]
    ClassifiedSentenceStorage,
}

/// Artifacts and filters for sentence extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub sentences: DocumentCriteria,
    pub pairing: ConceptPairing,
    /// Flags a document needs before it is extracted.
    #[serde(default = "default_extraction_flags")]
    pub required_flags: Vec<ProcessingStatusFlag>,
    /// JSON object mapping document id to `DocumentMetadata`. Documents
    /// without an entry get empty metadata.
    #[serde(default)]
    pub document_metadata_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub stage: StageKind,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Recorded in every criteria this run writes.
    #[serde(default = "default_pipeline_version")]
    pub pipeline_version: String,
    /// Collection tag for newly loaded documents, and filter for later stages.
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default = "default_max_chunk_bytes")]
    pub max_chunk_bytes: usize,
    #[serde(default = "default_dependency_parser_uri")]
    pub dependency_parser_uri: String,
    #[serde(default = "default_dependency_parser_timeout_secs")]
    pub dependency_parser_timeout_secs: u64,
    /// Sentence keyword filter; empty keeps every sentence.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// A real predicate must score strictly above this to be stored.
    #[serde(default = "default_inclusion_threshold")]
    pub inclusion_threshold: f64,
    pub association: BiolinkAssociation,
    #[serde(default = "default_classifier_output_path")]
    pub classifier_output_path: PathBuf,
    #[serde(default = "default_sentence_metadata_path")]
    pub sentence_metadata_path: PathBuf,
    #[serde(default = "default_classifier_input_path")]
    pub classifier_input_path: PathBuf,
    /// Plain-text files loaded by text extraction.
    #[serde(default)]
    pub input_files: Vec<PathBuf>,
    /// Stripped from input file names to form document ids.
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,
    /// Required when `stage` is `sentence_extraction`.
    #[serde(default)]
    pub extraction: Option<ExtractionConfig>,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("tm_provider.db")
}

fn default_pipeline_version() -> String {
    APP_VERSION.to_string()
}

fn default_max_chunk_bytes() -> usize {
    DEFAULT_MAX_CHUNK_BYTES
}

fn default_dependency_parser_uri() -> String {
    "http://localhost:8080/parse".to_string()
}

fn default_dependency_parser_timeout_secs() -> u64 {
    300
}

fn default_inclusion_threshold() -> f64 {
    0.9
}

fn default_classifier_output_path() -> PathBuf {
    PathBuf::from("classifier_output.tsv")
}

fn default_sentence_metadata_path() -> PathBuf {
    PathBuf::from("sentence_metadata.tsv")
}

fn default_classifier_input_path() -> PathBuf {
    PathBuf::from("classifier_input.tsv")
}

fn default_file_suffix() -> String {
    ".txt".to_string()
}

fn default_extraction_flags() -> Vec<ProcessingStatusFlag> {
    vec![ProcessingStatusFlag::TextDone]
}

// ═══════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════

pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: PipelineConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load from the file named by `TM_PROVIDER_CONFIG`.
pub fn load_config_from_env() -> Result<PipelineConfig, ConfigError> {
    let path = std::env::var_os(CONFIG_ENV).ok_or(ConfigError::MissingPath)?;
    load_config(Path::new(&path))
}

/// Per-document metadata keyed by document id.
pub fn load_document_metadata(path: &Path) -> Result<BTreeMap<String, DocumentMetadata>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

impl PipelineConfig {
    /// Criteria stamped with this run's pipeline version.
    pub fn criteria(
        &self,
        document_type: DocumentType,
        document_format: DocumentFormat,
        pipeline: PipelineKey,
    ) -> DocumentCriteria {
        DocumentCriteria::new(document_type, document_format, pipeline, self.pipeline_version.clone())
    }

    /// The TEXT artifact written by text extraction and read downstream.
    pub fn text_criteria(&self) -> DocumentCriteria {
        self.criteria(DocumentType::Text, DocumentFormat::Text, PipelineKey::FileLoad)
    }

    pub fn keyword_matcher(&self) -> Result<KeywordMatcher, ConfigError> {
        KeywordMatcher::new(&self.keywords)
            .map_err(|e| ConfigError::Invalid(format!("keyword pattern rejected: {e}")))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline_version.trim().is_empty() {
            return Err(ConfigError::Invalid("pipeline_version is empty".into()));
        }
        if self.max_chunk_bytes < 4 {
            return Err(ConfigError::Invalid(format!(
                "max_chunk_bytes must hold one char, got {}",
                self.max_chunk_bytes
            )));
        }
        if !(0.0..=1.0).contains(&self.inclusion_threshold) {
            return Err(ConfigError::Invalid(format!(
                "inclusion_threshold must be within [0, 1], got {}",
                self.inclusion_threshold
            )));
        }

        let association = &self.association;
        if association.association_id.is_empty() {
            return Err(ConfigError::Invalid("association_id is empty".into()));
        }
        if association.predicate_curies.is_empty() {
            return Err(ConfigError::Invalid("association has no predicate curies".into()));
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = association.predicate_curies.iter().find(|p| !seen.insert(p.as_str())) {
            return Err(ConfigError::Invalid(format!("duplicate predicate curie {dup}")));
        }
        if association.subject_placeholder == association.object_placeholder {
            return Err(ConfigError::Invalid(
                "subject and object placeholders must differ".into(),
            ));
        }
        self.keyword_matcher()?;

        match self.stage {
            StageKind::TextExtraction if self.input_files.is_empty() => {
                return Err(ConfigError::Invalid("text_extraction needs input_files".into()));
            }
            StageKind::SentenceExtraction => {
                let Some(extraction) = &self.extraction else {
                    return Err(ConfigError::Invalid(
                        "sentence_extraction needs an extraction section".into(),
                    ));
                };
                let pairing = &extraction.pairing;
                if pairing.x.placeholder == pairing.y.placeholder {
                    return Err(ConfigError::Invalid(
                        "concept family placeholders must differ".into(),
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "association": {
            "association_id": "biolink:ChemicalToGeneAssociation",
            "subject_placeholder": "@CHEMICAL$",
            "object_placeholder": "@GENE$",
            "predicate_curies": ["biolink:entity_positively_regulates_entity", "false"]
        }
    }"#;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: PipelineConfig = serde_json::from_str(MINIMAL).unwrap();
        assert_eq!(config.max_chunk_bytes, 1_000_000);
        assert_eq!(config.pipeline_version, APP_VERSION);
        assert!(config.keywords.is_empty());
        assert!(config.collection.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, MINIMAL.replace("{\n        \"association\"", "{\"inclusion_threshold\": 0.5, \"association\"")).unwrap();
        let config = load_config(&path).unwrap();
        assert!((config.inclusion_threshold - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_association_rejected() {
        assert!(matches!(
            serde_json::from_str::<PipelineConfig>("{}").map_err(ConfigError::from),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn invalid_values_rejected() {
        let mut config: PipelineConfig = serde_json::from_str(MINIMAL).unwrap();
        config.inclusion_threshold = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config: PipelineConfig = serde_json::from_str(MINIMAL).unwrap();
        config.association.predicate_curies.push("false".into());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config: PipelineConfig = serde_json::from_str(MINIMAL).unwrap();
        config.association.object_placeholder = "@CHEMICAL$".into();
        assert!(config.validate().is_err());
    }

    const EXTRACTION: &str = r#"{
        "stage": "sentence_extraction",
        "keywords": ["inhibits"],
        "extraction": {
            "sentences": {
                "document_type": "SENTENCE",
                "document_format": "BIONLP",
                "pipeline": "SENTENCE_SEGMENTATION",
                "pipeline_version": "0.1"
            },
            "pairing": {
                "x": {
                    "concept": {"document_type": "CONCEPT_CHEBI", "document_format": "BIONLP", "pipeline": "OGER", "pipeline_version": "0.1"},
                    "crf": {"document_type": "CRF_CHEBI", "document_format": "BIONLP", "pipeline": "CRF", "pipeline_version": "0.1"},
                    "placeholder": "@CHEMICAL$"
                },
                "y": {
                    "concept": {"document_type": "CONCEPT_PR", "document_format": "BIONLP", "pipeline": "OGER", "pipeline_version": "0.1"},
                    "crf": {"document_type": "CRF_PR", "document_format": "BIONLP", "pipeline": "CRF", "pipeline_version": "0.1"},
                    "placeholder": "@GENE$"
                }
            }
        },
        "association": {
            "association_id": "biolink:ChemicalToGeneAssociation",
            "subject_placeholder": "@CHEMICAL$",
            "object_placeholder": "@GENE$",
            "predicate_curies": ["biolink:entity_positively_regulates_entity", "false"]
        }
    }"#;

    #[test]
    fn stage_defaults_to_storage() {
        let config: PipelineConfig = serde_json::from_str(MINIMAL).unwrap();
        assert_eq!(config.stage, StageKind::ClassifiedSentenceStorage);
        assert_eq!(config.file_suffix, ".txt");
        assert!(config.extraction.is_none());
    }

    #[test]
    fn extraction_section_parsed() {
        let config: PipelineConfig = serde_json::from_str(EXTRACTION).unwrap();
        config.validate().unwrap();
        let extraction = config.extraction.as_ref().unwrap();
        assert_eq!(extraction.sentences.document_type, DocumentType::Sentence);
        assert_eq!(extraction.pairing.y.crf.document_type, DocumentType::CrfPr);
        assert_eq!(extraction.required_flags, vec![ProcessingStatusFlag::TextDone]);
        assert_eq!(config.keyword_matcher().unwrap().find("Aspirin INHIBITS it"), Some("inhibits"));
    }

    #[test]
    fn stage_inputs_required() {
        let mut config: PipelineConfig = serde_json::from_str(MINIMAL).unwrap();
        config.stage = StageKind::SentenceExtraction;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.stage = StageKind::TextExtraction;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.input_files.push(PathBuf::from("PMC1.txt"));
        config.validate().unwrap();
    }

    #[test]
    fn text_criteria_carry_pipeline_version() {
        let mut config: PipelineConfig = serde_json::from_str(MINIMAL).unwrap();
        config.pipeline_version = "0.7".into();
        let text = config.text_criteria();
        assert_eq!(text.document_type, DocumentType::Text);
        assert_eq!(text.pipeline_version, "0.7");
    }

    #[test]
    fn document_metadata_loaded_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.json");
        std::fs::write(
            &path,
            r#"{"PMC1": {"year_published": 2019, "zone": "title", "publication_types": ["Review"]}}"#,
        )
        .unwrap();
        let metadata = load_document_metadata(&path).unwrap();
        assert_eq!(metadata["PMC1"].year_published, 2019);
        assert_eq!(metadata["PMC1"].publication_types, vec!["Review"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/tm_provider.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(APP_NAME, "tm-provider");
    }
}
