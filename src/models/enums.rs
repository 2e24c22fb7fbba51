use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(DocumentType {
    Bioc => "BIOC",
    Text => "TEXT",
    Sections => "SECTIONS",
    DependencyParse => "DEPENDENCY_PARSE",
    Sentence => "SENTENCE",
    ConceptChebi => "CONCEPT_CHEBI",
    ConceptCl => "CONCEPT_CL",
    ConceptDrugbank => "CONCEPT_DRUGBANK",
    ConceptGoBp => "CONCEPT_GO_BP",
    ConceptGoCc => "CONCEPT_GO_CC",
    ConceptGoMf => "CONCEPT_GO_MF",
    ConceptHp => "CONCEPT_HP",
    ConceptMondo => "CONCEPT_MONDO",
    ConceptMop => "CONCEPT_MOP",
    ConceptMp => "CONCEPT_MP",
    ConceptNcbitaxon => "CONCEPT_NCBITAXON",
    ConceptPr => "CONCEPT_PR",
    ConceptSo => "CONCEPT_SO",
    ConceptUberon => "CONCEPT_UBERON",
    CrfChebi => "CRF_CHEBI",
    CrfNlmchem => "CRF_NLMCHEM",
    CrfCl => "CRF_CL",
    CrfGoBp => "CRF_GO_BP",
    CrfGoCc => "CRF_GO_CC",
    CrfGoMf => "CRF_GO_MF",
    CrfHp => "CRF_HP",
    CrfMondo => "CRF_MONDO",
    CrfMop => "CRF_MOP",
    CrfNcbitaxon => "CRF_NCBITAXON",
    CrfPr => "CRF_PR",
    CrfSo => "CRF_SO",
    CrfUberon => "CRF_UBERON",
    SentenceCooccurrence => "SENTENCE_COOCCURRENCE",
    Abbreviations => "ABBREVIATIONS",
});

str_enum!(DocumentFormat {
    Text => "TEXT",
    Bionlp => "BIONLP",
    Conllu => "CONLLU",
    Tsv => "TSV",
});

str_enum!(PipelineKey {
    Orig => "ORIG",
    BiocToText => "BIOC_TO_TEXT",
    MedlineXmlToText => "MEDLINE_XML_TO_TEXT",
    FileLoad => "FILE_LOAD",
    DependencyParse => "DEPENDENCY_PARSE",
    SentenceSegmentation => "SENTENCE_SEGMENTATION",
    Oger => "OGER",
    Crf => "CRF",
    ConceptPostProcess => "CONCEPT_POST_PROCESS",
    SentenceExtraction => "SENTENCE_EXTRACTION",
    ClassifiedSentenceStorage => "CLASSIFIED_SENTENCE_STORAGE",
});

str_enum!(ProcessingStatusFlag {
    TextDone => "TEXT_DONE",
    DpDone => "DP_DONE",
    SentenceDone => "SENTENCE_DONE",
    OgerChebiDone => "OGER_CHEBI_DONE",
    OgerClDone => "OGER_CL_DONE",
    OgerGoBpDone => "OGER_GO_BP_DONE",
    OgerGoCcDone => "OGER_GO_CC_DONE",
    OgerGoMfDone => "OGER_GO_MF_DONE",
    OgerMopDone => "OGER_MOP_DONE",
    OgerNcbitaxonDone => "OGER_NCBITAXON_DONE",
    OgerSoDone => "OGER_SO_DONE",
    OgerPrDone => "OGER_PR_DONE",
    OgerUberonDone => "OGER_UBERON_DONE",
    CrfChebiDone => "CRF_CHEBI_DONE",
    CrfClDone => "CRF_CL_DONE",
    CrfGoBpDone => "CRF_GO_BP_DONE",
    CrfGoCcDone => "CRF_GO_CC_DONE",
    CrfGoMfDone => "CRF_GO_MF_DONE",
    CrfMopDone => "CRF_MOP_DONE",
    CrfNcbitaxonDone => "CRF_NCBITAXON_DONE",
    CrfSoDone => "CRF_SO_DONE",
    CrfPrDone => "CRF_PR_DONE",
    CrfUberonDone => "CRF_UBERON_DONE",
    BertChebiDone => "BERT_CHEBI_DONE",
    BertClDone => "BERT_CL_DONE",
    BertGoBpDone => "BERT_GO_BP_DONE",
    BertGoCcDone => "BERT_GO_CC_DONE",
    BertGoMfDone => "BERT_GO_MF_DONE",
    BertMopDone => "BERT_MOP_DONE",
    BertNcbitaxonDone => "BERT_NCBITAXON_DONE",
    BertSoDone => "BERT_SO_DONE",
    BertPrDone => "BERT_PR_DONE",
    BertUberonDone => "BERT_UBERON_DONE",
});
