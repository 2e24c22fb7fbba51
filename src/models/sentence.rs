//! One candidate relation mention: two concept mentions co-occurring in a
//! sentence, plus the document metadata the evidence tables need.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::span::{parse_span_str, span_str, Span};
use crate::pipeline::identity;

/// Number of tab-separated columns in a metadata line.
pub const METADATA_COLUMN_COUNT: usize = 16;

const PUBLICATION_TYPE_DELIMITER: &str = "|";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetadataLineError {
    #[error("Expected {METADATA_COLUMN_COUNT} columns, found {0}")]
    ColumnCount(usize),

    #[error("Invalid span in column {column}: {value}")]
    InvalidSpan { column: usize, value: String },

    #[error("Invalid publication year: {0}")]
    InvalidYear(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityMention {
    /// Label substituted for the mention in classifier input, e.g. `@CHEMICAL$`.
    pub placeholder: String,
    /// Concept curie.
    pub id: String,
    pub covered_text: String,
    /// Document-level character spans.
    pub spans: Vec<Span>,
}

impl EntityMention {
    pub fn span_str(&self) -> String {
        span_str(&self.spans)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub year_published: i32,
    pub zone: String,
    pub publication_types: Vec<String>,
}

impl DocumentMetadata {
    pub fn publication_types_str(&self) -> String {
        self.publication_types.join(PUBLICATION_TYPE_DELIMITER)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExtractedSentence {
    pub document_id: String,
    pub entity1: EntityMention,
    pub entity2: EntityMention,
    pub keyword: Option<String>,
    pub sentence_text: String,
    pub sentence_span: Span,
    pub metadata: DocumentMetadata,
}

impl ExtractedSentence {
    pub fn sentence_id(&self) -> String {
        identity::sentence_id(self)
    }

    /// Sentence text with each mention replaced by its placeholder.
    ///
    /// Mention spans are mapped into the sentence; a mention overlapping an
    /// earlier replaced mention is left as-is.
    pub fn sentence_with_placeholders(&self) -> String {
        let chars: Vec<char> = self.sentence_text.chars().collect();
        let offset = self.sentence_span.start;

        let mut ranges: Vec<(usize, usize, &str)> = [&self.entity1, &self.entity2]
            .into_iter()
            .filter_map(|mention| {
                let start = mention.spans.iter().map(|s| s.start).min()?;
                let end = mention.spans.iter().map(|s| s.end).max()?;
                let start = start.checked_sub(offset)?;
                let end = end.checked_sub(offset)?.min(chars.len());
                (start < end).then_some((start, end, mention.placeholder.as_str()))
            })
            .collect();
        ranges.sort();

        let mut out = String::with_capacity(self.sentence_text.len());
        let mut cursor = 0;
        for (start, end, placeholder) in ranges {
            if start < cursor {
                continue;
            }
            out.extend(&chars[cursor..start]);
            out.push_str(placeholder);
            cursor = end;
        }
        out.extend(&chars[cursor..]);
        out
    }

    /// Classifier input line: `sentenceId \t sentenceWithPlaceholders`.
    pub fn to_classifier_input(&self) -> String {
        format!(
            "{}\t{}",
            self.sentence_id(),
            clean_field(&self.sentence_with_placeholders())
        )
    }

    pub fn to_tsv(&self) -> String {
        let columns = [
            self.sentence_id(),
            clean_field(&self.document_id),
            clean_field(&self.entity1.placeholder),
            clean_field(&self.entity1.id),
            self.entity1.span_str(),
            clean_field(&self.entity1.covered_text),
            clean_field(&self.entity2.placeholder),
            clean_field(&self.entity2.id),
            self.entity2.span_str(),
            clean_field(&self.entity2.covered_text),
            clean_field(self.keyword.as_deref().unwrap_or("")),
            clean_field(&self.sentence_text),
            span_str(&[self.sentence_span]),
            clean_field(&self.metadata.zone),
            clean_field(&self.metadata.publication_types_str()),
            self.metadata.year_published.to_string(),
        ];
        columns.join("\t")
    }

    pub fn from_tsv(line: &str) -> Result<Self, MetadataLineError> {
        let cols: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
        if cols.len() != METADATA_COLUMN_COUNT {
            return Err(MetadataLineError::ColumnCount(cols.len()));
        }

        let spans = |column: usize| {
            parse_span_str(cols[column]).ok_or_else(|| MetadataLineError::InvalidSpan {
                column,
                value: cols[column].to_string(),
            })
        };

        let sentence_span = spans(12)?.first().copied().ok_or_else(|| {
            MetadataLineError::InvalidSpan {
                column: 12,
                value: cols[12].to_string(),
            }
        })?;
        let year_published = cols[15]
            .trim()
            .parse::<i32>()
            .map_err(|_| MetadataLineError::InvalidYear(cols[15].to_string()))?;
        let publication_types = if cols[14].is_empty() {
            Vec::new()
        } else {
            cols[14].split(PUBLICATION_TYPE_DELIMITER).map(str::to_string).collect()
        };

        Ok(Self {
            document_id: cols[1].to_string(),
            entity1: EntityMention {
                placeholder: cols[2].to_string(),
                id: cols[3].to_string(),
                spans: spans(4)?,
                covered_text: cols[5].to_string(),
            },
            entity2: EntityMention {
                placeholder: cols[6].to_string(),
                id: cols[7].to_string(),
                spans: spans(8)?,
                covered_text: cols[9].to_string(),
            },
            keyword: (!cols[10].is_empty()).then(|| cols[10].to_string()),
            sentence_text: cols[11].to_string(),
            sentence_span,
            metadata: DocumentMetadata {
                year_published,
                zone: cols[13].to_string(),
                publication_types,
            },
        })
    }
}

fn clean_field(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}
