//! BioNLP standoff text-bound annotations.
//!
//! `T<n>\t<label> <start> <end>[;<start> <end>]*\t<covered text>`
//!
//! Offsets are char offsets into the document text. Covered text is taken
//! from the document rather than trusted from the file. Lines of any other
//! annotation kind (relations, events, notes) are skipped.

use thiserror::Error;

use crate::models::Span;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("Malformed annotation on line {line_number}: {line}")]
    MalformedLine { line_number: usize, line: String },

    #[error("Invalid offset on line {line_number}: {value}")]
    InvalidOffset { line_number: usize, value: String },

    #[error("Annotation {id} span {start}..{end} outside document of {text_len} chars")]
    SpanOutOfBounds {
        id: String,
        start: usize,
        end: usize,
        text_len: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextAnnotation {
    pub id: String,
    /// Concept curie, or a type label such as `sentence`.
    pub label: String,
    pub spans: Vec<Span>,
    pub covered_text: String,
}

impl TextAnnotation {
    pub fn overlaps(&self, other: &TextAnnotation) -> bool {
        crate::models::spans_overlap(&self.spans, &other.spans)
    }

    /// Smallest span covering every span of the annotation.
    pub fn bounds(&self) -> Span {
        let start = self.spans.iter().map(|s| s.start).min().unwrap_or(0);
        let end = self.spans.iter().map(|s| s.end).max().unwrap_or(start);
        Span::new(start, end)
    }

    /// Ordering by first span start, then end.
    pub fn span_key(&self) -> (usize, usize) {
        let bounds = self.bounds();
        (bounds.start, bounds.end)
    }
}

/// Char-offset view over a document, for slicing by annotation spans.
pub struct DocumentText<'a> {
    text: &'a str,
    /// Byte offset of every char, plus the text length.
    offsets: Vec<usize>,
}

impl<'a> DocumentText<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());
        Self { text, offsets }
    }

    pub fn char_len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn slice(&self, span: Span) -> Option<&'a str> {
        if span.start > span.end || span.end > self.char_len() {
            return None;
        }
        Some(&self.text[self.offsets[span.start]..self.offsets[span.end]])
    }
}

pub fn parse_bionlp(
    content: &str,
    text: &DocumentText<'_>,
) -> Result<Vec<TextAnnotation>, AnnotationError> {
    let mut annotations = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        if !line.starts_with('T') {
            continue;
        }
        let malformed = || AnnotationError::MalformedLine {
            line_number,
            line: line.to_string(),
        };

        let mut columns = line.splitn(3, '\t');
        let id = columns.next().ok_or_else(malformed)?;
        let header = columns.next().ok_or_else(malformed)?;
        let (label, offsets) = header.split_once(' ').ok_or_else(malformed)?;

        let mut spans = Vec::new();
        for fragment in offsets.split(';') {
            let (start, end) = fragment.trim().split_once(' ').ok_or_else(malformed)?;
            let start = parse_offset(start, line_number)?;
            let end = parse_offset(end, line_number)?;
            spans.push(Span::new(start, end));
        }

        let mut covered = Vec::with_capacity(spans.len());
        for span in &spans {
            let piece = text.slice(*span).ok_or_else(|| AnnotationError::SpanOutOfBounds {
                id: id.to_string(),
                start: span.start,
                end: span.end,
                text_len: text.char_len(),
            })?;
            covered.push(piece);
        }

        annotations.push(TextAnnotation {
            id: id.to_string(),
            label: label.to_string(),
            spans,
            covered_text: covered.join(" "),
        });
    }
    Ok(annotations)
}

fn parse_offset(value: &str, line_number: usize) -> Result<usize, AnnotationError> {
    value.trim().parse().map_err(|_| AnnotationError::InvalidOffset {
        line_number,
        value: value.to_string(),
    })
}
