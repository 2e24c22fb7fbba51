use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::annotation::{parse_bionlp, DocumentText, TextAnnotation};
use super::keywords::KeywordMatcher;
use super::ExtractionError;
use crate::models::{DocumentCriteria, DocumentMetadata, EntityMention, ExtractedSentence};

/// One side of a concept pairing: the recognizer output, the CRF pass that
/// confirms it, and the placeholder its mentions get in classifier input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptFamily {
    pub concept: DocumentCriteria,
    pub crf: DocumentCriteria,
    pub placeholder: String,
}

/// The two families whose co-occurrence is extracted. `x` mentions become
/// entity 1, `y` mentions entity 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptPairing {
    pub x: ConceptFamily,
    pub y: ConceptFamily,
}

#[derive(Debug, Default)]
struct SentenceConcepts<'a> {
    x: BTreeSet<&'a TextAnnotation>,
    y: BTreeSet<&'a TextAnnotation>,
}

#[derive(Debug, Clone)]
pub struct SentenceExtractor {
    pub text: DocumentCriteria,
    pub sentences: DocumentCriteria,
    pub pairing: ConceptPairing,
    keywords: KeywordMatcher,
}

impl SentenceExtractor {
    pub fn new(
        text: DocumentCriteria,
        sentences: DocumentCriteria,
        pairing: ConceptPairing,
        keywords: KeywordMatcher,
    ) -> Self {
        Self {
            text,
            sentences,
            pairing,
            keywords,
        }
    }

    /// Every artifact a document must have before extraction.
    pub fn required_criteria(&self) -> BTreeSet<DocumentCriteria> {
        [
            &self.text,
            &self.sentences,
            &self.pairing.x.concept,
            &self.pairing.x.crf,
            &self.pairing.y.concept,
            &self.pairing.y.crf,
        ]
        .into_iter()
        .cloned()
        .collect()
    }

    pub fn extract(
        &self,
        document_id: &str,
        artifacts: &BTreeMap<DocumentCriteria, String>,
        metadata: &DocumentMetadata,
    ) -> Result<BTreeSet<ExtractedSentence>, ExtractionError> {
        let missing: Vec<String> = self
            .required_criteria()
            .iter()
            .filter(|c| !artifacts.contains_key(*c))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(ExtractionError::MissingArtifacts {
                document_id: document_id.to_string(),
                missing,
            });
        }

        let text = DocumentText::new(&artifacts[&self.text]);
        let annotations = |criteria: &DocumentCriteria| {
            parse_bionlp(&artifacts[criteria], &text).map_err(|source| {
                ExtractionError::Annotation {
                    criteria: criteria.clone(),
                    source,
                }
            })
        };

        let x = filter_via_crf(
            annotations(&self.pairing.x.concept)?,
            &annotations(&self.pairing.x.crf)?,
        );
        if x.is_empty() {
            return Ok(BTreeSet::new());
        }
        let y = filter_via_crf(
            annotations(&self.pairing.y.concept)?,
            &annotations(&self.pairing.y.crf)?,
        );
        if y.is_empty() {
            return Ok(BTreeSet::new());
        }

        let mut sentences = annotations(&self.sentences)?;
        sort_by_span(&mut sentences);

        let mut extracted = BTreeSet::new();
        for (index, concepts) in assign_to_sentences(&sentences, &x, &y) {
            if concepts.x.is_empty() || concepts.y.is_empty() {
                continue;
            }
            let sentence = &sentences[index];
            let keyword = if self.keywords.is_empty() {
                None
            } else {
                match self.keywords.find(&sentence.covered_text) {
                    Some(keyword) => Some(keyword.to_string()),
                    None => continue,
                }
            };

            for x_annot in &concepts.x {
                for y_annot in &concepts.y {
                    extracted.insert(ExtractedSentence {
                        document_id: document_id.to_string(),
                        entity1: mention(x_annot, &self.pairing.x.placeholder),
                        entity2: mention(y_annot, &self.pairing.y.placeholder),
                        keyword: keyword.clone(),
                        sentence_text: sentence.covered_text.clone(),
                        sentence_span: sentence.bounds(),
                        metadata: metadata.clone(),
                    });
                }
            }
        }

        tracing::debug!(
            document_id = %document_id,
            sentences = sentences.len(),
            extracted = extracted.len(),
            "Sentence extraction complete"
        );
        Ok(extracted)
    }
}

/// Keep concepts confirmed by at least one overlapping CRF annotation.
pub fn filter_via_crf(
    concepts: Vec<TextAnnotation>,
    crf: &[TextAnnotation],
) -> Vec<TextAnnotation> {
    concepts
        .into_iter()
        .filter(|concept| crf.iter().any(|c| concept.overlaps(c)))
        .collect()
}

pub fn sort_by_span(annotations: &mut [TextAnnotation]) {
    annotations.sort_by(|a, b| a.span_key().cmp(&b.span_key()).then_with(|| a.cmp(b)));
}

/// Register each concept under the first sorted sentence it overlaps.
fn assign_to_sentences<'a>(
    sentences: &[TextAnnotation],
    x: &'a [TextAnnotation],
    y: &'a [TextAnnotation],
) -> BTreeMap<usize, SentenceConcepts<'a>> {
    let mut map: BTreeMap<usize, SentenceConcepts<'a>> = BTreeMap::new();
    let first_overlap = |concept: &TextAnnotation| sentences.iter().position(|s| concept.overlaps(s));

    for concept in x {
        if let Some(index) = first_overlap(concept) {
            map.entry(index).or_default().x.insert(concept);
        }
    }
    for concept in y {
        if let Some(index) = first_overlap(concept) {
            map.entry(index).or_default().y.insert(concept);
        }
    }
    map
}

fn mention(annotation: &TextAnnotation, placeholder: &str) -> EntityMention {
    EntityMention {
        placeholder: placeholder.to_string(),
        id: annotation.label.clone(),
        covered_text: annotation.covered_text.clone(),
        spans: annotation.spans.clone(),
    }
}
