use super::ClassificationError;
use crate::models::BiolinkAssociation;
use crate::pipeline::upsert::PredicateScore;

/// `sentenceId \t sentenceWithPlaceholders \t score_1 ... score_n`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierLine {
    pub sentence_id: String,
    pub sentence_with_placeholders: String,
    /// In the association's predicate order.
    pub scores: Vec<PredicateScore>,
}

impl ClassifierLine {
    /// True if any real predicate scores strictly above `threshold`. The
    /// no-relation slot never counts.
    pub fn meets_threshold(&self, threshold: f64) -> bool {
        self.scores.iter().any(|s| {
            !BiolinkAssociation::is_no_relation(&s.predicate_curie) && s.score > threshold
        })
    }
}

pub fn parse_classifier_line(
    line: &str,
    association: &BiolinkAssociation,
) -> Result<ClassifierLine, ClassificationError> {
    let cols: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
    let expected = 2 + association.predicate_count();
    if cols.len() != expected {
        return Err(ClassificationError::ColumnCount {
            expected,
            found: cols.len(),
        });
    }

    let mut scores = Vec::with_capacity(association.predicate_count());
    for (offset, predicate) in association.predicate_curies.iter().enumerate() {
        let column = 2 + offset;
        let value = cols[column];
        let score = value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|score| score.is_finite())
            .ok_or_else(|| ClassificationError::InvalidScore {
                column,
                value: value.to_string(),
            })?;
        scores.push(PredicateScore {
            predicate_curie: predicate.clone(),
            score,
        });
    }

    Ok(ClassifierLine {
        sentence_id: cols[0].to_string(),
        sentence_with_placeholders: cols[1].to_string(),
        scores,
    })
}
