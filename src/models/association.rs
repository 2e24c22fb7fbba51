use serde::{Deserialize, Serialize};

/// Predicate curie used for the "no relation present" classifier slot.
pub const NO_RELATION_PREDICATE: &str = "false";

/// A biolink association a classifier stage detects.
///
/// `predicate_curies` is ordered: it is the column order of the scores in a
/// classifier output line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiolinkAssociation {
    pub association_id: String,
    pub subject_placeholder: String,
    pub object_placeholder: String,
    pub predicate_curies: Vec<String>,
}

impl BiolinkAssociation {
    pub fn predicate_count(&self) -> usize {
        self.predicate_curies.len()
    }

    pub fn is_no_relation(curie: &str) -> bool {
        curie == NO_RELATION_PREDICATE
    }
}
