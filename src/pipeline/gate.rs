//! Stage eligibility and post-stage status derivation.

use std::collections::{BTreeSet, HashSet};

use crate::models::{
    DocumentCriteria, EtlFailureData, ProcessingStatus, ProcessingStatusFlag, StatusUpdate,
};

/// Which documents a stage should process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageGate {
    /// Flag the stage sets. Stages that only export output have none and
    /// re-admit documents on every run.
    pub target: Option<ProcessingStatusFlag>,
    pub required: BTreeSet<ProcessingStatusFlag>,
    /// Restrict to documents tagged with this collection.
    pub collection: Option<String>,
}

impl StageGate {
    pub fn new(
        target: ProcessingStatusFlag,
        required: impl IntoIterator<Item = ProcessingStatusFlag>,
    ) -> Self {
        Self {
            target: Some(target),
            required: required.into_iter().collect(),
            collection: None,
        }
    }

    /// A gate with no target flag.
    pub fn requiring(required: impl IntoIterator<Item = ProcessingStatusFlag>) -> Self {
        Self {
            target: None,
            required: required.into_iter().collect(),
            collection: None,
        }
    }

    pub fn with_collection(mut self, collection: Option<String>) -> Self {
        self.collection = collection;
        self
    }

    pub fn admits(&self, status: &ProcessingStatus) -> bool {
        self.target.map_or(true, |target| !status.is_enabled(target))
            && self.required.iter().all(|flag| status.is_enabled(*flag))
            && self
                .collection
                .as_deref()
                .map_or(true, |c| status.in_collection(c))
    }

    /// Ids of admitted documents, sorted.
    pub fn eligible<'a, I>(&self, statuses: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a ProcessingStatus>,
    {
        let mut ids: Vec<String> = statuses
            .into_iter()
            .filter(|status| self.admits(status))
            .map(|status| status.document_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Status updates for a completed stage: every processed document without a
/// failure in this run gets `flag`.
pub fn success_status_updates<'a, I>(
    processed: I,
    failures: &[EtlFailureData],
    flag: ProcessingStatusFlag,
    criteria: &DocumentCriteria,
) -> Vec<StatusUpdate>
where
    I: IntoIterator<Item = (&'a str, u32)>,
{
    let failed: HashSet<&str> = failures.iter().map(|f| f.document_id.as_str()).collect();
    processed
        .into_iter()
        .filter(|(id, _)| !failed.contains(id))
        .map(|(id, chunk_count)| StatusUpdate::new(id, flag, criteria.clone(), chunk_count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentFormat, DocumentType, PipelineKey};
    use chrono::Utc;

    use crate::models::ProcessingStatusFlag::{DpDone as A, OgerChebiDone as B, SentenceDone as C};

    fn criteria() -> DocumentCriteria {
        DocumentCriteria::new(DocumentType::Text, DocumentFormat::Text, PipelineKey::Orig, "0.1")
    }

    fn status(id: &str, flags: &[ProcessingStatusFlag]) -> ProcessingStatus {
        let mut s = ProcessingStatus::new(id);
        for flag in flags {
            s.enable_flag(*flag, criteria(), 1);
        }
        s
    }

    #[test]
    fn admits_when_required_set_and_target_unset() {
        let gate = StageGate::new(C, [A, B]);
        assert!(gate.admits(&status("d", &[A, B])));
    }

    #[test]
    fn excludes_when_any_required_missing() {
        let gate = StageGate::new(C, [A, B]);
        assert!(!gate.admits(&status("d", &[A])));
        assert!(!gate.admits(&status("d", &[B])));
        assert!(!gate.admits(&status("d", &[])));
    }

    #[test]
    fn excludes_when_target_already_set() {
        let gate = StageGate::new(C, [A, B]);
        assert!(!gate.admits(&status("d", &[A, B, C])));
    }

    #[test]
    fn empty_required_admits_everything_without_target() {
        let gate = StageGate::new(C, []);
        let statuses = vec![status("b", &[]), status("a", &[A]), status("c", &[C])];
        assert_eq!(gate.eligible(&statuses), vec!["a", "b"]);
    }

    #[test]
    fn untargeted_gate_readmits_finished_documents() {
        let gate = StageGate::requiring([A]);
        assert!(gate.admits(&status("d", &[A, C])));
        assert!(!gate.admits(&status("d", &[C])));
    }

    #[test]
    fn collection_filter_restricts() {
        let gate = StageGate::new(A, []).with_collection(Some("CORD19".into()));
        let mut tagged = status("t", &[]);
        tagged.add_collection("CORD19");
        let untagged = status("u", &[]);
        assert_eq!(gate.eligible([&tagged, &untagged]), vec!["t"]);
    }

    #[test]
    fn failed_documents_get_no_flag() {
        let failures = vec![EtlFailureData::new(criteria(), "bad", "boom", None, Utc::now())];
        let updates = success_status_updates(
            [("good", 2), ("bad", 1)],
            &failures,
            ProcessingStatusFlag::DpDone,
            &criteria(),
        );
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].document_id, "good");
        assert_eq!(updates[0].chunk_count, 2);
        assert_eq!(updates[0].flag, ProcessingStatusFlag::DpDone);
    }
}
