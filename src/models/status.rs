//! Per-document completion ledger.
//!
//! Flags are only ever added. `merge` and `enable_flag` may overwrite the
//! criteria recorded for a flag, but no method clears one.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::criteria::DocumentCriteria;
use super::enums::ProcessingStatusFlag;

/// What satisfied a completed stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagState {
    pub criteria: DocumentCriteria,
    pub chunk_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStatus {
    pub document_id: String,
    flags: BTreeMap<ProcessingStatusFlag, FlagState>,
    collections: BTreeSet<String>,
}

impl ProcessingStatus {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            flags: BTreeMap::new(),
            collections: BTreeSet::new(),
        }
    }

    pub fn enable_flag(
        &mut self,
        flag: ProcessingStatusFlag,
        criteria: DocumentCriteria,
        chunk_count: u32,
    ) {
        self.flags.insert(flag, FlagState { criteria, chunk_count });
    }

    pub fn is_enabled(&self, flag: ProcessingStatusFlag) -> bool {
        self.flags.contains_key(&flag)
    }

    pub fn flag_state(&self, flag: ProcessingStatusFlag) -> Option<&FlagState> {
        self.flags.get(&flag)
    }

    pub fn enabled_flags(&self) -> impl Iterator<Item = ProcessingStatusFlag> + '_ {
        self.flags.keys().copied()
    }

    pub fn flags(&self) -> impl Iterator<Item = (ProcessingStatusFlag, &FlagState)> + '_ {
        self.flags.iter().map(|(flag, state)| (*flag, state))
    }

    pub fn add_collection(&mut self, collection: impl Into<String>) {
        self.collections.insert(collection.into());
    }

    pub fn in_collection(&self, collection: &str) -> bool {
        self.collections.contains(collection)
    }

    pub fn collections(&self) -> impl Iterator<Item = &str> + '_ {
        self.collections.iter().map(String::as_str)
    }

    /// Fold `other` into `self`. Flags present in `other` win; flags only in
    /// `self` are kept.
    pub fn merge(&mut self, other: &ProcessingStatus) {
        for (flag, state) in &other.flags {
            self.flags.insert(*flag, state.clone());
        }
        self.collections.extend(other.collections.iter().cloned());
    }
}

/// One monotonic change to a document's ledger: enable `flag` and optionally
/// tag the document with a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub document_id: String,
    pub flag: ProcessingStatusFlag,
    pub criteria: DocumentCriteria,
    pub chunk_count: u32,
    pub collection: Option<String>,
}

impl StatusUpdate {
    pub fn new(
        document_id: impl Into<String>,
        flag: ProcessingStatusFlag,
        criteria: DocumentCriteria,
        chunk_count: u32,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            flag,
            criteria,
            chunk_count,
            collection: None,
        }
    }

    pub fn with_collection(mut self, collection: Option<String>) -> Self {
        self.collection = collection;
        self
    }
}

impl ProcessingStatus {
    pub fn apply(&mut self, update: &StatusUpdate) {
        self.enable_flag(update.flag, update.criteria.clone(), update.chunk_count);
        if let Some(collection) = &update.collection {
            self.add_collection(collection.clone());
        }
    }
}
