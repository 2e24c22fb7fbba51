use crate::models::{EtlFailureData, StatusUpdate};

/// Everything one processing unit produced, on three channels: primary
/// output, failures, and status updates to apply once the stage completes.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutput<T> {
    pub primary: Vec<T>,
    pub failures: Vec<EtlFailureData>,
    pub status_updates: Vec<StatusUpdate>,
}

impl<T> Default for StageOutput<T> {
    fn default() -> Self {
        Self {
            primary: Vec::new(),
            failures: Vec::new(),
            status_updates: Vec::new(),
        }
    }
}

impl<T> StageOutput<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure(failure: EtlFailureData) -> Self {
        Self {
            failures: vec![failure],
            ..Self::default()
        }
    }

    pub fn push(&mut self, item: T) {
        self.primary.push(item);
    }

    pub fn push_failure(&mut self, failure: EtlFailureData) {
        self.failures.push(failure);
    }

    pub fn push_status(&mut self, update: StatusUpdate) {
        self.status_updates.push(update);
    }

    /// Append another unit's channels to this one.
    pub fn extend(&mut self, other: StageOutput<T>) {
        self.primary.extend(other.primary);
        self.failures.extend(other.failures);
        self.status_updates.extend(other.status_updates);
    }
}

impl<T> FromIterator<StageOutput<T>> for StageOutput<T> {
    fn from_iter<I: IntoIterator<Item = StageOutput<T>>>(iter: I) -> Self {
        let mut out = StageOutput::new();
        for unit in iter {
            out.extend(unit);
        }
        out
    }
}
