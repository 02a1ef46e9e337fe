// SPDX-License-Identifier: Apache-2.0

use crate::outcome::ServiceErrorCode;
use serde::{Deserialize, Serialize};

/// Run-scoped outcome counters. Created once per pipeline run, incremented
/// as records are classified, read at the end for reporting. Counters are
/// never decremented.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tally {
    pub total_submitted: usize,
    pub duplicates_removed: usize,
    pub batch_count: usize,
    pub success: usize,
    pub invalid_identifier: usize,
    pub expired_identifier: usize,
    pub subject_not_found: usize,
}

impl Tally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_plan(&mut self, total_submitted: usize, duplicates_removed: usize, batches: usize) {
        self.total_submitted = total_submitted;
        self.duplicates_removed = duplicates_removed;
        self.batch_count = batches;
    }

    pub fn add_success(&mut self) {
        self.success += 1;
    }

    pub fn add_rejected(&mut self, code: ServiceErrorCode) {
        match code {
            ServiceErrorCode::InvalidIdentifier => self.invalid_identifier += 1,
            ServiceErrorCode::ExpiredIdentifier => self.expired_identifier += 1,
            ServiceErrorCode::SubjectNotFound => self.subject_not_found += 1,
        }
    }

    /// Total of classified records, successes and service rejects alike.
    #[must_use]
    pub fn classified(&self) -> usize {
        self.success + self.invalid_identifier + self.expired_identifier + self.subject_not_found
    }
}
