// SPDX-License-Identifier: Apache-2.0

use crate::posident::Posident;
use std::collections::HashSet;

/// Maximum number of identifiers sent in one request, matching the remote
/// service's documented limit.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Deduplicated, order-preserving partition of the input identifiers into
/// request-sized batches.
///
/// `total_submitted` is counted before deduplication; `duplicates_removed`
/// is the derived difference. Batches partition the unique sequence
/// contiguously, so every identifier appears in exactly one batch and the
/// final batch may be shorter than `batch_size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    batches: Vec<Vec<Posident>>,
    total_submitted: usize,
    unique: usize,
    batch_size: usize,
}

impl BatchPlan {
    pub fn build(posidents: &[Posident], batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        let total_submitted = posidents.len();

        let mut seen: HashSet<&Posident> = HashSet::with_capacity(posidents.len());
        let mut unique: Vec<Posident> = Vec::with_capacity(posidents.len());
        for p in posidents {
            if seen.insert(p) {
                unique.push(p.clone());
            }
        }

        let unique_count = unique.len();
        let mut batches = Vec::with_capacity(unique_count.div_ceil(batch_size));
        let mut rest = unique.as_slice();
        while !rest.is_empty() {
            let take = rest.len().min(batch_size);
            batches.push(rest[..take].to_vec());
            rest = &rest[take..];
        }

        Self {
            batches,
            total_submitted,
            unique: unique_count,
            batch_size,
        }
    }

    #[must_use]
    pub fn batches(&self) -> &[Vec<Posident>] {
        &self.batches
    }

    #[must_use]
    pub fn total_submitted(&self) -> usize {
        self.total_submitted
    }

    #[must_use]
    pub fn unique_count(&self) -> usize {
        self.unique
    }

    #[must_use]
    pub fn duplicates_removed(&self) -> usize {
        self.total_submitted - self.unique
    }

    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}
