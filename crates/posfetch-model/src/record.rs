// SPDX-License-Identifier: Apache-2.0

use crate::outcome::Outcome;
use crate::posident::Posident;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One identifier's result as decoded from the response document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord {
    pub posident: Posident,
    pub outcome: Outcome,
}

impl DecodedRecord {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }
}

/// A successful record with attribute names rewritten to destination column
/// names. `columns` always contains the external-id column; the remaining
/// keys vary per record depending on what the service returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertedRecord {
    pub posident: Posident,
    pub columns: BTreeMap<String, String>,
}
