// SPDX-License-Identifier: Apache-2.0

use posfetch_model::{DecodedRecord, Outcome, Posident, ServiceErrorCode, Tally};
use tracing::{error, info};

/// A record whose error marker fell outside the closed code set. Fatal for
/// that record only; surfaced to the caller instead of being counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolViolation {
    pub posident: Posident,
    pub raw_code: String,
}

/// Per-batch classification result. `successes` keeps response order, as do
/// the reject and violation lists.
#[derive(Debug, Default)]
pub struct Classified {
    pub successes: Vec<DecodedRecord>,
    pub rejected: Vec<(Posident, ServiceErrorCode)>,
    pub violations: Vec<ProtocolViolation>,
}

/// Assigns each decoded record its terminal outcome and updates the tally.
///
/// Records are processed in response order. Known error codes are expected
/// business outcomes: counted and logged at informational severity, never
/// an error path. Unrecognized markers are logged at error severity and
/// collected as violations.
pub fn classify(records: Vec<DecodedRecord>, tally: &mut Tally) -> Classified {
    let mut out = Classified::default();
    for record in records {
        match &record.outcome {
            Outcome::Success { .. } => {
                tally.add_success();
                info!(posident = %record.posident, "personal data downloaded");
                out.successes.push(record);
            }
            Outcome::Rejected(code) => {
                tally.add_rejected(*code);
                info!(posident = %record.posident, code = %code, "identifier rejected by service");
                out.rejected.push((record.posident, *code));
            }
            Outcome::Unrecognized(raw) => {
                error!(posident = %record.posident, code = %raw, "unrecognized service error code");
                out.violations.push(ProtocolViolation {
                    posident: record.posident,
                    raw_code: raw.clone(),
                });
            }
        }
    }
    out
}
