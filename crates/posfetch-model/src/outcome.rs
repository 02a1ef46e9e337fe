// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Error codes the remote service attaches to a per-identifier result.
///
/// The set is closed by the service contract; anything else on the wire is
/// a protocol violation, never a fourth business outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceErrorCode {
    InvalidIdentifier,
    ExpiredIdentifier,
    SubjectNotFound,
}

impl ServiceErrorCode {
    /// Wire spelling of the code as emitted by the service.
    #[must_use]
    pub const fn as_wire_str(self) -> &'static str {
        match self {
            Self::InvalidIdentifier => "NEPLATNY_IDENTIFIKATOR",
            Self::ExpiredIdentifier => "EXPIROVANY_IDENTIFIKATOR",
            Self::SubjectNotFound => "OPRAVNENY_SUBJEKT_NEEXISTUJE",
        }
    }

    /// Parses a wire code, failing loudly on anything outside the closed set.
    pub fn parse(input: &str) -> Result<Self, UnrecognizedErrorCode> {
        match input {
            "NEPLATNY_IDENTIFIKATOR" => Ok(Self::InvalidIdentifier),
            "EXPIROVANY_IDENTIFIKATOR" => Ok(Self::ExpiredIdentifier),
            "OPRAVNENY_SUBJEKT_NEEXISTUJE" => Ok(Self::SubjectNotFound),
            other => Err(UnrecognizedErrorCode(other.to_string())),
        }
    }
}

impl Display for ServiceErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedErrorCode(pub String);

impl Display for UnrecognizedErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognized service error code: {}", self.0)
    }
}

impl std::error::Error for UnrecognizedErrorCode {}

/// Terminal classification of one identifier after a round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Personal data returned; attribute names are still in the external
    /// (wire) spelling.
    Success {
        attributes: BTreeMap<String, String>,
        external_id: String,
    },
    /// A recognized business error code; counted, not fatal.
    Rejected(ServiceErrorCode),
    /// An error marker outside the closed code set. Fatal for this record
    /// only; must never be reclassified as success or silently dropped.
    Unrecognized(String),
}
