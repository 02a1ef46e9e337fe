// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    Empty,
    Trimmed,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("posident must not be empty"),
            Self::Trimmed => f.write_str("posident must not contain leading/trailing whitespace"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Opaque identifier of a personal-data subject at the remote service.
///
/// Posidents are base64-like tokens handed out by the service; they are
/// compared by exact string equality and never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Posident(String);

impl Posident {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(ParseError::Empty);
        }
        if input.trim() != input {
            return Err(ParseError::Trimmed);
        }
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Posident {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Posident;

    #[test]
    fn accepts_opaque_tokens() {
        let p = Posident::parse("im+o3Qoxrit4Zwy/eqwxTP==").expect("posident");
        assert_eq!(p.as_str(), "im+o3Qoxrit4Zwy/eqwxTP==");
    }

    #[test]
    fn rejects_empty_and_padded_tokens() {
        assert!(Posident::parse("").is_err());
        assert!(Posident::parse(" abc").is_err());
        assert!(Posident::parse("abc\n").is_err());
    }
}
