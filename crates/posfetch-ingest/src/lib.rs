// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod convert;
mod export;
mod pipeline;
mod sources;
mod store;

use std::fmt::{Display, Formatter};

pub use convert::{convert_success, transform_name};
pub use export::{write_csv, write_json, write_rejects_json};
pub use pipeline::{Pipeline, PipelineError, RunReport};
pub use sources::{posidents_from_json_file, posidents_from_text_file};
pub use store::DestinationStore;

/// Failures on the destination side of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// An attribute name resolves to no destination column; fatal for the
    /// whole conversion of the affected record.
    Mapping {
        posident: String,
        attribute: String,
        candidate: String,
    },
    /// Destination-store failure; a batch transaction that hits this is
    /// rolled back in full.
    Persistence(String),
    /// Identifier input could not be read.
    Source(String),
    /// Flat-file output could not be written.
    Export(String),
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mapping {
                posident,
                attribute,
                candidate,
            } => write!(
                f,
                "attribute {attribute} of {posident} cannot be converted to a destination column (tried {candidate})"
            ),
            Self::Persistence(msg) => write!(f, "persistence failure: {msg}"),
            Self::Source(msg) => write!(f, "identifier source failure: {msg}"),
            Self::Export(msg) => write!(f, "export failure: {msg}"),
        }
    }
}

impl std::error::Error for IngestError {}
