// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod batch;
mod config;
mod outcome;
mod overrides;
mod posident;
mod record;
mod tally;

pub use batch::{BatchPlan, DEFAULT_BATCH_SIZE};
pub use config::{AppConfig, Credentials, PipelineConfig, ServiceConfig};
pub use outcome::{Outcome, ServiceErrorCode, UnrecognizedErrorCode};
pub use overrides::{AttributeOverrides, OverridesLoadError};
pub use posident::{ParseError, Posident};
pub use record::{ConvertedRecord, DecodedRecord};
pub use tally::Tally;
