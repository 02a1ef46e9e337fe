// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod classify;
mod decode;
mod request;
mod transport;

use std::fmt::{Display, Formatter};

pub use classify::{classify, Classified, ProtocolViolation};
pub use decode::decode_response;
pub use request::render_request;
pub use transport::{HttpTransport, Transport};

/// Failures on the wire side of the pipeline.
///
/// `Transport` is fatal for the batch before any per-identifier parsing;
/// `Protocol` means the service answered but the document violated the
/// contract (count mismatch, missing required element).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    Transport(String),
    Protocol(String),
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport failure: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}
