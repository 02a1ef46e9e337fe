// SPDX-License-Identifier: Apache-2.0

use crate::ClientError;
use posfetch_model::ServiceConfig;

/// Seam between the pipeline and the network. The production implementation
/// posts over HTTP; tests substitute canned responses.
pub trait Transport {
    /// One blocking round trip: request document out, response document in.
    ///
    /// Implementations must report HTTP-level failure (connect error,
    /// non-success status) as `ClientError::Transport`, distinct from a
    /// successful response that carries per-identifier error markers.
    fn round_trip(&self, request: &str) -> Result<String, ClientError>;
}

/// Blocking HTTP POST with the fixed SOAP headers from configuration.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    config: ServiceConfig,
}

impl HttpTransport {
    pub fn new(config: ServiceConfig) -> Result<Self, ClientError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }
}

impl Transport for HttpTransport {
    fn round_trip(&self, request: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Content-Type", &self.config.content_type)
            .header("Accept-Encoding", &self.config.accept_encoding)
            .header("SOAPAction", &self.config.soap_action)
            .header("Connection", &self.config.connection)
            .body(request.to_string())
            .send()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Transport(format!(
                "service returned HTTP {status}"
            )));
        }
        response
            .text()
            .map_err(|e| ClientError::Transport(e.to_string()))
    }
}
