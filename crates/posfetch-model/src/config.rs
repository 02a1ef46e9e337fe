// SPDX-License-Identifier: Apache-2.0

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::overrides::AttributeOverrides;
use serde::{Deserialize, Serialize};

/// Remote service endpoint and the fixed SOAP headers sent with every
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    pub endpoint: String,
    #[serde(default = "default_soap_action")]
    pub soap_action: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default = "default_accept_encoding")]
    pub accept_encoding: String,
    #[serde(default = "default_connection")]
    pub connection: String,
}

fn default_soap_action() -> String {
    "http://katastr.cuzk.cz/ctios/ctios".to_string()
}

fn default_content_type() -> String {
    "text/xml;charset=UTF-8".to_string()
}

fn default_accept_encoding() -> String {
    "gzip,deflate".to_string()
}

fn default_connection() -> String {
    "Keep-Alive".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Knobs of the batch pipeline itself; everything has a sensible default so
/// a minimal config only names the endpoint and credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_destination_table")]
    pub destination_table: String,
    #[serde(default = "default_external_id_column")]
    pub external_id_column: String,
    #[serde(default)]
    pub overrides: AttributeOverrides,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_destination_table() -> String {
    "OPSUB".to_string()
}

fn default_external_id_column() -> String {
    "OS_ID".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            destination_table: default_destination_table(),
            external_id_column: default_external_id_column(),
            overrides: AttributeOverrides::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub credentials: Credentials,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}
