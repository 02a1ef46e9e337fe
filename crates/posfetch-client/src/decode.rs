// SPDX-License-Identifier: Apache-2.0

use crate::ClientError;
use posfetch_model::{DecodedRecord, Outcome, Posident, ServiceErrorCode};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;
use tracing::info;

const RESULT_ELEMENT: &str = "os";
const IDENTIFIER_ELEMENT: &str = "pOSIdent";
const ERROR_MARKER_ELEMENT: &str = "chybaPOSIdent";
const EXTERNAL_ID_ELEMENT: &str = "osId";
const DETAIL_ELEMENT: &str = "osDetail";
const MESSAGE_ELEMENT: &str = "zprava";

#[derive(Debug, Default)]
struct ResultBuilder {
    posident: Option<String>,
    error_marker: Option<String>,
    external_id: Option<String>,
    attributes: BTreeMap<String, String>,
}

/// What the next text node belongs to.
enum Capture {
    Identifier,
    ErrorMarker,
    ExternalId,
    Message,
    Attribute(String),
}

/// Parses the response document into one record per submitted identifier.
///
/// Service-level informational messages are logged and discarded. A record
/// count differing from the submitted batch fails the whole decode: a
/// silently dropped identifier would hide service malfunction.
pub fn decode_response(
    xml: &str,
    submitted: &[Posident],
) -> Result<Vec<DecodedRecord>, ClientError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut records: Vec<DecodedRecord> = Vec::with_capacity(submitted.len());
    let mut current: Option<ResultBuilder> = None;
    let mut capture: Option<Capture> = None;
    let mut in_detail = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let name = local_name(start.name().as_ref());
                match name.as_str() {
                    RESULT_ELEMENT => {
                        current = Some(ResultBuilder::default());
                        in_detail = false;
                    }
                    DETAIL_ELEMENT if current.is_some() => in_detail = true,
                    IDENTIFIER_ELEMENT if current.is_some() => {
                        capture = Some(Capture::Identifier);
                    }
                    ERROR_MARKER_ELEMENT if current.is_some() => {
                        capture = Some(Capture::ErrorMarker);
                    }
                    EXTERNAL_ID_ELEMENT if current.is_some() => {
                        capture = Some(Capture::ExternalId);
                    }
                    MESSAGE_ELEMENT => capture = Some(Capture::Message),
                    other if in_detail => {
                        // Attribute elements keep their key even when the
                        // text node is absent.
                        if let Some(builder) = current.as_mut() {
                            builder.attributes.insert(other.to_string(), String::new());
                        }
                        capture = Some(Capture::Attribute(other.to_string()));
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(start)) => {
                // Self-closing elements carry no text node; the value is
                // the empty string.
                let name = local_name(start.name().as_ref());
                if let Some(builder) = current.as_mut() {
                    match name.as_str() {
                        IDENTIFIER_ELEMENT => builder.posident = Some(String::new()),
                        ERROR_MARKER_ELEMENT => builder.error_marker = Some(String::new()),
                        EXTERNAL_ID_ELEMENT => builder.external_id = Some(String::new()),
                        other if in_detail => {
                            builder.attributes.insert(other.to_string(), String::new());
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(text)) => {
                let value = text
                    .unescape()
                    .map_err(|e| ClientError::Protocol(e.to_string()))?
                    .into_owned();
                match (&capture, current.as_mut()) {
                    (Some(Capture::Identifier), Some(builder)) => {
                        builder.posident = Some(value);
                    }
                    (Some(Capture::ErrorMarker), Some(builder)) => {
                        builder.error_marker = Some(value);
                    }
                    (Some(Capture::ExternalId), Some(builder)) => {
                        builder.external_id = Some(value);
                    }
                    (Some(Capture::Attribute(key)), Some(builder)) => {
                        builder.attributes.insert(key.clone(), value);
                    }
                    (Some(Capture::Message), _) => {
                        info!(message = %value, "service message");
                    }
                    _ => {}
                }
            }
            Ok(Event::End(end)) => {
                let name = local_name(end.name().as_ref());
                match name.as_str() {
                    RESULT_ELEMENT => {
                        if let Some(builder) = current.take() {
                            records.push(finish_record(builder)?);
                        }
                        in_detail = false;
                    }
                    DETAIL_ELEMENT => in_detail = false,
                    _ => {}
                }
                capture = None;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ClientError::Protocol(format!(
                    "malformed response document: {e}"
                )))
            }
        }
    }

    if records.len() != submitted.len() {
        return Err(ClientError::Protocol(format!(
            "response carries {} result(s) for {} submitted identifier(s)",
            records.len(),
            submitted.len()
        )));
    }
    Ok(records)
}

fn finish_record(builder: ResultBuilder) -> Result<DecodedRecord, ClientError> {
    let raw_posident = builder
        .posident
        .ok_or_else(|| ClientError::Protocol("result element without identifier".to_string()))?;
    let posident = Posident::parse(&raw_posident)
        .map_err(|e| ClientError::Protocol(format!("invalid identifier in response: {e}")))?;

    let outcome = match builder.error_marker {
        Some(marker) => match ServiceErrorCode::parse(&marker) {
            Ok(code) => Outcome::Rejected(code),
            Err(unrecognized) => Outcome::Unrecognized(unrecognized.0),
        },
        None => {
            let external_id = builder.external_id.ok_or_else(|| {
                ClientError::Protocol(format!(
                    "successful result for {posident} lacks the external id element"
                ))
            })?;
            Outcome::Success {
                attributes: builder.attributes,
                external_id,
            }
        }
    };
    Ok(DecodedRecord { posident, outcome })
}

fn local_name(qualified: &[u8]) -> String {
    let bytes = match qualified.iter().rposition(|b| *b == b':') {
        Some(idx) => &qualified[idx + 1..],
        None => qualified,
    };
    String::from_utf8_lossy(bytes).into_owned()
}
