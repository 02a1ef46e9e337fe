// SPDX-License-Identifier: Apache-2.0

use crate::IngestError;
use posfetch_model::{AttributeOverrides, ConvertedRecord, Posident};
use std::collections::{BTreeMap, BTreeSet};

/// Mechanical wire-to-column transform: an underscore is inserted before
/// every uppercase ASCII letter, then the whole key is uppercased.
/// `stavDat` becomes `STAV_DAT`, `datumVzniku` becomes `DATUM_VZNIKU`.
#[must_use]
pub fn transform_name(external: &str) -> String {
    let mut out = String::with_capacity(external.len() + 4);
    for c in external.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(c.to_ascii_uppercase());
    }
    out
}

/// Converts one successful result into destination-column form.
///
/// Resolution per attribute: mechanical transform first, and the result is
/// kept only when the destination table actually has that column; otherwise
/// the override table decides. A name neither resolves is fatal for the
/// whole record, and no partial conversion escapes. The external id lands
/// under `external_id_column` last.
pub fn convert_success(
    posident: &Posident,
    attributes: &BTreeMap<String, String>,
    external_id: &str,
    destination_columns: &BTreeSet<String>,
    overrides: &AttributeOverrides,
    external_id_column: &str,
) -> Result<ConvertedRecord, IngestError> {
    let mut columns = BTreeMap::new();
    for (attribute, value) in attributes {
        let candidate = transform_name(attribute);
        let column = if destination_columns.contains(&candidate) {
            candidate
        } else if let Some(mapped) = overrides.get(attribute) {
            mapped.to_string()
        } else {
            return Err(IngestError::Mapping {
                posident: posident.as_str().to_string(),
                attribute: attribute.clone(),
                candidate,
            });
        };
        columns.insert(column, value.clone());
    }
    columns.insert(external_id_column.to_string(), external_id.to_string());
    Ok(ConvertedRecord {
        posident: posident.clone(),
        columns,
    })
}
