// SPDX-License-Identifier: Apache-2.0

use crate::IngestError;
use posfetch_model::Posident;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PosidentFile {
    posidents: Vec<String>,
}

/// Reads identifiers from a text file, one per line. Blank lines are
/// skipped; input order is preserved.
pub fn posidents_from_text_file(path: &Path) -> Result<Vec<Posident>, IngestError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| IngestError::Source(format!("cannot read {}: {e}", path.display())))?;
    let mut out = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let posident = Posident::parse(line).map_err(|e| {
            IngestError::Source(format!(
                "{} line {}: {e}",
                path.display(),
                lineno + 1
            ))
        })?;
        out.push(posident);
    }
    if out.is_empty() {
        return Err(IngestError::Source(format!(
            "{} holds no identifiers",
            path.display()
        )));
    }
    Ok(out)
}

/// Reads identifiers from a JSON document of the form
/// `{"posidents": ["...", ...]}`. Input order is preserved.
pub fn posidents_from_json_file(path: &Path) -> Result<Vec<Posident>, IngestError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| IngestError::Source(format!("cannot read {}: {e}", path.display())))?;
    let file: PosidentFile = serde_json::from_str(&text)
        .map_err(|e| IngestError::Source(format!("{}: {e}", path.display())))?;
    if file.posidents.is_empty() {
        return Err(IngestError::Source(format!(
            "{} holds no identifiers",
            path.display()
        )));
    }
    file.posidents
        .iter()
        .map(|s| {
            Posident::parse(s)
                .map_err(|e| IngestError::Source(format!("{}: {e}", path.display())))
        })
        .collect()
}
