// SPDX-License-Identifier: Apache-2.0

use crate::IngestError;
use posfetch_model::{ConvertedRecord, Posident};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::info;

const POSIDENT_HEADER: &str = "posident";

/// Writes committed records as CSV. The header is the identifier column
/// followed by the sorted union of all columns seen across records; a
/// record missing a column gets an empty field.
pub fn write_csv(path: &Path, records: &[ConvertedRecord]) -> Result<(), IngestError> {
    let mut union: BTreeSet<&str> = BTreeSet::new();
    for record in records {
        union.extend(record.columns.keys().map(String::as_str));
    }

    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| IngestError::Export(format!("cannot create {}: {e}", path.display())))?;
    let mut header = vec![POSIDENT_HEADER];
    header.extend(union.iter().copied());
    writer
        .write_record(&header)
        .map_err(|e| IngestError::Export(e.to_string()))?;
    for record in records {
        let mut row = vec![record.posident.as_str()];
        for column in &union {
            row.push(record.columns.get(*column).map_or("", String::as_str));
        }
        writer
            .write_record(&row)
            .map_err(|e| IngestError::Export(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| IngestError::Export(e.to_string()))?;
    info!(path = %path.display(), records = records.len(), "csv written");
    Ok(())
}

/// Writes committed records as one JSON object keyed by identifier.
pub fn write_json(path: &Path, records: &[ConvertedRecord]) -> Result<(), IngestError> {
    let map: BTreeMap<&str, &BTreeMap<String, String>> = records
        .iter()
        .map(|r| (r.posident.as_str(), &r.columns))
        .collect();
    let text = serde_json::to_string_pretty(&map)
        .map_err(|e| IngestError::Export(e.to_string()))?;
    std::fs::write(path, text)
        .map_err(|e| IngestError::Export(format!("cannot write {}: {e}", path.display())))?;
    info!(path = %path.display(), records = records.len(), "json written");
    Ok(())
}

/// Writes identifiers that never made it to the destination, with the
/// reason, as a JSON object keyed by identifier.
pub fn write_rejects_json(
    path: &Path,
    entries: &[(Posident, String)],
) -> Result<(), IngestError> {
    let map: BTreeMap<&str, &str> = entries
        .iter()
        .map(|(posident, reason)| (posident.as_str(), reason.as_str()))
        .collect();
    let text = serde_json::to_string_pretty(&map)
        .map_err(|e| IngestError::Export(e.to_string()))?;
    std::fs::write(path, text)
        .map_err(|e| IngestError::Export(format!("cannot write {}: {e}", path.display())))?;
    info!(path = %path.display(), records = entries.len(), "rejects written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{write_csv, write_json, write_rejects_json};
    use posfetch_model::{ConvertedRecord, Posident};
    use std::collections::BTreeMap;

    fn record(posident: &str, pairs: &[(&str, &str)]) -> ConvertedRecord {
        ConvertedRecord {
            posident: Posident::parse(posident).expect("id"),
            columns: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn csv_header_is_sorted_union_with_identifier_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.csv");
        write_csv(
            &path,
            &[
                record("a", &[("STAV_DAT", "0")]),
                record("b", &[("DATUM_VZNIKU", "2020-02-20"), ("STAV_DAT", "1")]),
            ],
        )
        .expect("write");
        let text = std::fs::read_to_string(&path).expect("read");
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("posident,DATUM_VZNIKU,STAV_DAT"));
        assert_eq!(lines.next(), Some("a,,0"));
        assert_eq!(lines.next(), Some("b,2020-02-20,1"));
    }

    #[test]
    fn json_is_keyed_by_identifier() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.json");
        write_json(&path, &[record("a", &[("STAV_DAT", "0")])]).expect("write");
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(value["a"]["STAV_DAT"], "0");
    }

    #[test]
    fn rejects_map_identifier_to_reason() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rejects.json");
        write_rejects_json(
            &path,
            &[(
                Posident::parse("a").expect("id"),
                "NEPLATNY_IDENTIFIKATOR".to_string(),
            )],
        )
        .expect("write");
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(value["a"], "NEPLATNY_IDENTIFIKATOR");
    }
}
