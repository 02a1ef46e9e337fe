// SPDX-License-Identifier: Apache-2.0

use crate::IngestError;
use posfetch_model::{ConvertedRecord, Posident};
use rusqlite::{params, Connection};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// The local SQLite database the pipeline reconciles into. All writes go
/// through per-batch transactions.
pub struct DestinationStore {
    conn: Connection,
    table: String,
}

impl DestinationStore {
    /// Opens an existing database file. The file must already exist:
    /// letting SQLite create an empty one would turn a path typo into a
    /// silent no-op run.
    pub fn open(path: &Path, table: &str) -> Result<Self, IngestError> {
        if !path.is_file() {
            return Err(IngestError::Persistence(format!(
                "destination database not found: {}",
                path.display()
            )));
        }
        validate_identifier(table)?;
        let conn = Connection::open(path)
            .map_err(|e| IngestError::Persistence(format!("cannot open {}: {e}", path.display())))?;
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    /// Column names of the destination table, for mapping resolution.
    pub fn columns(&self) -> Result<BTreeSet<String>, IngestError> {
        let sql = format!("PRAGMA table_info({})", self.table);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| IngestError::Persistence(e.to_string()))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(|e| IngestError::Persistence(e.to_string()))?
            .collect::<Result<BTreeSet<String>, _>>()
            .map_err(|e| IngestError::Persistence(e.to_string()))?;
        if names.is_empty() {
            return Err(IngestError::Persistence(format!(
                "destination table {} does not exist",
                self.table
            )));
        }
        Ok(names)
    }

    /// Adds a text column if the table does not have it yet. Idempotent.
    pub fn ensure_column(&self, name: &str) -> Result<(), IngestError> {
        validate_identifier(name)?;
        if self.columns()?.contains(name) {
            return Ok(());
        }
        let sql = format!("ALTER TABLE {} ADD COLUMN {} TEXT", self.table, name);
        self.conn
            .execute(&sql, [])
            .map_err(|e| IngestError::Persistence(e.to_string()))?;
        info!(table = %self.table, column = name, "destination column added");
        Ok(())
    }

    /// Reads identifiers to process out of the destination table itself.
    /// `sql` overrides the default single-column select; the result must
    /// not be empty.
    pub fn posidents(&self, sql: Option<&str>) -> Result<Vec<Posident>, IngestError> {
        let default = format!("SELECT id FROM {} ORDER BY id", self.table);
        let sql = sql.unwrap_or(&default);
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| IngestError::Source(e.to_string()))?;
        let raw = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| IngestError::Source(e.to_string()))?
            .collect::<Result<Vec<String>, _>>()
            .map_err(|e| IngestError::Source(e.to_string()))?;
        if raw.is_empty() {
            return Err(IngestError::Source(format!(
                "identifier query returned no rows: {sql}"
            )));
        }
        raw.iter()
            .map(|s| {
                Posident::parse(s)
                    .map_err(|e| IngestError::Source(format!("invalid identifier {s:?}: {e}")))
            })
            .collect()
    }

    /// Writes one batch of converted records inside a single transaction.
    /// Any failure rolls the whole batch back; a row that matches no
    /// existing record simply updates nothing.
    pub fn commit_batch(&mut self, records: &[ConvertedRecord]) -> Result<(), IngestError> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| IngestError::Persistence(e.to_string()))?;
        for record in records {
            for (column, value) in &record.columns {
                validate_identifier(column)?;
                let sql = format!("UPDATE {} SET {} = ?1 WHERE id = ?2", self.table, column);
                tx.execute(&sql, params![value, record.posident.as_str()])
                    .map_err(|e| {
                        IngestError::Persistence(format!(
                            "updating {} for {}: {e}",
                            column, record.posident
                        ))
                    })?;
            }
        }
        tx.commit()
            .map_err(|e| IngestError::Persistence(e.to_string()))?;
        for record in records {
            info!(posident = %record.posident, "destination row updated");
        }
        Ok(())
    }
}

/// Table and column names are spliced into SQL text, so they are held to a
/// strict charset instead of being parameterized.
fn validate_identifier(name: &str) -> Result<(), IngestError> {
    let ok = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(IngestError::Persistence(format!(
            "unsafe SQL identifier: {name:?}"
        )))
    }
}
