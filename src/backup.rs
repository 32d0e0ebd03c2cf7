//! Schema backup.
//!
//! Recovery needs the CREATE TABLE statements of the damaged database,
//! and by the time a file is damaged it is too late to ask it. This
//! snapshot is meant to run periodically against the healthy database so
//! a recent copy of the schema is always on hand.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use tracing::info;

use crate::recover::schema::TableSchema;

/// Writes the user-table schemas of the database at `db_path` to
/// `backup_path` as pretty-printed JSON.
pub fn export_schema(db_path: &Path, backup_path: &Path) -> Result<()> {
    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open {}", db_path.display()))?;

    let mut stmt = conn.prepare(
        "SELECT name, sql FROM sqlite_master \
         WHERE type = 'table' AND sql IS NOT NULL AND name NOT LIKE 'sqlite_%'",
    )?;
    let schemas = stmt
        .query_map([], |row| {
            Ok(TableSchema {
                name: row.get(0)?,
                sql: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let json = serde_json::to_string_pretty(&schemas)?;
    fs::write(backup_path, json)
        .with_context(|| format!("failed to write {}", backup_path.display()))?;

    info!(tables = schemas.len(), backup = %backup_path.display(), "schema exported");
    Ok(())
}
