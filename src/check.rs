//! Integrity check, delegated to the embedded library's own
//! `PRAGMA integrity_check`.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rusqlite::{Connection, OpenFlags};

/// Succeeds only when the database opens and every `integrity_check` row
/// is exactly `ok`.
pub fn check_integrity(db_path: &Path) -> Result<()> {
    fs::metadata(db_path).with_context(|| format!("cannot stat {}", db_path.display()))?;

    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open {}", db_path.display()))?;

    let mut stmt = conn
        .prepare("PRAGMA integrity_check")
        .context("integrity check failed to start")?;
    let results = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("integrity check failed")?;

    for result in results {
        if result != "ok" {
            bail!("integrity check reported: {}", result);
        }
    }

    Ok(())
}
