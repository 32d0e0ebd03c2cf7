//! Row sinks.
//!
//! The scanner hands every decoded row to a [`RowSink`]; the production
//! sink writes into a freshly-created output database with
//! `INSERT OR IGNORE`, so a row that collides with an already-recovered
//! rowid is absorbed silently.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use tracing::{debug, info};

use super::core::record::Value;
use super::schema::{ColumnInfo, TableInfo, TableSchema};

/// Destination for recovered rows.
///
/// `Ok(true)` means the row was placed (or was an acceptable duplicate),
/// `Ok(false)` means this table rejected it and the caller should try the
/// next candidate, `Err` aborts the run.
pub trait RowSink {
    fn insert(&mut self, table: &str, values: &[Value]) -> Result<bool>;
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

/// Sink backed by a newly-created SQLite database.
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Creates the output database at `path`, replacing any existing file,
    /// and replays the backed-up CREATE statements into it.
    pub fn create(path: &Path, schemas: &[TableSchema]) -> Result<Self> {
        if path.exists() {
            fs::remove_file(path)
                .with_context(|| format!("failed to remove stale output {}", path.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to create output database {}", path.display()))?;

        for schema in schemas {
            conn.execute_batch(&schema.sql)
                .with_context(|| format!("failed to create table {}", schema.name))?;
        }

        info!(tables = schemas.len(), "initialized output database");
        Ok(Self { conn })
    }

    /// Resolves each backed-up schema into column metadata, preserving
    /// schema order.
    pub fn tables(&self, schemas: &[TableSchema]) -> Result<Vec<TableInfo>> {
        schemas
            .iter()
            .map(|schema| {
                let columns = self.table_info(&schema.name)?;
                Ok(TableInfo {
                    name: schema.name.clone(),
                    columns,
                })
            })
            .collect()
    }

    fn table_info(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info(\"{}\")", table))
            .with_context(|| format!("failed to query columns of {}", table))?;

        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    decl_type: row.get(2)?,
                    primary_key: row.get::<_, i64>(5)? != 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(columns)
    }
}

impl RowSink for SqliteSink {
    fn insert(&mut self, table: &str, values: &[Value]) -> Result<bool> {
        let placeholders = vec!["?"; values.len()].join(", ");
        let sql = format!("INSERT OR IGNORE INTO \"{}\" VALUES ({})", table, placeholders);

        match self.conn.execute(&sql, params_from_iter(values.iter())) {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!(table, error = %e, "insert rejected");
                Ok(false)
            }
        }
    }
}
