//! Table descriptors for recovery.
//!
//! [`TableSchema`] is the backed-up form: a table name plus its CREATE
//! statement, as written to the schema JSON file by the backup step.
//! [`TableInfo`] is the working form the scanner matches records against:
//! column names, declared types, and primary-key flags, derived from the
//! freshly-created output database.

use serde::{Deserialize, Serialize};

/// One table as captured by the schema backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub sql: String,
}

/// One table as seen by the scanner.
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

/// One column of a [`TableInfo`].
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub decl_type: String,
    pub primary_key: bool,
}

impl ColumnInfo {
    /// True when this column is an alias for the rowid. Such a column is
    /// stored as NULL in the record body; the cell's rowid carries its
    /// value instead.
    pub fn is_rowid_alias(&self) -> bool {
        self.primary_key && self.decl_type.eq_ignore_ascii_case("INTEGER")
    }
}
