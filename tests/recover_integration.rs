//! End-to-end recovery scenarios: build a real database, damage it on
//! disk, and verify what the scanner pulls back out.

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use rusqlite::{params, Connection};
use tempfile::TempDir;

use sqlite_salvage::backup::export_schema;
use sqlite_salvage::check::check_integrity;
use sqlite_salvage::recover::schema::TableSchema;
use sqlite_salvage::recover::{self, RecoverConfig};

const PAGE_SIZE: usize = 4096;

struct Scratch {
    _dir: TempDir,
    root: PathBuf,
}

impl Scratch {
    fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let root = dir.path().to_path_buf();
        Ok(Self { _dir: dir, root })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

/// Creates a `users` table whose rows are large enough (1KB blob each)
/// that 50 of them span well over a dozen pages.
fn create_users_db(path: &Path, rows: i64) -> Result<()> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            name TEXT,
            age INTEGER,
            bio BLOB
        )",
    )?;

    let mut stmt = conn.prepare("INSERT INTO users (name, age, bio) VALUES (?1, ?2, ?3)")?;
    for i in 1..=rows {
        let tag = format!("bio data for user {}", i);
        let mut bio = vec![0u8; 1000];
        bio[..tag.len()].copy_from_slice(tag.as_bytes());
        stmt.execute(params![format!("user{}", i), 20 + i % 50, bio])?;
    }

    Ok(())
}

fn wipe(path: &Path, offset: u64, len: usize) -> Result<()> {
    let mut file = OpenOptions::new().write(true).open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(&vec![0u8; len])?;
    Ok(())
}

fn count_rows(path: &Path, table: &str) -> Result<i64> {
    let conn = Connection::open(path)?;
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

fn recover_config(scratch: &Scratch, corrupt: &str) -> RecoverConfig {
    RecoverConfig {
        corrupt_db: scratch.path(corrupt),
        schema_backup: scratch.path("schema.json"),
        output_db: scratch.path("recovered.db"),
        page_size: PAGE_SIZE,
    }
}

#[test]
fn test_healthy_two_column_roundtrip() -> Result<()> {
    let scratch = Scratch::new()?;
    let db = scratch.path("original.db");

    {
        let conn = Connection::open(&db)?;
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")?;
        conn.execute("INSERT INTO t (name) VALUES ('a'), ('bb'), ('ccc')", [])?;
    }

    export_schema(&db, &scratch.path("schema.json"))?;
    let config = RecoverConfig {
        corrupt_db: db,
        schema_backup: scratch.path("schema.json"),
        output_db: scratch.path("recovered.db"),
        page_size: PAGE_SIZE,
    };
    let report = recover::run(&config)?;
    assert_eq!(report.rows_recovered, 3);

    // The id column is a rowid alias: stored as NULL, recovered from the
    // cell's rowid.
    let conn = Connection::open(&config.output_db)?;
    let mut stmt = conn.prepare("SELECT id, name FROM t ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    assert_eq!(
        rows,
        vec![
            (1, "a".to_string()),
            (2, "bb".to_string()),
            (3, "ccc".to_string())
        ]
    );
    Ok(())
}

#[test]
fn test_first_page_wipe_recovers_later_pages() -> Result<()> {
    let scratch = Scratch::new()?;
    let db = scratch.path("original.db");
    create_users_db(&db, 50)?;
    export_schema(&db, &scratch.path("schema.json"))?;

    std::fs::copy(&db, scratch.path("corrupt.db"))?;
    wipe(&scratch.path("corrupt.db"), 0, PAGE_SIZE)?;
    assert!(check_integrity(&scratch.path("corrupt.db")).is_err());

    let config = recover_config(&scratch, "corrupt.db");
    let report = recover::run(&config)?;

    // Page 1 held only the schema table; every data row lives on later
    // pages and survives.
    assert_eq!(report.rows_recovered, 50);
    assert_eq!(count_rows(&config.output_db, "users")?, 50);
    assert!(check_integrity(&config.output_db).is_ok());

    let conn = Connection::open(&config.output_db)?;
    let bio: Vec<u8> =
        conn.query_row("SELECT bio FROM users WHERE id = 1", [], |row| row.get(0))?;
    assert!(bio.starts_with(b"bio data for user 1"));
    Ok(())
}

#[test]
fn test_middle_page_wipe_loses_only_that_page() -> Result<()> {
    let scratch = Scratch::new()?;
    let db = scratch.path("original.db");
    create_users_db(&db, 50)?;
    export_schema(&db, &scratch.path("schema.json"))?;

    std::fs::copy(&db, scratch.path("corrupt.db"))?;
    wipe(&scratch.path("corrupt.db"), 4 * PAGE_SIZE as u64, PAGE_SIZE)?;
    assert!(check_integrity(&scratch.path("corrupt.db")).is_err());

    let config = recover_config(&scratch, "corrupt.db");
    let report = recover::run(&config)?;

    // One leaf of roughly 1KB rows holds three or four of them; everything
    // else comes back.
    assert!(report.rows_recovered < 50, "wiped page should cost rows");
    assert!(
        report.rows_recovered >= 40,
        "only one page of rows should be lost, recovered {}",
        report.rows_recovered
    );
    assert_eq!(count_rows(&config.output_db, "users")?, report.rows_recovered as i64);
    Ok(())
}

#[test]
fn test_same_arity_schemas_first_wins() -> Result<()> {
    let scratch = Scratch::new()?;
    let db = scratch.path("original.db");

    {
        let conn = Connection::open(&db)?;
        conn.execute_batch(
            "CREATE TABLE a (x INTEGER PRIMARY KEY, y TEXT);
             CREATE TABLE b (p INTEGER PRIMARY KEY, q TEXT);",
        )?;
        conn.execute("INSERT INTO b (q) VALUES ('one'), ('two'), ('three')", [])?;
    }

    export_schema(&db, &scratch.path("schema.json"))?;
    let config = recover_config(&scratch, "original.db");
    let report = recover::run(&config)?;

    // Arity is the only structural check, so rows written to b are claimed
    // by a, the first table in schema order.
    assert_eq!(report.rows_recovered, 3);
    assert_eq!(count_rows(&config.output_db, "a")?, 3);
    assert_eq!(count_rows(&config.output_db, "b")?, 0);
    Ok(())
}

#[test]
fn test_backup_excludes_internal_tables() -> Result<()> {
    let scratch = Scratch::new()?;
    let db = scratch.path("original.db");

    {
        let conn = Connection::open(&db)?;
        // AUTOINCREMENT forces the internal sqlite_sequence table to exist.
        conn.execute_batch(
            "CREATE TABLE notes (id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT);
             CREATE TABLE tags (name TEXT);
             INSERT INTO notes (body) VALUES ('x');",
        )?;
    }

    export_schema(&db, &scratch.path("schema.json"))?;

    let json = std::fs::read_to_string(scratch.path("schema.json"))?;
    let schemas: Vec<TableSchema> = serde_json::from_str(&json)?;
    let names: Vec<&str> = schemas.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["notes", "tags"]);
    assert!(schemas.iter().all(|s| s.sql.starts_with("CREATE TABLE")));
    Ok(())
}

#[test]
fn test_check_integrity_passes_on_healthy_db() -> Result<()> {
    let scratch = Scratch::new()?;
    let db = scratch.path("original.db");
    create_users_db(&db, 5)?;

    check_integrity(&db)?;
    Ok(())
}

#[test]
fn test_check_integrity_fails_on_missing_file() {
    assert!(check_integrity(Path::new("/nonexistent/no.db")).is_err());
}

#[test]
fn test_empty_schema_backup_recovers_nothing() -> Result<()> {
    let scratch = Scratch::new()?;
    let db = scratch.path("original.db");
    create_users_db(&db, 5)?;
    std::fs::write(scratch.path("schema.json"), "[]")?;

    let config = recover_config(&scratch, "original.db");
    let report = recover::run(&config)?;

    assert_eq!(report.rows_recovered, 0);
    assert!(report.pages_scanned > 0);
    Ok(())
}

#[test]
fn test_recover_rejects_bad_page_size() -> Result<()> {
    let scratch = Scratch::new()?;
    let db = scratch.path("original.db");
    create_users_db(&db, 1)?;
    export_schema(&db, &scratch.path("schema.json"))?;

    let mut config = recover_config(&scratch, "original.db");
    config.page_size = 1000;
    assert!(recover::run(&config).is_err());

    config.page_size = 256;
    assert!(recover::run(&config).is_err());
    Ok(())
}

#[test]
fn test_recover_fails_on_missing_input() -> Result<()> {
    let scratch = Scratch::new()?;
    let db = scratch.path("original.db");
    create_users_db(&db, 1)?;
    export_schema(&db, &scratch.path("schema.json"))?;

    let config = recover_config(&scratch, "never-created.db");
    assert!(recover::run(&config).is_err());
    Ok(())
}
