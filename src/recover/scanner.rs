//! Page scanner and row dispatch.
//!
//! The scanner treats the file as a bare sequence of fixed-size pages and
//! never follows B-tree structure: each page is classified and decoded in
//! isolation. Corruption is the expected operating condition, so the
//! decode path is built from layered skips rather than errors: a cell
//! that fails to decode is dropped silently, a page that cannot be
//! processed is logged and skipped, and only a broken sink ends the run.

use anyhow::Result;
use tracing::debug;

use super::core::page::{cell_pointer, LeafPageHeader, DB_HEADER_LEN, LEAF_TABLE_PAGE};
use super::core::record::{parse_record, Value};
use super::core::varint::read_varint;
use super::schema::TableInfo;
use super::sink::RowSink;

/// Scans one page for leaf-table cells and dispatches every decodable row
/// to the sink. Returns the number of rows placed.
pub fn process_page(
    page: &[u8],
    page_index: usize,
    tables: &[TableInfo],
    sink: &mut dyn RowSink,
) -> Result<usize> {
    // Page 1 carries the database file header before its B-tree header.
    let header_offset = if page_index == 0 { DB_HEADER_LEN } else { 0 };
    if header_offset >= page.len() {
        debug!(page = page_index, "page smaller than its header, skipping");
        return Ok(0);
    }

    if page[header_offset] != LEAF_TABLE_PAGE {
        // Interior nodes, index pages, overflow pages, freelist pages, and
        // plain garbage all land here.
        return Ok(0);
    }

    let header = match LeafPageHeader::parse(&page[header_offset..]) {
        Ok(header) => header,
        Err(e) => {
            debug!(page = page_index, error = %e, "unreadable page header, skipping");
            return Ok(0);
        }
    };
    debug!(page = page_index, ?header, "scanning leaf page");

    let mut placed = 0;
    for i in 0..header.cell_count as usize {
        let Some(cell_offset) = cell_pointer(page, header_offset, i) else {
            debug!(
                page = page_index,
                cell = i,
                "cell pointer array runs past page end"
            );
            break;
        };
        if cell_offset >= page.len() {
            continue;
        }

        let cell = &page[cell_offset..];
        let Some((payload_size, n1)) = read_varint(cell) else {
            continue;
        };
        let Some((rowid, n2)) = read_varint(&cell[n1..]) else {
            continue;
        };

        // A payload that does not fit after the two varints spills onto
        // overflow pages, which the scanner does not follow.
        let used = n1 + n2;
        if payload_size > (cell.len() - used) as u64 {
            continue;
        }

        let payload = &cell[used..used + payload_size as usize];
        let Ok(values) = parse_record(payload) else {
            continue;
        };

        if try_recover_row(rowid as i64, values, tables, sink)? {
            placed += 1;
        }
    }

    Ok(placed)
}

/// Offers a decoded row to each table of matching column count, in schema
/// order, stopping at the first sink that accepts it.
///
/// Columns declared INTEGER PRIMARY KEY are rowid aliases: the record
/// stores NULL for them and the rowid substitutes.
pub fn try_recover_row(
    rowid: i64,
    values: Vec<Value>,
    tables: &[TableInfo],
    sink: &mut dyn RowSink,
) -> Result<bool> {
    for table in tables {
        if table.columns.len() != values.len() {
            continue;
        }

        let mut insert_values = values.clone();
        for (value, column) in insert_values.iter_mut().zip(&table.columns) {
            if column.is_rowid_alias() && value.is_null() {
                *value = Value::Integer(rowid);
            }
        }

        if sink.insert(&table.name, &insert_values)? {
            return Ok(true);
        }
    }

    Ok(false)
}
