//! Leaf-table page structure.
//!
//! Every page in a database file starts with a B-tree page header, except
//! that page 1 carries the 100-byte database header first, so its B-tree
//! header begins at offset 100.
//!
//! ## B-tree page header format (leaf)
//!
//! - Byte 0: page type (0x0D for a leaf table page)
//! - Bytes 1-2: first freeblock offset
//! - Bytes 3-4: number of cells
//! - Bytes 5-6: cell content area start
//! - Byte 7: fragmented free bytes
//!
//! The cell pointer array follows immediately: one big-endian u16 per
//! cell, each an offset from the start of the page.

use anyhow::{bail, Result};

/// Page type byte identifying a leaf table page.
pub const LEAF_TABLE_PAGE: u8 = 0x0d;

/// Size of the B-tree page header on a leaf page.
pub const PAGE_HEADER_LEN: usize = 8;

/// Size of the database file header at the start of page 1.
pub const DB_HEADER_LEN: usize = 100;

/// Parsed B-tree page header of a leaf table page.
#[derive(Debug)]
pub struct LeafPageHeader {
    /// Offset to the first freeblock
    pub first_freeblock: u16,
    /// Number of cells on the page
    pub cell_count: u16,
    /// Offset where the cell content area begins
    pub content_start: u16,
    /// Number of fragmented free bytes
    pub fragmented_free_bytes: u8,
}

impl LeafPageHeader {
    /// Parses the header at the start of `data`. `data[0]` must already
    /// have been checked to be [`LEAF_TABLE_PAGE`].
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < PAGE_HEADER_LEN {
            bail!("page header too short: {} bytes", data.len());
        }

        Ok(Self {
            first_freeblock: u16::from_be_bytes([data[1], data[2]]),
            cell_count: u16::from_be_bytes([data[3], data[4]]),
            content_start: u16::from_be_bytes([data[5], data[6]]),
            fragmented_free_bytes: data[7],
        })
    }
}

/// Reads the `i`-th entry of the cell pointer array, or `None` if the
/// entry lies outside the page.
pub fn cell_pointer(page: &[u8], header_offset: usize, i: usize) -> Option<usize> {
    let ptr_offset = header_offset + PAGE_HEADER_LEN + 2 * i;
    if ptr_offset + 2 > page.len() {
        return None;
    }
    Some(u16::from_be_bytes([page[ptr_offset], page[ptr_offset + 1]]) as usize)
}
