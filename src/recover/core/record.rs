//! SQLite record decoding.
//!
//! A record is the payload of one leaf-table cell: the column data for a
//! single row. It has two parts:
//!
//! - A header, starting with the header's own total length as a varint
//!   (the length counts that varint's bytes), followed by one serial-type
//!   varint per column.
//! - A body whose bytes are consumed in order, one field per serial type.
//!
//! Serial type codes:
//!
//! - 0: NULL
//! - 1: 8-bit signed int
//! - 2: 16-bit signed int
//! - 3: 24-bit signed int
//! - 4: 32-bit signed int
//! - 5: 48-bit signed int
//! - 6: 64-bit signed int
//! - 7: IEEE 754 64-bit float
//! - 8: integer 0
//! - 9: integer 1
//! - 10, 11: reserved
//! - N >= 12, even: BLOB of (N-12)/2 bytes
//! - N >= 13, odd: text of (N-13)/2 bytes
//!
//! All multi-byte integers are big-endian. The 24-bit and 48-bit widths
//! sign-extend from their most significant byte.

use super::varint::read_varint;
use anyhow::{anyhow, bail, Result};

/// One decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Reads a big-endian signed integer of 1 to 8 bytes, sign-extending
/// from the top byte.
fn read_signed_be(bytes: &[u8]) -> i64 {
    debug_assert!(!bytes.is_empty() && bytes.len() <= 8);

    let fill = if bytes[0] & 0x80 != 0 { 0xff } else { 0x00 };
    let mut buf = [fill; 8];
    buf[8 - bytes.len()..].copy_from_slice(bytes);
    i64::from_be_bytes(buf)
}

fn take(buf: &[u8], n: usize) -> Result<&[u8]> {
    if buf.len() < n {
        bail!("value truncated: need {} bytes, have {}", n, buf.len());
    }
    Ok(&buf[..n])
}

/// Decodes one field from the front of `buf` according to `code`.
///
/// Returns the value and the number of body bytes it consumed.
pub fn parse_serial_type(code: u64, buf: &[u8]) -> Result<(Value, usize)> {
    match code {
        0 => Ok((Value::Null, 0)),
        1 => Ok((Value::Integer(read_signed_be(take(buf, 1)?)), 1)),
        2 => Ok((Value::Integer(read_signed_be(take(buf, 2)?)), 2)),
        3 => Ok((Value::Integer(read_signed_be(take(buf, 3)?)), 3)),
        4 => Ok((Value::Integer(read_signed_be(take(buf, 4)?)), 4)),
        5 => Ok((Value::Integer(read_signed_be(take(buf, 6)?)), 6)),
        6 => Ok((Value::Integer(read_signed_be(take(buf, 8)?)), 8)),
        7 => {
            let bytes: [u8; 8] = take(buf, 8)?.try_into()?;
            Ok((Value::Real(f64::from_be_bytes(bytes)), 8))
        }
        8 => Ok((Value::Integer(0), 0)),
        9 => Ok((Value::Integer(1), 0)),
        10 | 11 => bail!("reserved serial type {}", code),
        code if code % 2 == 0 => {
            let len = ((code - 12) / 2) as usize;
            Ok((Value::Blob(take(buf, len)?.to_vec()), len))
        }
        code => {
            let len = ((code - 13) / 2) as usize;
            let text = String::from_utf8(take(buf, len)?.to_vec())
                .map_err(|e| anyhow!("invalid utf-8 in text field: {}", e))?;
            Ok((Value::Text(text), len))
        }
    }
}

/// Decodes a complete cell payload into its column values.
///
/// The number and types of the values come entirely from the record's own
/// header; the caller matches them against a table afterwards.
pub fn parse_record(payload: &[u8]) -> Result<Vec<Value>> {
    let (header_len, width) =
        read_varint(payload).ok_or_else(|| anyhow!("bad header length varint"))?;
    let header_len = header_len as usize;

    if header_len < width || header_len > payload.len() {
        bail!(
            "header length {} out of range for payload of {} bytes",
            header_len,
            payload.len()
        );
    }

    // Serial types occupy the rest of the header region.
    let mut serial_types = Vec::new();
    let mut pos = width;
    while pos < header_len {
        let (code, n) = read_varint(&payload[pos..header_len])
            .ok_or_else(|| anyhow!("bad serial type varint at header offset {}", pos))?;
        serial_types.push(code);
        pos += n;
    }

    let body = &payload[header_len..];
    let mut values = Vec::with_capacity(serial_types.len());
    let mut body_pos = 0;
    for code in serial_types {
        let (value, n) = parse_serial_type(code, &body[body_pos..])?;
        values.push(value);
        body_pos += n;
    }

    Ok(values)
}
