/// Reads a SQLite variable-length integer from the front of `buf`.
///
/// A varint is 1 to 9 bytes. The first 8 bytes each contribute their low
/// 7 bits, high bit set meaning "continue"; a 9th byte, if reached,
/// contributes all 8 of its bits. Accumulation is big-endian: earlier
/// bytes hold more significant bits.
///
/// Returns the decoded value and the number of bytes consumed, or `None`
/// if `buf` is empty or ends while the continuation bit is still set.
pub fn read_varint(buf: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;

    for (i, &byte) in buf.iter().take(9).enumerate() {
        if i == 8 {
            value = (value << 8) | u64::from(byte);
            return Some((value, 9));
        }
        value = (value << 7) | u64::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }

    None
}
