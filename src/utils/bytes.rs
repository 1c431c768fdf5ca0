//! Byte-slice utilities for bounds-oriented parsing.
//!
//! Small helpers to read little-endian primitives out of `&[u8]` at fixed offsets.
//! They return `Option<T>` so callers can map a short read to their own error type;
//! ACPI tables are little-endian throughout.
//!
//! Prefer a single up-front bounds check when parsing fixed-size structs:
//!
//! ```ignore
//! use crate::utils::bytes;
//!
//! let header = bytes::slice(buf, 0, 36)?;
//! let signature = bytes::read_array::<4>(header, 0)?;
//! let length = bytes::read_u32_le(header, 4)?;
//! ```

/// Borrow `len` bytes at `offset`.
///
/// Returns `None` if the range is out of bounds (or overflows).
pub(crate) fn slice(buf: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    let end = offset.checked_add(len)?;
    buf.get(offset..end)
}

/// Read `N` raw bytes at `offset`.
pub(crate) fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Option<[u8; N]> {
    slice(buf, offset, N)?.try_into().ok()
}

/// Read a single byte at `offset`.
pub(crate) fn read_u8(buf: &[u8], offset: usize) -> Option<u8> {
    buf.get(offset).copied()
}

/// Read a `u32` (little-endian) at `offset`.
pub(crate) fn read_u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    Some(u32::from_le_bytes(read_array::<4>(buf, offset)?))
}
