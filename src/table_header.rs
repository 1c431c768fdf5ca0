use crate::err::{HeaderError, HeaderResult};
use crate::utils::bytes;

use byteorder::{ByteOrder, LittleEndian};
use encoding::all::ASCII;
use encoding::{DecoderTrap, Encoding};
use serde::Serialize;

use std::fmt;

/// Size of the header shared by every ACPI system description table.
pub const TABLE_HEADER_SIZE: usize = 36;

/// The fixed 36 byte preamble of an ACPI table.
///
/// ASCII fields are decoded permissively: bytes outside of ASCII are dropped rather than
/// failing the decode, so a header only ever fails to parse when the buffer is too short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableHeader {
    /// Trailing NUL padding is trimmed.
    pub signature: String,
    /// Total length of the table, header included.
    pub length: u32,
    pub revision: u8,
    pub checksum: u8,
    /// Trailing whitespace is trimmed.
    pub oem_id: String,
    /// Trailing whitespace is trimmed.
    pub oem_table_id: String,
    pub oem_revision: u32,
    /// Trailing NUL padding is trimmed.
    pub creator_id: String,
    pub creator_revision: u32,
}

fn decode_ascii(raw: &[u8]) -> String {
    // `DecoderTrap::Ignore` cannot fail.
    ASCII
        .decode(raw, DecoderTrap::Ignore)
        .unwrap_or_default()
}

fn trimmed(mut value: String, pad: char) -> String {
    let len = value.trim_end_matches(pad).len();
    value.truncate(len);
    value
}

impl TableHeader {
    /// Decodes the header from the start of `data`.
    pub fn from_bytes(data: &[u8]) -> HeaderResult<TableHeader> {
        let too_short = || HeaderError::TooShort {
            len: data.len(),
            need: TABLE_HEADER_SIZE,
        };

        let header = bytes::slice(data, 0, TABLE_HEADER_SIZE).ok_or_else(too_short)?;

        let field =
            |offset: usize, len: usize| bytes::slice(header, offset, len).ok_or_else(too_short);
        let u32_at = |offset: usize| bytes::read_u32_le(header, offset).ok_or_else(too_short);
        let u8_at = |offset: usize| bytes::read_u8(header, offset).ok_or_else(too_short);

        Ok(TableHeader {
            signature: trimmed(decode_ascii(field(0, 4)?), '\0'),
            length: u32_at(4)?,
            revision: u8_at(8)?,
            checksum: u8_at(9)?,
            oem_id: decode_ascii(field(10, 6)?).trim_end().to_string(),
            oem_table_id: decode_ascii(field(16, 8)?).trim_end().to_string(),
            oem_revision: u32_at(24)?,
            creator_id: trimmed(decode_ascii(field(28, 4)?), '\0'),
            creator_revision: u32_at(32)?,
        })
    }

    /// Re-encodes the header into its 36 byte wire form.
    ///
    /// OEM identifiers are padded with spaces, the signature and creator id with NUL.
    /// Strings longer than their field are truncated.
    pub fn to_bytes(&self) -> [u8; TABLE_HEADER_SIZE] {
        let mut raw = [0_u8; TABLE_HEADER_SIZE];

        put_padded(&mut raw[0..4], &self.signature, 0);
        LittleEndian::write_u32(&mut raw[4..8], self.length);
        raw[8] = self.revision;
        raw[9] = self.checksum;
        put_padded(&mut raw[10..16], &self.oem_id, b' ');
        put_padded(&mut raw[16..24], &self.oem_table_id, b' ');
        LittleEndian::write_u32(&mut raw[24..28], self.oem_revision);
        put_padded(&mut raw[28..32], &self.creator_id, 0);
        LittleEndian::write_u32(&mut raw[32..36], self.creator_revision);

        raw
    }
}

fn put_padded(field: &mut [u8], value: &str, pad: u8) {
    let raw = value.as_bytes();
    let take = raw.len().min(field.len());
    field[..take].copy_from_slice(&raw[..take]);
    field[take..].fill(pad);
}

impl fmt::Display for TableHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ACPI Table Header:")?;
        writeln!(f, "  Signature: {}", self.signature)?;
        writeln!(f, "  Length: {} bytes", self.length)?;
        writeln!(f, "  Revision: {}", self.revision)?;
        writeln!(f, "  Checksum: 0x{:02x}", self.checksum)?;
        writeln!(f, "  OEM ID: {}", self.oem_id)?;
        writeln!(f, "  OEM Table ID: {}", self.oem_table_id)?;
        writeln!(f, "  OEM Revision: 0x{:08x}", self.oem_revision)?;
        writeln!(f, "  Creator ID: {}", self.creator_id)?;
        write!(f, "  Creator Revision: 0x{:08x}", self.creator_revision)
    }
}
