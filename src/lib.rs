#![deny(unused_must_use)]
#![forbid(unsafe_code)]
// Don't allow dbg! prints in release.
#![cfg_attr(not(debug_assertions), deny(clippy::dbg_macro))]

pub mod checksum;
pub mod discovery;
pub mod err;
pub mod invariants;
pub mod pptt;
pub mod report;
pub mod signature;
pub mod table_header;
pub mod utils;
pub mod validator;

pub use checksum::{ChecksumExemptions, ChecksumStatus};
pub use err::{Error, HeaderError, InvariantError, PpttError, PpttWarning, Result};
pub use invariants::{InvariantReport, LengthStatus, check_invariants};
pub use pptt::{PpttReport, validate_pptt};
pub use signature::SignatureStatus;
pub use table_header::{TABLE_HEADER_SIZE, TableHeader};
pub use validator::{StructureStatus, Summary, TableReport, TableValidator, ValidatorSettings};

/// Decodes the fixed table header at the start of `buffer`.
pub fn parse_header(buffer: &[u8]) -> std::result::Result<TableHeader, HeaderError> {
    TableHeader::from_bytes(buffer)
}
