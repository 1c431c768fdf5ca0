use serde::Serialize;
use thiserror::Error;

use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;
pub type HeaderResult<T> = std::result::Result<T, HeaderError>;

/// Errors that stop a table from being inspected at all.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read table file `{}`: {source}", path.display())]
    FailedToRead { path: PathBuf, source: io::Error },

    #[error("Failed to list directory `{}`: {source}", path.display())]
    FailedToListDirectory { path: PathBuf, source: io::Error },

    #[error("No AML files found in: {}", path.display())]
    NoTablesFound { path: PathBuf },

    #[error("File does not exist: {}", path.display())]
    FileDoesNotExist { path: PathBuf },
}

/// Decode failures of the fixed 36 byte table header.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum HeaderError {
    #[error("File too short ({len} bytes < {need} bytes)")]
    TooShort { len: usize, need: usize },
}

/// One failed table-wide invariant (signature, length or checksum).
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum InvariantError {
    #[error("Signature MISMATCH: file contains '{found}' but filename suggests '{expected}'")]
    SignatureMismatch { found: String, expected: String },

    #[error("Table length mismatch: header declares {declared} bytes, actual {actual} bytes")]
    LengthMismatch { declared: u32, actual: usize },

    #[error("Checksum error: calculated 0x{calculated:02x} (should be 0)")]
    ChecksumInvalid { sum: u8, calculated: u8 },
}

/// Structural defects found while walking the PPTT node list.
///
/// `UnexpectedEndOfData`, `InvalidNodeLength` and `NodeExceedsBoundary` halt the walk,
/// `ProcessorNodeTooShort` is recorded and the walk continues.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum PpttError {
    #[error("Offset 0x{offset:04x}: Unexpected end of data")]
    UnexpectedEndOfData { offset: usize },

    #[error("Offset 0x{offset:04x}: Invalid node length {length}")]
    InvalidNodeLength { offset: usize, length: u8 },

    #[error("Offset 0x{offset:04x}: Node exceeds table boundary")]
    NodeExceedsBoundary { offset: usize, length: u8 },

    #[error("Offset 0x{offset:04x}: Processor node too short")]
    ProcessorNodeTooShort { offset: usize, length: u8 },
}

impl PpttError {
    pub fn offset(&self) -> usize {
        match *self {
            PpttError::UnexpectedEndOfData { offset }
            | PpttError::InvalidNodeLength { offset, .. }
            | PpttError::NodeExceedsBoundary { offset, .. }
            | PpttError::ProcessorNodeTooShort { offset, .. } => offset,
        }
    }
}

/// Informational findings from the PPTT walk, these never fail a table.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum PpttWarning {
    #[error("Offset 0x{offset:04x}: Cache node length abnormal ({length} != {expected})")]
    CacheNodeLengthAbnormal {
        offset: usize,
        length: u8,
        expected: u8,
    },

    #[error("Offset 0x{offset:04x}: Unknown node type {node_type}")]
    UnknownNodeType { offset: usize, node_type: u8 },
}

impl PpttWarning {
    pub fn offset(&self) -> usize {
        match *self {
            PpttWarning::CacheNodeLengthAbnormal { offset, .. }
            | PpttWarning::UnknownNodeType { offset, .. } => offset,
        }
    }
}
