//! Byte-sum checksum of ACPI tables.
//!
//! Every byte of a table, checksum byte included, must add up to zero modulo 256.

use serde::Serialize;

/// Offset of the checksum byte inside the table header.
pub const CHECKSUM_OFFSET: usize = 9;

/// Signatures whose tables do not carry a self-consistent checksum by default.
///
/// The FACS is not a system description table and has no checksum covering its whole body.
pub const DEFAULT_CHECKSUM_EXEMPT_SIGNATURES: &[&str] = &["FACS"];

/// Wrapping sum of every byte in `data`.
pub fn byte_sum(data: &[u8]) -> u8 {
    data.iter().fold(0_u8, |acc, b| acc.wrapping_add(*b))
}

/// The value missing from `data` to make its byte sum zero.
///
/// Zero for a table that already checksums correctly.
pub fn compute_checksum_byte(data: &[u8]) -> u8 {
    0_u8.wrapping_sub(byte_sum(data))
}

/// Rewrites the header checksum byte so the whole of `table` sums to zero.
///
/// Buffers too short to hold the checksum byte are left untouched.
pub fn fix_checksum(table: &mut [u8]) {
    if let Some(current) = table.get(CHECKSUM_OFFSET).copied() {
        let without = byte_sum(table).wrapping_sub(current);
        table[CHECKSUM_OFFSET] = 0_u8.wrapping_sub(without);
    }
}

/// The set of signatures for which a nonzero byte sum is informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumExemptions {
    signatures: Vec<String>,
}

impl Default for ChecksumExemptions {
    fn default() -> Self {
        ChecksumExemptions::new(DEFAULT_CHECKSUM_EXEMPT_SIGNATURES.iter().copied())
    }
}

impl ChecksumExemptions {
    pub fn new<I, S>(signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ChecksumExemptions {
            signatures: signatures.into_iter().map(Into::into).collect(),
        }
    }

    /// No table is exempt.
    pub fn none() -> Self {
        ChecksumExemptions {
            signatures: Vec::new(),
        }
    }

    pub fn with(mut self, signature: impl Into<String>) -> Self {
        let signature = signature.into();
        if !self.is_exempt(&signature) {
            self.signatures.push(signature);
        }
        self
    }

    pub fn is_exempt(&self, signature: &str) -> bool {
        self.signatures.iter().any(|s| s == signature)
    }

    pub fn signatures(&self) -> &[String] {
        &self.signatures
    }
}

/// Outcome of the checksum dimension of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum ChecksumStatus {
    Valid,
    /// Nonzero sum on a table whose signature is exempt.
    Exempt { sum: u8, calculated: u8 },
    Invalid { sum: u8, calculated: u8 },
}

impl ChecksumStatus {
    pub fn evaluate(data: &[u8], signature: &str, exemptions: &ChecksumExemptions) -> Self {
        let sum = byte_sum(data);
        let calculated = compute_checksum_byte(data);

        match (sum, exemptions.is_exempt(signature)) {
            (0, _) => ChecksumStatus::Valid,
            (_, true) => ChecksumStatus::Exempt { sum, calculated },
            (_, false) => ChecksumStatus::Invalid { sum, calculated },
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ChecksumStatus::Invalid { .. })
    }
}
