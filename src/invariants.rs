//! Table-wide invariants: embedded signature, declared length and byte-sum checksum.
//!
//! The three checks are independent; each one is evaluated and reported on its own.

use crate::checksum::{ChecksumExemptions, ChecksumStatus};
use crate::err::InvariantError;
use crate::signature::SignatureStatus;
use crate::table_header::TableHeader;

use log::warn;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum LengthStatus {
    Match,
    Mismatch { declared: u32, actual: usize },
}

impl LengthStatus {
    pub fn evaluate(declared: u32, actual: usize) -> Self {
        if usize::try_from(declared).is_ok_and(|declared| declared == actual) {
            LengthStatus::Match
        } else {
            LengthStatus::Mismatch { declared, actual }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, LengthStatus::Mismatch { .. })
    }
}

/// Per-check outcome for one table buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvariantReport {
    pub signature: SignatureStatus,
    pub length: LengthStatus,
    pub checksum: ChecksumStatus,
    /// The signature embedded in the header, kept so failures can be described.
    #[serde(skip)]
    found_signature: String,
}

impl InvariantReport {
    /// Every failing check, in signature, length, checksum order.
    pub fn failures(&self) -> Vec<InvariantError> {
        let mut failures = Vec::new();

        if let SignatureStatus::Mismatch { expected } = &self.signature {
            failures.push(InvariantError::SignatureMismatch {
                found: self.found_signature.clone(),
                expected: expected.clone(),
            });
        }

        if let LengthStatus::Mismatch { declared, actual } = self.length {
            failures.push(InvariantError::LengthMismatch { declared, actual });
        }

        if let ChecksumStatus::Invalid { sum, calculated } = self.checksum {
            failures.push(InvariantError::ChecksumInvalid { sum, calculated });
        }

        failures
    }

    pub fn is_valid(&self) -> bool {
        !(self.signature.is_failure() || self.length.is_failure() || self.checksum.is_failure())
    }
}

/// Checks `buffer` against the header decoded from it.
///
/// `expected` is the identity the caller believes the table to have (usually derived from the
/// file name); `None` skips the signature check.
pub fn check_invariants(
    buffer: &[u8],
    header: &TableHeader,
    expected: Option<&str>,
    exemptions: &ChecksumExemptions,
) -> InvariantReport {
    let checksum = ChecksumStatus::evaluate(buffer, &header.signature, exemptions);

    if let ChecksumStatus::Exempt { calculated, .. } = checksum {
        warn!(
            "{} table: checksum not required/verified (calculated 0x{:02x})",
            header.signature, calculated
        );
    }

    InvariantReport {
        signature: SignatureStatus::evaluate(&header.signature, expected),
        length: LengthStatus::evaluate(header.length, buffer.len()),
        checksum,
        found_signature: header.signature.clone(),
    }
}
