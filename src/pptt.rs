//! Structural validation of the Processor Properties Topology Table.
//!
//! The PPTT body is a packed list of variable length nodes, each starting with a
//! `(type: u8, length: u8)` pair. The walk is a small state machine:
//!
//! ```text
//! Scanning --(2 bytes available)--> NodeRead --(length sane, in bounds)--> NodeAccepted --> Scanning
//!     |                                 |
//!     +--(1 byte left)--> Halted <------+--(length < 2 | past end)
//! ```
//!
//! Conditions that make the next node offset unknowable halt the walk. A malformed node of a
//! known type is recorded as an error and the walk continues with the declared length, so a
//! single pass reports every bad node.

use crate::err::{PpttError, PpttWarning};
use crate::table_header::{TABLE_HEADER_SIZE, TableHeader};
use crate::utils::bytes;

use log::{debug, trace};
use serde::Serialize;

pub const PPTT_SIGNATURE: &str = "PPTT";

/// Smallest possible node: just its type and length bytes.
pub const NODE_PREAMBLE_SIZE: u8 = 2;

/// Length rule applied to a node of a known type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthRule {
    /// Shorter nodes are errors.
    AtLeast(u8),
    /// Any other length is a warning.
    Exactly(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeKind {
    pub node_type: u8,
    pub name: &'static str,
    pub rule: LengthRule,
}

/// Known PPTT node types. Types not listed here are accepted with a warning.
pub static NODE_KINDS: &[NodeKind] = &[
    NodeKind {
        node_type: 0,
        name: "Processor Hierarchy Node",
        rule: LengthRule::AtLeast(20),
    },
    NodeKind {
        node_type: 1,
        name: "Cache Type Structure",
        rule: LengthRule::Exactly(28),
    },
];

pub fn node_kind(node_type: u8) -> Option<&'static NodeKind> {
    NODE_KINDS.iter().find(|kind| kind.node_type == node_type)
}

/// Result of a PPTT walk. The lists are complete; truncating them is left to presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PpttReport {
    pub errors: Vec<PpttError>,
    pub warnings: Vec<PpttWarning>,
    pub node_count: usize,
}

impl PpttReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkState {
    Scanning {
        offset: usize,
    },
    NodeRead {
        offset: usize,
        node_type: u8,
        length: u8,
    },
    NodeAccepted {
        offset: usize,
        length: u8,
    },
    Halted,
    Exhausted,
}

/// Finding for a node whose preamble is physically readable.
enum Classification {
    Clean,
    Error(PpttError),
    Warning(PpttWarning),
}

fn classify(offset: usize, node_type: u8, length: u8) -> Classification {
    match node_kind(node_type).map(|kind| kind.rule) {
        Some(LengthRule::AtLeast(min)) if length < min => {
            Classification::Error(PpttError::ProcessorNodeTooShort { offset, length })
        }
        Some(LengthRule::Exactly(expected)) if length != expected => {
            Classification::Warning(PpttWarning::CacheNodeLengthAbnormal {
                offset,
                length,
                expected,
            })
        }
        Some(_) => Classification::Clean,
        None => Classification::Warning(PpttWarning::UnknownNodeType { offset, node_type }),
    }
}

/// The single decision point between halting and continuing: a node whose declared length
/// cannot be trusted to locate its successor halts the walk.
fn physical_defect(offset: usize, length: u8, buffer_len: usize) -> Option<PpttError> {
    if length < NODE_PREAMBLE_SIZE {
        Some(PpttError::InvalidNodeLength { offset, length })
    } else if offset + usize::from(length) > buffer_len {
        Some(PpttError::NodeExceedsBoundary { offset, length })
    } else {
        None
    }
}

impl WalkState {
    fn step(self, buffer: &[u8], report: &mut PpttReport) -> WalkState {
        match self {
            WalkState::Scanning { offset } if offset >= buffer.len() => WalkState::Exhausted,
            WalkState::Scanning { offset } => {
                match bytes::read_array::<2>(buffer, offset) {
                    Some([node_type, length]) => WalkState::NodeRead {
                        offset,
                        node_type,
                        length,
                    },
                    None => {
                        report
                            .errors
                            .push(PpttError::UnexpectedEndOfData { offset });
                        WalkState::Halted
                    }
                }
            }
            WalkState::NodeRead {
                offset,
                node_type,
                length,
            } => {
                trace!("Offset 0x{offset:04x}: node type {node_type}, length {length}");

                if let Some(err) = physical_defect(offset, length, buffer.len()) {
                    report.errors.push(err);
                    return WalkState::Halted;
                }

                match classify(offset, node_type, length) {
                    Classification::Clean => {}
                    Classification::Error(err) => report.errors.push(err),
                    Classification::Warning(warning) => report.warnings.push(warning),
                }

                WalkState::NodeAccepted { offset, length }
            }
            WalkState::NodeAccepted { offset, length } => {
                report.node_count += 1;
                WalkState::Scanning {
                    offset: offset + usize::from(length),
                }
            }
            WalkState::Halted | WalkState::Exhausted => self,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, WalkState::Halted | WalkState::Exhausted)
    }
}

/// Walks the PPTT node list following the header.
///
/// # Panics
///
/// If `buffer` is shorter than a table header. Callers must have decoded `header` from it.
pub fn validate_pptt(buffer: &[u8], header: &TableHeader) -> PpttReport {
    assert!(
        buffer.len() >= TABLE_HEADER_SIZE,
        "PPTT walk requires a buffer holding a full table header ({} < {})",
        buffer.len(),
        TABLE_HEADER_SIZE
    );

    let mut report = PpttReport::default();
    let mut state = WalkState::Scanning {
        offset: TABLE_HEADER_SIZE,
    };

    while !state.is_terminal() {
        state = state.step(buffer, &mut report);
    }

    debug!(
        "{} ({}): {} node(s), {} error(s), {} warning(s), walk {:?}",
        header.signature,
        header.oem_table_id,
        report.node_count,
        report.errors.len(),
        report.warnings.len(),
        state
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pptt(nodes: &[&[u8]]) -> Vec<u8> {
        let mut raw = vec![0_u8; TABLE_HEADER_SIZE];
        raw[0..4].copy_from_slice(b"PPTT");
        for node in nodes {
            raw.extend_from_slice(node);
        }
        let len = raw.len() as u32;
        raw[4..8].copy_from_slice(&len.to_le_bytes());
        raw
    }

    fn node(node_type: u8, length: u8) -> Vec<u8> {
        let mut raw = vec![0_u8; usize::from(length).max(2)];
        raw[0] = node_type;
        raw[1] = length;
        raw
    }

    fn walk(raw: &[u8]) -> PpttReport {
        let header = TableHeader::from_bytes(raw).unwrap();
        validate_pptt(raw, &header)
    }

    #[test]
    fn test_single_processor_node_is_clean() {
        let raw = pptt(&[&node(0, 20)]);
        assert_eq!(
            walk(&raw),
            PpttReport {
                errors: vec![],
                warnings: vec![],
                node_count: 1
            }
        );
    }

    #[test]
    fn test_empty_body_has_no_nodes() {
        let raw = pptt(&[]);
        assert_eq!(walk(&raw), PpttReport::default());
    }

    #[test]
    fn test_trailing_byte_is_unexpected_end_of_data() {
        let raw = pptt(&[&node(0, 20), &node(1, 28), &[0x00]]);
        let report = walk(&raw);

        assert_eq!(
            report.errors,
            vec![PpttError::UnexpectedEndOfData { offset: 36 + 48 }]
        );
        assert_eq!(report.node_count, 2);
    }

    #[test]
    fn test_length_one_halts_walk() {
        let raw = pptt(&[&node(0, 20), &[0x00, 0x01], &node(0, 20), &node(1, 28)]);
        let report = walk(&raw);

        assert_eq!(
            report.errors,
            vec![PpttError::InvalidNodeLength {
                offset: 56,
                length: 1
            }]
        );
        assert_eq!(report.node_count, 1);
    }

    #[test]
    fn test_node_past_end_halts_walk() {
        let mut raw = pptt(&[&node(0, 20)]);
        raw.extend_from_slice(&[0x00, 0x30, 0x00]);

        let report = walk(&raw);
        assert_eq!(
            report.errors,
            vec![PpttError::NodeExceedsBoundary {
                offset: 56,
                length: 0x30
            }]
        );
        assert_eq!(report.node_count, 1);
    }

    #[test]
    fn test_short_processor_nodes_are_all_reported() {
        let raw = pptt(&[&node(0, 12), &node(0, 20), &node(0, 8)]);
        let report = walk(&raw);

        assert_eq!(
            report.errors,
            vec![
                PpttError::ProcessorNodeTooShort {
                    offset: 36,
                    length: 12
                },
                PpttError::ProcessorNodeTooShort {
                    offset: 68,
                    length: 8
                },
            ]
        );
        assert_eq!(report.node_count, 3);
        assert!(!report.is_valid());
    }

    #[test]
    fn test_abnormal_cache_node_is_only_a_warning() {
        let raw = pptt(&[&node(0, 20), &node(1, 24)]);
        let report = walk(&raw);

        assert!(report.is_valid());
        assert_eq!(
            report.warnings,
            vec![PpttWarning::CacheNodeLengthAbnormal {
                offset: 56,
                length: 24,
                expected: 28
            }]
        );
        assert_eq!(report.node_count, 2);
    }

    #[test]
    fn test_unknown_node_types_are_accepted() {
        let raw = pptt(&[&node(2, 30), &node(0xff, 4)]);
        let report = walk(&raw);

        assert!(report.is_valid());
        assert_eq!(
            report.warnings,
            vec![
                PpttWarning::UnknownNodeType {
                    offset: 36,
                    node_type: 2
                },
                PpttWarning::UnknownNodeType {
                    offset: 66,
                    node_type: 0xff
                },
            ]
        );
        assert_eq!(report.node_count, 2);
    }

    #[test]
    fn test_walk_does_not_trust_declared_table_length() {
        let mut raw = pptt(&[&node(0, 20)]);
        raw[4..8].copy_from_slice(&0xffff_u32.to_le_bytes());

        assert_eq!(walk(&raw).node_count, 1);
    }

    #[test]
    #[should_panic(expected = "PPTT walk requires a buffer holding a full table header")]
    fn test_short_buffer_is_a_contract_violation() {
        let raw = pptt(&[]);
        let header = TableHeader::from_bytes(&raw).unwrap();
        validate_pptt(&raw[..10], &header);
    }

    #[test]
    fn test_node_kinds_table() {
        assert_eq!(node_kind(0).map(|k| k.name), Some("Processor Hierarchy Node"));
        assert_eq!(node_kind(1).map(|k| k.rule), Some(LengthRule::Exactly(28)));
        assert_eq!(node_kind(2), None);
    }
}
