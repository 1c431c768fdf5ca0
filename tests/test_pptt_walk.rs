
use fixtures::*;

use acpi_validate::{PpttError, TableHeader, TableValidator, validate_pptt};
use pretty_assertions::assert_eq;

/// Deterministic xorshift so failures reproduce.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn byte(&mut self) -> u8 {
        (self.next() & 0xff) as u8
    }
}

fn adversarial_pptt(rng: &mut XorShift) -> Vec<u8> {
    let body_len = (rng.next() % 512) as usize;
    let body: Vec<u8> = (0..body_len)
        .map(|i| match i % 4 {
            // Bias lengths towards the interesting small values.
            1 => rng.byte() % 32,
            _ => rng.byte(),
        })
        .collect();
    table(b"PPTT", &body)
}

#[test]
fn test_walk_terminates_and_stays_in_bounds_on_adversarial_lengths() {
    ensure_env_logger_initialized();
    let mut rng = XorShift(0x9e37_79b9_7f4a_7c15);

    for _ in 0..2000 {
        let raw = adversarial_pptt(&mut rng);
        let header = TableHeader::from_bytes(&raw).unwrap();
        let report = validate_pptt(&raw, &header);

        let body_len = raw.len() - 36;
        assert!(report.node_count * 2 <= body_len);

        let halting: Vec<_> = report
            .errors
            .iter()
            .filter(|e| !matches!(e, PpttError::ProcessorNodeTooShort { .. }))
            .collect();
        assert!(halting.len() <= 1, "walk continued after halting: {halting:?}");

        for e in &report.errors {
            assert!(e.offset() >= 36 && e.offset() < raw.len());
        }
        for w in &report.warnings {
            assert!(w.offset() >= 36 && w.offset() < raw.len());
        }
    }
}

#[test]
fn test_undersized_processor_length_desynchronizes_following_nodes() {
    // The 12 byte processor node really spans 20 bytes; the walk trusts the declared length and
    // lands in the middle of it, reading its padding as the next node's preamble.
    let mut misdeclared = processor_node(20);
    misdeclared[1] = 12;
    misdeclared[12] = 1;
    misdeclared[13] = 8;

    let raw = table(b"PPTT", &[misdeclared, processor_node(20)].concat());
    let report = TableValidator::new().validate_bytes(&raw, Some("PPTT"));

    assert!(!report.passed());
    assert_eq!(
        report.structure.errors(),
        &[PpttError::ProcessorNodeTooShort {
            offset: 36,
            length: 12
        }]
    );
    assert_eq!(report.structure.warnings().len(), 1);
    assert_eq!(report.structure.node_count(), 3);
}

#[test]
fn test_node_after_invalid_length_is_never_counted() {
    let body = [vec![0x00, 0x01], processor_node(20), cache_node(28)].concat();
    let raw = table(b"PPTT", &body);
    let header = TableHeader::from_bytes(&raw).unwrap();

    let report = validate_pptt(&raw, &header);
    assert_eq!(
        report.errors,
        vec![PpttError::InvalidNodeLength {
            offset: 36,
            length: 1
        }]
    );
    assert_eq!(report.node_count, 0);
}

#[test]
fn test_zero_length_node_halts() {
    let body = [processor_node(20), vec![0x01, 0x00, 0x00, 0x00]].concat();
    let raw = table(b"PPTT", &body);
    let header = TableHeader::from_bytes(&raw).unwrap();

    let report = validate_pptt(&raw, &header);
    assert_eq!(
        report.errors,
        vec![PpttError::InvalidNodeLength {
            offset: 56,
            length: 0
        }]
    );
    assert_eq!(report.node_count, 1);
}
