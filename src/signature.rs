use serde::Serialize;

/// Table identities that are accepted in place of one another.
///
/// The MADT is conventionally named "MADT" but its binary signature is "APIC".
/// This list is closed: nothing outside of it is treated as equivalent.
pub static SIGNATURE_EQUIVALENCES: &[(&str, &[&str])] = &[("MADT", &["APIC"]), ("APIC", &["MADT"])];

/// Signatures accepted as stand-ins for `expected`, not including `expected` itself.
pub fn equivalents_of(expected: &str) -> &'static [&'static str] {
    SIGNATURE_EQUIVALENCES
        .iter()
        .find(|(identity, _)| *identity == expected)
        .map(|(_, alternates)| *alternates)
        .unwrap_or(&[])
}

/// Outcome of comparing an embedded signature against an expected identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum SignatureStatus {
    Exact,
    /// Accepted through [`SIGNATURE_EQUIVALENCES`].
    Equivalent { expected: String },
    /// No expected identity was available.
    Unchecked,
    Mismatch { expected: String },
}

impl SignatureStatus {
    pub fn evaluate(found: &str, expected: Option<&str>) -> Self {
        let Some(expected) = expected else {
            return SignatureStatus::Unchecked;
        };

        if found == expected {
            SignatureStatus::Exact
        } else if equivalents_of(expected).contains(&found) {
            SignatureStatus::Equivalent {
                expected: expected.to_string(),
            }
        } else {
            SignatureStatus::Mismatch {
                expected: expected.to_string(),
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SignatureStatus::Mismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_madt_and_apic_are_symmetric() {
        assert_eq!(
            SignatureStatus::evaluate("APIC", Some("MADT")),
            SignatureStatus::Equivalent {
                expected: "MADT".to_string()
            }
        );
        assert_eq!(
            SignatureStatus::evaluate("MADT", Some("APIC")),
            SignatureStatus::Equivalent {
                expected: "APIC".to_string()
            }
        );
    }

    #[test]
    fn test_equivalence_set_is_closed() {
        assert_eq!(equivalents_of("DSDT"), &[] as &[&str]);
        assert!(SignatureStatus::evaluate("SSDT", Some("DSDT")).is_failure());
        assert!(SignatureStatus::evaluate("FACP", Some("APIC")).is_failure());
    }

    #[test]
    fn test_exact_and_unchecked() {
        assert_eq!(
            SignatureStatus::evaluate("PPTT", Some("PPTT")),
            SignatureStatus::Exact
        );
        assert_eq!(
            SignatureStatus::evaluate("PPTT", None),
            SignatureStatus::Unchecked
        );
    }
}
