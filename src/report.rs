//! Human readable rendering of [`TableReport`]s.
//!
//! Validation results are complete; only this layer truncates long finding lists.

use crate::checksum::ChecksumStatus;
use crate::invariants::{InvariantReport, LengthStatus};
use crate::signature::SignatureStatus;
use crate::table_header::TableHeader;
use crate::validator::{StructureStatus, Summary, TableReport};

use std::fmt::{self, Display};

pub const DEFAULT_MAX_LISTED: usize = 5;

const BANNER_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// How many warnings and errors to list before summarizing the remainder.
    pub max_listed: usize,
    /// Print a `Platform: <dir> - <file>` banner above each report.
    pub banner: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            max_listed: DEFAULT_MAX_LISTED,
            banner: false,
        }
    }
}

fn render_list<T: Display>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    noun: &str,
    max_listed: usize,
) -> fmt::Result {
    writeln!(f, "  {} {}(s):", items.len(), noun)?;
    for item in items.iter().take(max_listed) {
        writeln!(f, "    - {item}")?;
    }
    if items.len() > max_listed {
        writeln!(
            f,
            "    ... and {} more {}(s)",
            items.len() - max_listed,
            noun
        )?;
    }
    Ok(())
}

struct ReportView<'a> {
    report: &'a TableReport,
    options: &'a RenderOptions,
}

impl ReportView<'_> {
    fn fmt_banner(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        let file = report
            .path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| report.display_name());

        writeln!(f, "{}", "=".repeat(BANNER_WIDTH))?;
        writeln!(
            f,
            "Platform: {} - {}",
            report.platform.as_deref().unwrap_or("-"),
            file
        )?;
        writeln!(f, "{}", "=".repeat(BANNER_WIDTH))
    }

    fn fmt_checks(
        &self,
        f: &mut fmt::Formatter<'_>,
        header: &TableHeader,
        invariants: &InvariantReport,
    ) -> fmt::Result {
        match &invariants.signature {
            SignatureStatus::Exact => writeln!(
                f,
                "[ OK ] Table signature matches filename: {}",
                header.signature
            )?,
            SignatureStatus::Equivalent { expected } => writeln!(
                f,
                "[ OK ] Table signature '{}' accepted as equivalent to expected '{}'",
                header.signature, expected
            )?,
            SignatureStatus::Unchecked => {
                writeln!(f, "[INFO] No expected signature, signature not checked")?
            }
            SignatureStatus::Mismatch { expected } => writeln!(
                f,
                "[FAIL] Signature MISMATCH: file contains '{}' but filename suggests '{}'",
                header.signature, expected
            )?,
        }

        match invariants.length {
            LengthStatus::Match => {
                writeln!(f, "[ OK ] Table length matches: {} bytes", header.length)?
            }
            LengthStatus::Mismatch { declared, actual } => writeln!(
                f,
                "[FAIL] Table length mismatch: header declares {declared} bytes, actual {actual} bytes"
            )?,
        }

        match invariants.checksum {
            ChecksumStatus::Valid => {
                writeln!(f, "[ OK ] Checksum correct: 0x{:02x}", header.checksum)?
            }
            ChecksumStatus::Exempt { calculated, .. } => writeln!(
                f,
                "[INFO] {} table: checksum not required/verified (calculated 0x{:02x})",
                header.signature, calculated
            )?,
            ChecksumStatus::Invalid { calculated, .. } => writeln!(
                f,
                "[FAIL] Checksum error: calculated 0x{calculated:02x} (should be 0)"
            )?,
        }

        match &self.report.structure {
            StructureStatus::Pptt(pptt) => {
                writeln!(f, "[ OK ] Found {} PPTT node(s)", pptt.node_count)
            }
            StructureStatus::Skipped => writeln!(
                f,
                "[INFO] Structure validation skipped for {} table",
                header.signature
            ),
        }
    }
}

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;

        if self.options.banner {
            self.fmt_banner(f)?;
        }

        writeln!(f, "Validating file: {}", report.display_name())?;

        if let Some(e) = &report.header_error {
            return writeln!(f, "[FAIL] {e}");
        }

        if let Some(header) = &report.header {
            writeln!(f, "{header}")?;
        }

        if let (Some(header), Some(invariants)) = (&report.header, &report.invariants) {
            self.fmt_checks(f, header, invariants)?;
        }

        let warnings = report.structure.warnings();
        if !warnings.is_empty() {
            render_list(f, warnings, "warning", self.options.max_listed)?;
        }

        let errors = report.structure.errors();
        if !errors.is_empty() {
            render_list(f, errors, "error", self.options.max_listed)?;
        }

        match (&report.header, report.passed()) {
            (Some(header), true) => {
                writeln!(f, "[PASS] {} file validation passed", header.signature)
            }
            _ => writeln!(f, "[FAIL] {} validation failed", report.display_name()),
        }
    }
}

pub fn render_report(report: &TableReport, options: &RenderOptions) -> String {
    ReportView { report, options }.to_string()
}

pub fn render_summary(summary: &Summary) -> String {
    format!(
        "Total: {}/{} table(s) passed",
        summary.passed,
        summary.passed + summary.failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::fix_checksum;
    use crate::validator::TableValidator;

    fn pptt_with_bad_nodes(count: usize) -> Vec<u8> {
        let mut raw = vec![0_u8; 36];
        raw[0..4].copy_from_slice(b"PPTT");
        raw[10..16].copy_from_slice(b"QCOM  ");
        raw[16..24].copy_from_slice(b"QCOMEDK2");
        raw[28..32].copy_from_slice(b"INTL");
        for _ in 0..count {
            let mut node = vec![0_u8; 8];
            node[1] = 8;
            raw.extend_from_slice(&node);
        }
        let len = raw.len() as u32;
        raw[4..8].copy_from_slice(&len.to_le_bytes());
        fix_checksum(&mut raw);
        raw
    }

    #[test]
    fn test_long_error_lists_are_truncated() {
        let raw = pptt_with_bad_nodes(7);
        let report = TableValidator::new().validate_bytes(&raw, Some("PPTT"));
        assert_eq!(report.structure.errors().len(), 7);

        let rendered = render_report(&report, &RenderOptions::default());
        let listed = rendered.lines().filter(|l| l.starts_with("    - ")).count();

        assert_eq!(listed, 5);
        assert!(rendered.contains("  7 error(s):\n"));
        assert!(rendered.contains("    ... and 2 more error(s)\n"));
        assert!(rendered.ends_with("[FAIL] <buffer> validation failed\n"));
    }

    #[test]
    fn test_renders_failing_pptt() {
        let raw = pptt_with_bad_nodes(1);
        let report = TableValidator::new().validate_bytes(&raw, Some("PPTT"));
        assert_eq!(raw[9], 0xad);
        let rendered = render_report(&report, &RenderOptions::default());

        insta::assert_snapshot!(rendered, @r"
        Validating file: <buffer>
        ACPI Table Header:
          Signature: PPTT
          Length: 44 bytes
          Revision: 0
          Checksum: 0xad
          OEM ID: QCOM
          OEM Table ID: QCOMEDK2
          OEM Revision: 0x00000000
          Creator ID: INTL
          Creator Revision: 0x00000000
        [ OK ] Table signature matches filename: PPTT
        [ OK ] Table length matches: 44 bytes
        [ OK ] Checksum correct: 0xad
        [ OK ] Found 1 PPTT node(s)
          1 error(s):
            - Offset 0x0024: Processor node too short
        [FAIL] <buffer> validation failed
        ");
    }

    #[test]
    fn test_too_short_is_reported() {
        let report = TableValidator::new().validate_bytes(b"PPTT", None);
        let rendered = render_report(&report, &RenderOptions::default());
        assert_eq!(
            rendered,
            "Validating file: <buffer>\n[FAIL] File too short (4 bytes < 36 bytes)\n"
        );
    }

    #[test]
    fn test_banner_names_platform_and_file() {
        let mut report = TableValidator::new().validate_bytes(&pptt_with_bad_nodes(0), Some("PPTT"));
        report.path = Some(std::path::PathBuf::from("build/sm8150/PPTT.aml"));
        report.platform = Some("sm8150".to_string());

        let options = RenderOptions {
            banner: true,
            ..RenderOptions::default()
        };
        let rendered = render_report(&report, &options);
        let rule = "=".repeat(BANNER_WIDTH);

        assert!(rendered.starts_with(&format!(
            "{rule}\nPlatform: sm8150 - PPTT.aml\n{rule}\nValidating file: build/sm8150/PPTT.aml\n"
        )));
        assert!(rendered.ends_with("[PASS] PPTT file validation passed\n"));
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(
            render_summary(&Summary {
                passed: 3,
                failed: 1
            }),
            "Total: 3/4 table(s) passed"
        );
    }
}
