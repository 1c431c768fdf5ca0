use crate::checksum::ChecksumExemptions;
use crate::discovery::{discover_tables, expected_signature, platform_of};
use crate::err::{self, HeaderError, InvariantError, PpttError, PpttWarning, Result};
use crate::invariants::{InvariantReport, check_invariants};
use crate::pptt::{PPTT_SIGNATURE, PpttReport, validate_pptt};
use crate::table_header::TableHeader;

use log::{debug, info};
use serde::Serialize;

#[cfg(feature = "multithreading")]
use rayon::prelude::*;

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorSettings {
    num_threads: usize,
    checksum_exemptions: ChecksumExemptions,
    structure_validation: bool,
    expected_signature: Option<String>,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        ValidatorSettings {
            num_threads: 0,
            checksum_exemptions: ChecksumExemptions::default(),
            structure_validation: true,
            expected_signature: None,
        }
    }
}

impl ValidatorSettings {
    pub fn new() -> Self {
        ValidatorSettings::default()
    }

    /// Sets the number of worker threads used when validating many files.
    /// `0` will use all available cores.
    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn checksum_exemptions(mut self, exemptions: ChecksumExemptions) -> Self {
        self.checksum_exemptions = exemptions;
        self
    }

    /// When off, only header, length, signature and checksum checks run.
    pub fn structure_validation(mut self, enabled: bool) -> Self {
        self.structure_validation = enabled;
        self
    }

    /// Expect every file to carry `signature` instead of deriving it from the file name.
    pub fn expected_signature(mut self, signature: Option<String>) -> Self {
        self.expected_signature = signature;
        self
    }
}

/// Outcome of the signature-specific deep validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum StructureStatus {
    /// No deep validation exists for this signature (or it was disabled).
    Skipped,
    Pptt(PpttReport),
}

impl StructureStatus {
    pub fn errors(&self) -> &[PpttError] {
        match self {
            StructureStatus::Skipped => &[],
            StructureStatus::Pptt(report) => &report.errors,
        }
    }

    pub fn warnings(&self) -> &[PpttWarning] {
        match self {
            StructureStatus::Skipped => &[],
            StructureStatus::Pptt(report) => &report.warnings,
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            StructureStatus::Skipped => 0,
            StructureStatus::Pptt(report) => report.node_count,
        }
    }
}

/// Everything known about one table buffer after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub expected_signature: Option<String>,
    pub size: usize,
    /// `None` when the buffer could not hold a header, see `header_error`.
    pub header: Option<TableHeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_error: Option<HeaderError>,
    pub invariants: Option<InvariantReport>,
    pub structure: StructureStatus,
}

impl TableReport {
    pub fn passed(&self) -> bool {
        self.header_error.is_none()
            && self.invariants.as_ref().is_some_and(InvariantReport::is_valid)
            && self.structure.errors().is_empty()
    }

    pub fn invariant_failures(&self) -> Vec<InvariantError> {
        self.invariants
            .as_ref()
            .map(InvariantReport::failures)
            .unwrap_or_default()
    }

    pub fn display_name(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "<buffer>".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a TableReport>) -> Self {
        reports
            .into_iter()
            .fold(Summary::default(), |mut summary, report| {
                if report.passed() {
                    summary.passed += 1;
                } else {
                    summary.failed += 1;
                }
                summary
            })
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Process exit code convention of the command line tooling.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() { 0 } else { 1 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableValidator {
    settings: ValidatorSettings,
}

impl TableValidator {
    pub fn new() -> Self {
        TableValidator::default()
    }

    pub fn with_configuration(mut self, settings: ValidatorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Validates an in-memory table. `expected` is the identity the table should carry;
    /// `None` skips the signature check.
    pub fn validate_bytes(&self, data: &[u8], expected: Option<&str>) -> TableReport {
        let mut report = TableReport {
            path: None,
            platform: None,
            expected_signature: expected.map(str::to_string),
            size: data.len(),
            header: None,
            header_error: None,
            invariants: None,
            structure: StructureStatus::Skipped,
        };

        let header = match TableHeader::from_bytes(data) {
            Ok(header) => header,
            Err(e) => {
                debug!("{e}");
                report.header_error = Some(e);
                return report;
            }
        };

        report.invariants = Some(check_invariants(
            data,
            &header,
            expected,
            &self.settings.checksum_exemptions,
        ));

        if self.settings.structure_validation && header.signature == PPTT_SIGNATURE {
            report.structure = StructureStatus::Pptt(validate_pptt(data, &header));
        } else {
            debug!("Structure validation skipped for {} table", header.signature);
        }

        report.header = Some(header);
        report
    }

    /// Reads and validates a table file; the expected identity is derived from its file name.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<TableReport> {
        let path = path.as_ref();
        info!("Validating file: {}", path.display());

        if !path.exists() {
            return Err(err::Error::FileDoesNotExist {
                path: path.to_path_buf(),
            });
        }

        let data = fs::read(path).map_err(|source| err::Error::FailedToRead {
            path: path.to_path_buf(),
            source,
        })?;

        let expected = self
            .settings
            .expected_signature
            .clone()
            .or_else(|| expected_signature(path));
        let mut report = self.validate_bytes(&data, expected.as_deref());
        report.path = Some(path.to_path_buf());
        report.platform = platform_of(path);

        Ok(report)
    }

    /// Validates many files, preserving input order.
    ///
    /// Failing to read one file does not stop the others.
    pub fn validate_paths(&self, paths: &[PathBuf]) -> Vec<Result<TableReport>> {
        #[cfg(feature = "multithreading")]
        {
            if self.settings.num_threads != 1 {
                return self.validate_paths_parallel(paths);
            }
        }

        paths.iter().map(|path| self.validate_path(path)).collect()
    }

    #[cfg(feature = "multithreading")]
    fn validate_paths_parallel(&self, paths: &[PathBuf]) -> Vec<Result<TableReport>> {
        let validate_all = || {
            paths
                .par_iter()
                .map(|path| self.validate_path(path))
                .collect::<Vec<_>>()
        };

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.num_threads)
            .build()
        {
            Ok(pool) => pool.install(validate_all),
            Err(e) => {
                debug!("Failed to build thread pool, validating on the global pool: {e}");
                validate_all()
            }
        }
    }

    /// Discovers and validates every table under `dir`.
    pub fn validate_dir(&self, dir: impl AsRef<Path>) -> Result<Vec<Result<TableReport>>> {
        let tables = discover_tables(dir)?;
        Ok(self.validate_paths(&tables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::fix_checksum;
    use crate::signature::SignatureStatus;
    use pretty_assertions::assert_eq;

    fn table(signature: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut raw = vec![0_u8; 36];
        raw[0..4].copy_from_slice(signature);
        raw.extend_from_slice(body);
        let len = raw.len() as u32;
        raw[4..8].copy_from_slice(&len.to_le_bytes());
        fix_checksum(&mut raw);
        raw
    }

    #[test]
    fn test_too_short_buffer_reports_header_error_only() {
        let report = TableValidator::new().validate_bytes(&[0_u8; 12], Some("PPTT"));

        assert!(!report.passed());
        assert_eq!(
            report.header_error,
            Some(HeaderError::TooShort { len: 12, need: 36 })
        );
        assert_eq!(report.invariants, None);
        assert_eq!(report.structure, StructureStatus::Skipped);
    }

    #[test]
    fn test_pptt_is_walked_and_other_tables_are_not() {
        let mut processor = vec![0_u8; 20];
        processor[1] = 20;
        let validator = TableValidator::new();

        let pptt = validator.validate_bytes(&table(b"PPTT", &processor), Some("PPTT"));
        assert!(pptt.passed());
        assert_eq!(pptt.structure.node_count(), 1);

        let dsdt = validator.validate_bytes(&table(b"DSDT", &processor), Some("DSDT"));
        assert!(dsdt.passed());
        assert_eq!(dsdt.structure, StructureStatus::Skipped);
    }

    #[test]
    fn test_structure_errors_fail_the_table() {
        let validator = TableValidator::new();
        let report = validator.validate_bytes(&table(b"PPTT", &[0x00, 0x01]), None);

        assert!(report.invariants.as_ref().unwrap().is_valid());
        assert!(!report.passed());
        assert_eq!(report.structure.errors().len(), 1);

        let relaxed = TableValidator::new()
            .with_configuration(ValidatorSettings::new().structure_validation(false));
        assert!(relaxed.validate_bytes(&table(b"PPTT", &[0x00, 0x01]), None).passed());
    }

    #[test]
    fn test_cache_warning_does_not_fail_the_table() {
        let mut cache = vec![0_u8; 24];
        cache[0] = 1;
        cache[1] = 24;

        let report = TableValidator::new().validate_bytes(&table(b"PPTT", &cache), Some("PPTT"));
        assert!(report.passed());
        assert_eq!(report.structure.warnings().len(), 1);
        assert_eq!(report.structure.node_count(), 1);
    }

    #[test]
    fn test_equivalent_signature_is_reported_as_such() {
        let report = TableValidator::new().validate_bytes(&table(b"APIC", &[]), Some("MADT"));

        assert!(report.passed());
        assert_eq!(
            report.invariants.unwrap().signature,
            SignatureStatus::Equivalent {
                expected: "MADT".to_string()
            }
        );
    }

    #[test]
    fn test_summary_exit_code() {
        let validator = TableValidator::new();
        let good = validator.validate_bytes(&table(b"DSDT", &[]), Some("DSDT"));
        let bad = validator.validate_bytes(&table(b"DSDT", &[]), Some("SSDT"));

        let all_good = Summary::from_reports([&good, &good]);
        assert_eq!(all_good, Summary { passed: 2, failed: 0 });
        assert_eq!(all_good.exit_code(), 0);

        let mixed = Summary::from_reports([&good, &bad]);
        assert_eq!(mixed, Summary { passed: 1, failed: 1 });
        assert_eq!(mixed.exit_code(), 1);
    }
}
