use anyhow::{Context, Result, bail, format_err};
use clap::{Arg, ArgAction, ArgMatches, Command};
use dialoguer::Confirm;
use indoc::indoc;
use log::{Level, LevelFilter, debug};

use acpi_validate::checksum::ChecksumExemptions;
use acpi_validate::report::{RenderOptions, render_report, render_summary};
use acpi_validate::{Summary, TableReport, TableValidator, ValidatorSettings};

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

#[path = "acpi_validate/hexdump.rs"]
mod hexdump;

#[derive(Copy, Clone, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
    JsonL,
}

struct ValidateCommand {
    validator: TableValidator,
    inputs: Vec<PathBuf>,
    output_format: ReportFormat,
    render_options: RenderOptions,
}

/// Parses decimal or `0x` prefixed hexadecimal integers.
pub(crate) fn parse_int(value: &str) -> Result<u64, String> {
    let value = value.trim();
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse::<u64>(),
    };
    parsed.map_err(|_| format!("Invalid integer: {value}"))
}

/// If `prompt` is passed, will display a confirmation prompt before overwriting files.
pub(crate) fn create_output_file(path: impl AsRef<Path>, prompt: bool) -> Result<File> {
    let p = path.as_ref();

    if p.is_dir() {
        bail!(
            "There is a directory at {}, refusing to overwrite",
            p.display()
        );
    }

    if p.exists() && prompt {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Are you sure you want to override output file at {}",
                p.display()
            ))
            .default(false)
            .interact()
            .context("Failed to write confirmation prompt to term")?;

        if !confirmed {
            bail!("Cancelled");
        }
    }

    if let Some(parent) = p.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    File::create(p).with_context(|| format!("Failed to create output file `{}`", p.display()))
}

impl ValidateCommand {
    fn from_cli_matches(matches: &ArgMatches) -> Result<Self> {
        let mut inputs: Vec<PathBuf> = matches
            .get_many::<String>("INPUT")
            .map(|values| values.map(PathBuf::from).collect())
            .unwrap_or_default();

        if let Some(patterns) = matches.get_many::<String>("glob") {
            for pattern in patterns {
                let paths = glob::glob(pattern)
                    .map_err(|e| format_err!("Invalid glob pattern `{pattern}`: {e}"))?;
                for path in paths {
                    inputs.push(path.context("Failed to read glob match")?);
                }
            }
        }

        if inputs.is_empty() {
            bail!("Usage: acpi_validate validate <AML file or directory>...");
        }

        let output_format = match matches
            .get_one::<String>("output-format")
            .map(String::as_str)
        {
            Some("json") => ReportFormat::Json,
            Some("jsonl") => ReportFormat::JsonL,
            _ => ReportFormat::Text,
        };

        let mut exemptions = ChecksumExemptions::default();
        if let Some(extra) = matches.get_many::<String>("exempt") {
            for signature in extra {
                exemptions = exemptions.with(signature.to_uppercase());
            }
        }

        let num_threads = *matches.get_one::<usize>("num-threads").expect("has default");
        let num_threads = match (cfg!(feature = "multithreading"), num_threads) {
            (true, number) => number,
            (false, 0 | 1) => 1,
            (false, _) => {
                eprintln!(
                    "turned on threads, but library was compiled without `multithreading` feature! using fallback sync iterator"
                );
                1
            }
        };

        let settings = ValidatorSettings::new()
            .num_threads(num_threads)
            .checksum_exemptions(exemptions)
            .structure_validation(!matches.get_flag("no-structure"))
            .expected_signature(matches.get_one::<String>("expect").map(|s| s.to_uppercase()));

        Ok(ValidateCommand {
            validator: TableValidator::new().with_configuration(settings),
            inputs,
            output_format,
            render_options: RenderOptions {
                max_listed: *matches.get_one::<usize>("max-listed").expect("has default"),
                banner: false,
            },
        })
    }

    /// Validates every input and returns the aggregated outcome.
    fn run(&self) -> Result<Summary> {
        let mut reports: Vec<TableReport> = Vec::new();
        let mut unreadable = 0;

        for input in &self.inputs {
            let scanned_dir = input.is_dir();
            let results = if scanned_dir {
                self.validator.validate_dir(input)?
            } else {
                vec![self.validator.validate_path(input)]
            };

            for result in results {
                match result {
                    Ok(report) => {
                        self.emit(&report, scanned_dir)?;
                        reports.push(report);
                    }
                    Err(e) => {
                        eprintln!("{e}");
                        unreadable += 1;
                    }
                }
            }
        }

        let mut summary = Summary::from_reports(&reports);
        summary.failed += unreadable;

        if self.output_format == ReportFormat::Text {
            println!("{}", render_summary(&summary));
        }

        Ok(summary)
    }

    fn emit(&self, report: &TableReport, banner: bool) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        match self.output_format {
            ReportFormat::Text => {
                let options = RenderOptions {
                    banner,
                    ..self.render_options.clone()
                };
                writeln!(out, "{}", render_report(report, &options))?;
            }
            ReportFormat::Json => {
                writeln!(out, "{}", serde_json::to_string_pretty(report)?)?;
            }
            ReportFormat::JsonL => {
                writeln!(out, "{}", serde_json::to_string(report)?)?;
            }
        }

        debug!("{}: passed = {}", report.display_name(), report.passed());
        Ok(())
    }
}

fn validate_command() -> Command {
    Command::new("validate")
        .about("Validate ACPI table binaries (.aml)")
        .long_about(indoc!(r#"
            Validate ACPI table binaries.

            Every table is checked for:
              - a complete 36 byte header,
              - an embedded signature matching the file name (MADT and APIC are interchangeable),
              - a declared length equal to the file size,
              - a zero byte-sum checksum (FACS is exempt).
            PPTT tables additionally have their processor/cache node list walked.

            Directories are scanned for `*.aml` files, directly and one level down
            (`<dir>/<platform>/<TABLE>.aml`). The exit code is 0 only if every table passes.
        "#))
        .arg(
            Arg::new("INPUT")
                .action(ArgAction::Append)
                .help("AML files or directories to validate"),
        )
        .arg(
            Arg::new("glob")
                .long("glob")
                .action(ArgAction::Append)
                .value_name("PATTERN")
                .help("Glob pattern to expand into input paths (cross-platform). Can be passed multiple times."),
        )
        .arg(
            Arg::new("output-format")
                .short('o')
                .long("format")
                .value_parser(["text", "json", "jsonl"])
                .default_value("text")
                .help("Sets the output format"),
        )
        .arg(
            Arg::new("expect")
                .long("expect")
                .value_name("SIGNATURE")
                .help("Expected table signature, overrides the one derived from file names"),
        )
        .arg(
            Arg::new("exempt")
                .long("exempt")
                .action(ArgAction::Append)
                .value_name("SIGNATURE")
                .help("Additional signature whose checksum is not verified (FACS always is exempt)"),
        )
        .arg(
            Arg::new("max-listed")
                .long("max-listed")
                .value_parser(clap::value_parser!(usize))
                .default_value("5")
                .help("Number of warnings/errors listed per table in text output"),
        )
        .arg(
            Arg::new("no-structure")
                .long("no-structure")
                .action(ArgAction::SetTrue)
                .help("Only check header, signature, length and checksum"),
        )
        .arg(
            Arg::new("num-threads")
                .short('t')
                .long("threads")
                .value_parser(clap::value_parser!(usize))
                .default_value("0")
                .help("Sets the number of worker threads, defaults to number of CPU cores."),
        )
}

fn try_to_initialize_logging(matches: &ArgMatches) {
    let level = match matches.get_count("verbose") {
        0 => None,
        1 => Some(Level::Info),
        2 => Some(Level::Debug),
        3 => Some(Level::Trace),
        _ => {
            eprintln!("using more than  -vvv does not affect verbosity level");
            Some(Level::Trace)
        }
    };

    if let Some(level) = level {
        if let Err(e) = simplelog::TermLogger::init(
            level.to_level_filter(),
            simplelog::Config::default(),
            simplelog::TerminalMode::Stderr,
            simplelog::ColorChoice::Auto,
        ) {
            eprintln!("Failed to initialize logging: {e}");
        }
    } else {
        log::set_max_level(LevelFilter::Off);
    }
}

fn main() {
    let matches = Command::new("ACPI table validator")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Utility to validate ACPI table binaries")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .global(true)
                .help("-v - info, -vv - debug, -vvv - trace."),
        )
        .subcommand(validate_command())
        .subcommand(hexdump::command())
        .get_matches();

    if let Some((_, sub)) = matches.subcommand() {
        try_to_initialize_logging(sub);
    }

    let code = match matches.subcommand() {
        Some(("validate", sub)) => {
            match ValidateCommand::from_cli_matches(sub).and_then(|cmd| cmd.run()) {
                Ok(summary) => summary.exit_code(),
                Err(e) => {
                    eprintln!("{e:?}");
                    1
                }
            }
        }
        Some(("hexdump", sub)) => match hexdump::run(sub) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: {e}");
                e.exit_code()
            }
        },
        _ => unreachable!("subcommand is required"),
    };

    exit(code);
}
