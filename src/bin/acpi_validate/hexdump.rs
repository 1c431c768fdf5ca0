use clap::{Arg, ArgAction, ArgMatches, Command};
use indoc::indoc;
use thiserror::Error;

use acpi_validate::utils::{CArrayOptions, format_c_array, read_range};

use std::io::{self, Write};
use std::path::PathBuf;

use crate::{create_output_file, parse_int};

#[derive(Debug, Error)]
pub enum HexdumpError {
    #[error("file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Failed to read file `{}`: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write output file: {0:#}")]
    Write(anyhow::Error),
}

impl HexdumpError {
    pub fn exit_code(&self) -> i32 {
        match self {
            HexdumpError::InputNotFound(_) => 2,
            HexdumpError::Read { .. } => 3,
            HexdumpError::Write(_) => 4,
        }
    }
}

pub fn command() -> Command {
    Command::new("hexdump")
        .about("Render a byte range of a file as a C array")
        .long_about(indoc!(r#"
            Render a byte range of a file as a C-style hex byte array, for example:

                0xFF, 0x00, 0x12, ...

            Offsets and sizes accept decimal or `0x` prefixed hex. Without `--name` only the
            comma separated bytes are printed, ready to paste into existing code.
        "#))
        .arg(Arg::new("INPUT").required(true).help("Input file path"))
        .arg(
            Arg::new("OFFSET")
                .value_parser(parse_int)
                .help("Start offset, defaults to 0"),
        )
        .arg(
            Arg::new("SIZE")
                .value_parser(parse_int)
                .help("Number of bytes to read, defaults to end of file"),
        )
        .arg(
            Arg::new("size")
                .long("size")
                .short('s')
                .value_parser(parse_int)
                .help("Number of bytes to read (overrides positional SIZE)"),
        )
        .arg(
            Arg::new("output-target")
                .long("output")
                .short('f')
                .value_name("FILE")
                .help("Writes output to the file specified instead of stdout. \
                       Will ask for confirmation before overwriting files, to allow overwriting, pass `--no-confirm-overwrite`."),
        )
        .arg(
            Arg::new("no-confirm-overwrite")
                .long("no-confirm-overwrite")
                .action(ArgAction::SetTrue)
                .help("When set, will not ask for confirmation before overwriting files, useful for automation"),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .short('n')
                .help("Emit a C definition: `const <type> NAME[] = { ... };`"),
        )
        .arg(
            Arg::new("type")
                .long("type")
                .short('t')
                .default_value("uint8_t")
                .help("C data type used with --name"),
        )
        .arg(
            Arg::new("per-line")
                .long("per-line")
                .short('p')
                .value_parser(clap::value_parser!(usize))
                .default_value("12")
                .help("Bytes per line"),
        )
        .arg(
            Arg::new("var-length")
                .long("var-length")
                .short('l')
                .action(ArgAction::SetTrue)
                .help("With --name, also emit `size_t NAME_len`"),
        )
}

pub fn run(matches: &ArgMatches) -> Result<(), HexdumpError> {
    let input = PathBuf::from(
        matches
            .get_one::<String>("INPUT")
            .expect("This is a required argument"),
    );

    if !input.is_file() {
        return Err(HexdumpError::InputNotFound(input));
    }

    let offset = matches.get_one::<u64>("OFFSET").copied().unwrap_or(0);
    let size = matches
        .get_one::<u64>("size")
        .or_else(|| matches.get_one::<u64>("SIZE"))
        .copied();

    let data = read_range(&input, offset, size).map_err(|source| HexdumpError::Read {
        path: input.clone(),
        source,
    })?;

    let options = CArrayOptions {
        name: matches.get_one::<String>("name").cloned(),
        c_type: matches
            .get_one::<String>("type")
            .cloned()
            .expect("has default"),
        per_line: *matches.get_one::<usize>("per-line").expect("has default"),
        emit_length: matches.get_flag("var-length"),
    };

    let out = format_c_array(&data, &options);

    match matches.get_one::<String>("output-target") {
        Some(path) => {
            let mut f = create_output_file(path, !matches.get_flag("no-confirm-overwrite"))
                .map_err(HexdumpError::Write)?;
            if !out.is_empty() {
                writeln!(f, "{out}").map_err(|e| HexdumpError::Write(e.into()))?;
            }
        }
        None => println!("{out}"),
    }

    Ok(())
}
