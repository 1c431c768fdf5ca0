use log::warn;

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Controls how [`format_c_array`] lays out its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CArrayOptions {
    /// When set, wraps the bytes in a `const <c_type> <name>[] = { ... };` definition.
    pub name: Option<String>,
    pub c_type: String,
    pub per_line: usize,
    /// With `name`, also emit `size_t <name>_len`.
    pub emit_length: bool,
}

impl Default for CArrayOptions {
    fn default() -> Self {
        CArrayOptions {
            name: None,
            c_type: "uint8_t".to_string(),
            per_line: 12,
            emit_length: false,
        }
    }
}

/// Renders `data` as a C array literal body (`0xAB, 0xCD, ...`), or a full definition when a
/// name is given.
pub fn format_c_array(data: &[u8], options: &CArrayOptions) -> String {
    let per_line = options.per_line.max(1);

    if data.is_empty() {
        return match &options.name {
            Some(name) => {
                let mut out = format!("const {} {}[] = {{}};", options.c_type, name);
                if options.emit_length {
                    out.push_str(&format!("\nsize_t {name}_len = 0;"));
                }
                out
            }
            None => String::new(),
        };
    }

    let body = data
        .chunks(per_line)
        .map(|line| {
            let bytes: Vec<String> = line.iter().map(|b| format!("0x{b:02X}")).collect();
            format!("  {}", bytes.join(", "))
        })
        .collect::<Vec<_>>()
        .join(",\n");

    match &options.name {
        Some(name) => {
            let mut lines = vec![
                format!("const {} {}[] = {{", options.c_type, name),
                format!("{body},"),
                "};".to_string(),
            ];
            if options.emit_length {
                lines.push(format!("size_t {name}_len = sizeof({name});"));
            }
            lines.join("\n")
        }
        None => format!("{body},"),
    }
}

/// Reads up to `size` bytes starting at `offset`, clamped to the end of the file.
///
/// An offset past the end of the file yields no data.
pub fn read_range(path: impl AsRef<Path>, offset: u64, size: Option<u64>) -> io::Result<Vec<u8>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let file_size = file.metadata()?.len();

    if offset > file_size {
        warn!(
            "offset {offset:#x} beyond end of `{}` (size {file_size}), no data to read",
            path.display()
        );
        return Ok(Vec::new());
    }

    let available = file_size - offset;
    let to_read = size.map_or(available, |size| size.min(available));

    file.seek(SeekFrom::Start(offset))?;
    let mut data = Vec::with_capacity(usize::try_from(to_read).unwrap_or(0));
    file.take(to_read).read_to_end(&mut data)?;

    Ok(data)
}
