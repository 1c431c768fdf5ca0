//! Locating table binaries on disk and deriving the identity each file is expected to hold.

use crate::err::{self, Result};

use log::debug;

use std::fs;
use std::path::{Path, PathBuf};

pub const TABLE_EXTENSION: &str = "aml";

/// The table identity implied by a file name: the upper-cased stem (`madt.aml` -> `MADT`).
pub fn expected_signature(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_uppercase())
}

/// Name of the directory a table was found in, which for build trees is the target platform.
pub fn platform_of(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
}

fn is_table_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(TABLE_EXTENSION))
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| err::Error::FailedToListDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    Ok(entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect())
}

/// Finds table files under `dir`, both directly inside it and one level down
/// (`<dir>/<platform>/<TABLE>.aml`, the layout of a build tree).
///
/// Hidden directories are skipped. The result is sorted.
pub fn discover_tables(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut tables = Vec::new();

    for entry in list_dir(dir)? {
        if is_table_file(&entry) {
            tables.push(entry);
        } else if entry.is_dir()
            && !entry
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with('.'))
        {
            tables.extend(list_dir(&entry)?.into_iter().filter(|p| is_table_file(p)));
        }
    }

    tables.sort();
    debug!("Discovered {} table(s) under `{}`", tables.len(), dir.display());

    if tables.is_empty() {
        return Err(err::Error::NoTablesFound {
            path: dir.to_path_buf(),
        });
    }

    Ok(tables)
}
