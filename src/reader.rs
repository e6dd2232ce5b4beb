//! Line-oriented reading of plain or gzip-compressed record files.

use crate::error::Result;
#[cfg(not(feature = "gzip"))]
use crate::error::TzError;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Returns true when `path` names a gzip file (by its `.gz` extension).
pub fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Read every non-empty line of a UTF-8 record file.
///
/// Files ending in `.gz` are decompressed on the fly; concatenated gzip members
/// are read as one stream.
///
/// # Errors
///
/// `TzError::Io` if the file cannot be opened, decompressed or is not UTF-8.
pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    let lines = if is_gzip(path) {
        collect_lines(open_gzip(file)?)?
    } else {
        collect_lines(file)?
    };
    log::debug!("Read {} lines from {}", lines.len(), path.display());
    Ok(lines)
}

#[cfg(feature = "gzip")]
fn open_gzip(file: File) -> Result<impl Read> {
    Ok(flate2::read::MultiGzDecoder::new(file))
}

#[cfg(not(feature = "gzip"))]
fn open_gzip(_file: File) -> Result<File> {
    Err(TzError::InvalidInput(
        "gzip input requires the `gzip` feature".to_string(),
    ))
}

fn collect_lines(source: impl Read) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in BufReader::new(source).lines() {
        let line = line?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}
