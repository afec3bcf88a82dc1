//! Reads LS-8 program sources.
//!
//! A source is plain text with one instruction byte per line, written in
//! binary. Only lines that start with `0` or `1` carry a byte; anything after
//! a `#` is a comment. Every other line is skipped.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};

pub fn parse_program(source: &str) -> Result<Vec<u8>> {
    let mut image = Vec::new();
    for (i, line) in source.lines().enumerate() {
        if !(line.starts_with('0') || line.starts_with('1')) {
            continue;
        }
        let token = line.split('#').next().unwrap_or_default().trim();
        let byte = u8::from_str_radix(token, 2).map_err(|_| Error::Parse {
            line: i + 1,
            token: token.to_string(),
        })?;
        image.push(byte);
    }
    Ok(image)
}

pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let image = parse_program(&source)?;
    info!("parsed {} bytes from {}", image.len(), path.display());
    Ok(image)
}
