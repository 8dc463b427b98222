//! Binary plan files
//!
//! Layout: one variant byte, then every direction as `x: f32`, `y: f32`
//! in little-endian order. There is no count; the record count follows from
//! the file length.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use glam::Vec2;
use thiserror::Error;

use crate::sim::Variant;

/// Bytes per stored direction
const RECORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum PlanFileError {
    #[error("plan file i/o: {0}")]
    Io(#[from] io::Error),
    #[error("plan file is empty")]
    Empty,
    #[error("unknown variant byte {0}")]
    UnknownVariant(u8),
    #[error("plan body of {len} bytes is not a whole number of directions")]
    Truncated { len: usize },
}

pub fn encode_plan(variant: Variant, directions: &[Vec2]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(1 + directions.len() * RECORD_LEN);
    bytes.push(variant.as_byte());
    for dir in directions {
        bytes.extend_from_slice(&dir.x.to_le_bytes());
        bytes.extend_from_slice(&dir.y.to_le_bytes());
    }
    bytes
}

pub fn decode_plan(bytes: &[u8]) -> Result<(Variant, Vec<Vec2>), PlanFileError> {
    let (&selector, body) = bytes.split_first().ok_or(PlanFileError::Empty)?;
    let variant = Variant::from_byte(selector).ok_or(PlanFileError::UnknownVariant(selector))?;

    if body.len() % RECORD_LEN != 0 {
        return Err(PlanFileError::Truncated { len: body.len() });
    }

    let directions = body
        .chunks_exact(RECORD_LEN)
        .map(|record| {
            let (x, y) = record.split_at(4);
            Vec2::new(f32_le(x), f32_le(y))
        })
        .collect();

    Ok((variant, directions))
}

fn f32_le(bytes: &[u8]) -> f32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    f32::from_le_bytes(raw)
}

/// `path` itself for `n == 0`, otherwise `n` appended to its stem
/// (`results.bin`, `results1.bin`, `results2.bin`, ...)
fn numbered(path: &Path, n: u32) -> PathBuf {
    if n == 0 {
        return path.to_path_buf();
    }
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}{n}"),
    };
    path.with_file_name(name)
}

/// Write a plan under the first free incremental name and return it.
///
/// Parent directories are created as needed. An existing file is never
/// touched, even if one appears between choosing the name and writing.
pub fn write_plan_incremental(
    path: &Path,
    variant: Variant,
    directions: &[Vec2],
) -> Result<PathBuf, PlanFileError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let bytes = encode_plan(variant, directions);
    let mut n = 0;
    loop {
        let candidate = numbered(path, n);
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut file) => {
                file.write_all(&bytes)?;
                log::debug!("Plan of {} shots written to {}", directions.len(), candidate.display());
                return Ok(candidate);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

pub fn read_plan(path: &Path) -> Result<(Variant, Vec<Vec2>), PlanFileError> {
    let bytes = fs::read(path)?;
    decode_plan(&bytes)
}
