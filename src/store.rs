use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use ads7843::calibration::CalibrationMatrix;
use log::{debug, error, info};

/// Seven little-endian f64s, nothing else.
pub const RECORD_LEN: usize = 7 * 8;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no calibration file")]
    NotFound,
    #[error("calibration file is corrupt: {0}")]
    Corrupt(&'static str),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Postcard(#[from] postcard::Error),
}

pub fn load(path: &Path) -> Result<CalibrationMatrix, StoreError> {
    let data = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => StoreError::NotFound,
        _ => StoreError::Io(e),
    })?;

    if data.len() != RECORD_LEN {
        debug!("{}: {} bytes", path.display(), data.len());
        return Err(StoreError::Corrupt("wrong record length"));
    }

    let matrix: CalibrationMatrix =
        postcard::from_bytes(&data).map_err(|_| StoreError::Corrupt("malformed record"))?;

    if !matrix.is_usable() {
        return Err(StoreError::Corrupt("divider is zero"));
    }

    Ok(matrix)
}

/// Replaces whatever is at `path` with `matrix`.
///
/// The record is written next to `path` and renamed over it, so readers see
/// either the old record or the new one.
pub fn save(path: &Path, matrix: &CalibrationMatrix) -> Result<(), StoreError> {
    let data = postcard::to_stdvec(matrix)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(&data)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// [`save`] for callers that carry on without a stored record. Returns
/// whether the record was written.
pub fn save_or_log(path: &Path, matrix: &CalibrationMatrix) -> bool {
    match save(path, matrix) {
        Ok(()) => {
            info!("Saved touch calibration to {}", path.display());
            true
        }
        Err(e) => {
            error!("Failed to save touch calibration: {e}");
            false
        }
    }
}
