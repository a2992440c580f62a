//! Whole-document JSON persistence with atomic replace

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracker_core::{Result, TrackerError};

/// Load a JSON document, or produce the default when the file does not
/// exist yet
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(TrackerError::persistence(path.display(), e)),
    };

    serde_json::from_slice(&bytes).map_err(|e| TrackerError::persistence(path.display(), e))
}

/// Serialize and write a JSON document via a temporary sibling file
///
/// The rename is atomic on the same filesystem; an interrupted write can
/// only ever leave a stray `.tmp` file, never a truncated document.
pub fn save_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| TrackerError::persistence(path.display(), e))?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &json).map_err(|e| TrackerError::persistence(tmp.display(), e))?;
    fs::rename(&tmp, path).map_err(|e| TrackerError::persistence(path.display(), e))?;

    Ok(())
}
