use std::fs;
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use mediapulse_common::PulseError;

/// Read and deserialize a JSON file. `Ok(None)` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PulseError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    let value = serde_json::from_str(&content).map_err(|e| {
        PulseError::Store(format!("{} is not valid JSON: {e}", path.display()))
    })?;
    Ok(Some(value))
}

/// Serialize `value` to a temp file beside `path`, then rename over it.
/// Readers see either the old file or the complete new one.
pub fn write_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PulseError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| PulseError::Store(format!("failed to replace {}: {}", path.display(), e.error)))?;

    debug!(path = %path.display(), "Wrote file");
    Ok(())
}
