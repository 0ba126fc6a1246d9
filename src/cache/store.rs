//! Artifact store - Read/write one master calibration file per category

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::cache::meta::ArtifactEnvelope;
use crate::core::paths::{has_extension, is_file, staging_path};

/// Extension of a master calibration file
pub const ARTIFACT_EXTENSION: &str = "bin";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("Unsupported format version: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Checksum mismatch: recorded {expected}, computed {found}")]
    ChecksumMismatch { expected: String, found: String },
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
}

/// Durable read/write of artifacts, gated on a recognized extension
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    extension: String,
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::new(ARTIFACT_EXTENSION)
    }
}

impl ArtifactStore {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether files at `path` are read and written by this store
    pub fn is_recognized(&self, path: &Path) -> bool {
        has_extension(path, &self.extension)
    }

    /// Load the artifact at `path`
    ///
    /// Returns `Ok(None)` when there is no path, no file, or the extension is
    /// not recognized. A recognized file that fails to decode is an error.
    pub fn load<A: DeserializeOwned>(&self, path: Option<&Path>) -> Result<Option<A>, StoreError> {
        let Some(path) = path else {
            return Ok(None);
        };
        if !is_file(path) {
            debug!(path = %path.display(), "no master calibration file");
            return Ok(None);
        }
        if !self.is_recognized(path) {
            debug!(path = %path.display(), extension = %self.extension, "ignoring file with unrecognized extension");
            return Ok(None);
        }

        let mut bytes = Vec::new();
        BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;

        let envelope: ArtifactEnvelope = codec()
            .with_limit(bytes.len() as u64)
            .deserialize(&bytes)?;
        let payload = envelope.open()?;
        let artifact = codec()
            .with_limit(payload.len() as u64)
            .deserialize(payload)?;

        debug!(
            path = %path.display(),
            bytes = bytes.len(),
            written_at_ms = envelope.created_at_ms,
            "loaded master calibration file"
        );
        Ok(Some(artifact))
    }

    /// Write `artifact` to `path`, replacing any existing file
    ///
    /// Returns `Ok(false)` without touching the filesystem when there is no
    /// path or its extension is not recognized.
    pub fn store<A: Serialize>(&self, path: Option<&Path>, artifact: &A) -> Result<bool, StoreError> {
        let Some(path) = path else {
            return Ok(false);
        };
        if !self.is_recognized(path) {
            debug!(path = %path.display(), extension = %self.extension, "not persisting to unrecognized extension");
            return Ok(false);
        }

        let envelope = ArtifactEnvelope::seal(codec().serialize(artifact)?);
        let bytes = codec().serialize(&envelope)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let staged = staging_path(path);
        if let Err(e) = write_file(&staged, &bytes) {
            let _ = fs::remove_file(&staged);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&staged, path) {
            let _ = fs::remove_file(&staged);
            return Err(e.into());
        }

        debug!(path = %path.display(), bytes = bytes.len(), "wrote master calibration file");
        Ok(true)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Frame {
        label: String,
        pixels: Vec<i32>,
    }

    fn frame(label: &str) -> Frame {
        Frame {
            label: label.to_string(),
            pixels: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_store_then_load() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bias.bin");
        let store = ArtifactStore::default();

        assert!(store.store(Some(&path), &frame("bias")).unwrap());
        let loaded: Option<Frame> = store.load(Some(&path)).unwrap();
        assert_eq!(loaded, Some(frame("bias")));
    }

    #[test]
    fn test_load_without_path() {
        let store = ArtifactStore::default();
        let loaded: Option<Frame> = store.load(None).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let temp = tempdir().unwrap();
        let store = ArtifactStore::default();
        let loaded: Option<Frame> = store.load(Some(&temp.path().join("dark.bin"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_ignores_unrecognized_extension() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bias.pkl");
        std::fs::write(&path, b"whatever is in here").unwrap();

        let store = ArtifactStore::default();
        let loaded: Option<Frame> = store.load(Some(&path)).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_corrupt_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bias.bin");
        std::fs::write(&path, b"\x01\x02garbage").unwrap();

        let store = ArtifactStore::default();
        let result: Result<Option<Frame>, _> = store.load(Some(&path));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_truncated_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bias.bin");
        let store = ArtifactStore::default();
        store.store(Some(&path), &frame("bias")).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 2]).unwrap();

        let result: Result<Option<Frame>, _> = store.load(Some(&path));
        assert!(result.is_err());
    }

    #[test]
    fn test_store_without_path_is_noop() {
        let store = ArtifactStore::default();
        assert!(!store.store(None, &frame("bias")).unwrap());
    }

    #[test]
    fn test_store_never_overwrites_unrecognized_extension() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bias.pkl");
        std::fs::write(&path, b"legacy").unwrap();

        let store = ArtifactStore::default();
        assert!(!store.store(Some(&path), &frame("bias")).unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"legacy");
    }

    #[test]
    fn test_store_overwrites_existing_artifact() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("flat.bin");
        let store = ArtifactStore::default();

        store.store(Some(&path), &frame("old")).unwrap();
        store.store(Some(&path), &frame("new")).unwrap();

        let loaded: Option<Frame> = store.load(Some(&path)).unwrap();
        assert_eq!(loaded.unwrap().label, "new");
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_store_creates_parent_dirs() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("master/2024-01-01/dark.bin");
        let store = ArtifactStore::default();

        assert!(store.store(Some(&path), &frame("dark")).unwrap());
        assert!(path.exists());
    }

    #[test]
    fn test_custom_extension() {
        let temp = tempdir().unwrap();
        let store = ArtifactStore::new("mcal");
        assert_eq!(store.extension(), "mcal");
        assert!(store.is_recognized(&temp.path().join("bias.mcal")));
        assert!(!store.is_recognized(&temp.path().join("bias.bin")));
    }
}
