//! On-disk envelope around a serialized artifact

use serde::{Deserialize, Serialize};

use crate::cache::store::StoreError;
use crate::core::util::{hash_bytes, now_ms};

/// Envelope format version. Bump when the envelope or payload encoding changes.
pub const FORMAT_VERSION: u32 = 1;

/// What is actually written to a master calibration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEnvelope {
    /// Envelope format version
    pub format_version: u32,

    /// Timestamp when the artifact was written (ms since epoch)
    pub created_at_ms: i64,

    /// xxh3 of `payload`
    pub checksum: String,

    /// Serialized artifact
    pub payload: Vec<u8>,
}

impl ArtifactEnvelope {
    pub fn seal(payload: Vec<u8>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            created_at_ms: now_ms(),
            checksum: hash_bytes(&payload),
            payload,
        }
    }

    /// Check version and checksum, returning the payload when both match
    pub fn open(&self) -> Result<&[u8], StoreError> {
        if self.format_version != FORMAT_VERSION {
            return Err(StoreError::VersionMismatch {
                expected: FORMAT_VERSION,
                found: self.format_version,
            });
        }

        let actual = hash_bytes(&self.payload);
        if actual != self.checksum {
            return Err(StoreError::ChecksumMismatch {
                expected: self.checksum.clone(),
                found: actual,
            });
        }

        Ok(&self.payload)
    }
}
