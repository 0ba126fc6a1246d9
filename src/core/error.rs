//! Error kinds surfaced by a calibration run
//!
//! Every variant that concerns a single category names it together with the
//! offending path, so the operator can tell which file to look at.

use std::path::PathBuf;
use thiserror::Error;

use crate::cache::store::StoreError;
use crate::core::model::Category;

#[derive(Error, Debug)]
pub enum CalibError {
    #[error("Invalid configuration file {path:?}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Corrupt master calibration file for '{category}' at {path:?}")]
    CacheReadCorrupt {
        category: Category,
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("Failed to read master calibration file for '{category}' at {path:?}")]
    CacheReadFailed {
        category: Category,
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("Failed to read raw input for '{category}' from {path:?}")]
    RawReadFailed {
        category: Category,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to build master calibration frame for '{category}' from {path:?}")]
    BuildFailed {
        category: Category,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write master calibration file for '{category}' to {path:?}")]
    PersistFailed {
        category: Category,
        path: PathBuf,
        #[source]
        source: StoreError,
    },
}

impl CalibError {
    pub fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CalibError::ConfigInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Error for a persisted artifact that could not be loaded
    ///
    /// I/O failures mean the file could not be read at all; anything else
    /// means its contents did not decode.
    pub fn cache_read(category: &Category, path: impl Into<PathBuf>, source: StoreError) -> Self {
        let category = category.clone();
        let path = path.into();
        match source {
            StoreError::Io(_) => CalibError::CacheReadFailed {
                category,
                path,
                source,
            },
            _ => CalibError::CacheReadCorrupt {
                category,
                path,
                source,
            },
        }
    }

    /// Category the error belongs to, if it is scoped to one
    pub fn category(&self) -> Option<&Category> {
        match self {
            CalibError::ConfigInvalid { .. } => None,
            CalibError::CacheReadCorrupt { category, .. }
            | CalibError::CacheReadFailed { category, .. }
            | CalibError::RawReadFailed { category, .. }
            | CalibError::BuildFailed { category, .. }
            | CalibError::PersistFailed { category, .. } => Some(category),
        }
    }
}
