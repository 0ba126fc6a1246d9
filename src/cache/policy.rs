//! Reuse / rebuild policy
//!
//! One function decides what happens to a category, for both the normal and
//! the forced-rebuild run.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cache::store::ArtifactStore;
use crate::core::error::CalibError;
use crate::core::model::Category;
use crate::core::paths::is_file;

/// Configured paths of one category
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryPaths<'a> {
    pub persisted: Option<&'a Path>,
    pub raw: Option<&'a Path>,
}

/// What to do for one category
#[derive(Debug)]
pub enum Decision<A> {
    /// A valid persisted artifact was loaded
    Reuse(A),
    /// Build from raw input, keep in memory only
    Build { raw: PathBuf },
    /// Build from raw input, then write through to `target`
    BuildAndPersist { raw: PathBuf, target: PathBuf },
    /// Nothing to load and nothing to build from
    Absent,
}

impl<A> Decision<A> {
    pub fn name(&self) -> &'static str {
        match self {
            Decision::Reuse(_) => "reuse",
            Decision::Build { .. } => "build",
            Decision::BuildAndPersist { .. } => "build_and_persist",
            Decision::Absent => "absent",
        }
    }
}

/// Decide reuse vs. rebuild for `category`
///
/// Unless `force_rebuild` is set, a valid persisted artifact wins and is
/// returned inside the decision. Otherwise the category is built when its raw
/// input exists as a file, and persisted when its master path carries the
/// store's extension. An unreadable or corrupt persisted artifact is an error.
pub fn decide<A: DeserializeOwned>(
    category: &Category,
    paths: CategoryPaths<'_>,
    force_rebuild: bool,
    store: &ArtifactStore,
) -> Result<Decision<A>, CalibError> {
    if !force_rebuild {
        let loaded = store
            .load(paths.persisted)
            .map_err(|source| {
                let path = paths.persisted.map(Path::to_path_buf).unwrap_or_default();
                CalibError::cache_read(category, path, source)
            })?;
        if let Some(artifact) = loaded {
            return Ok(Decision::Reuse(artifact));
        }
    }

    let Some(raw) = paths.raw.filter(|p| is_file(p)) else {
        debug!(%category, raw = ?paths.raw, "no usable raw input");
        return Ok(Decision::Absent);
    };

    let decision = match paths.persisted.filter(|p| store.is_recognized(p)) {
        Some(target) => Decision::BuildAndPersist {
            raw: raw.to_path_buf(),
            target: target.to_path_buf(),
        },
        None => Decision::Build {
            raw: raw.to_path_buf(),
        },
    };
    Ok(decision)
}
