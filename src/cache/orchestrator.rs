//! Cache orchestrator - Populates master calibration frames for a run
//!
//! Categories are visited one at a time in sorted order. For each one the
//! policy decides between reuse, build, build-and-persist or absent; the
//! orchestrator then calls the raw reader and builder at most once and writes
//! the result through the store.
//!
//! The first failing category aborts the run. Nothing is persisted for it,
//! since persisting only happens after a successful build.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::cache::policy::{decide, CategoryPaths, Decision};
use crate::cache::store::ArtifactStore;
use crate::config::CalibrationConfig;
use crate::core::error::CalibError;
use crate::core::model::{CacheOutcome, Category, CategoryReport, Report};
use crate::frames::{ArtifactBuilder, RawReader};

/// Artifacts built or loaded during one run, with each category's outcome
#[derive(Debug)]
pub struct CalibrationSet<A> {
    artifacts: BTreeMap<Category, A>,
    outcomes: BTreeMap<Category, CacheOutcome>,
}

impl<A> CalibrationSet<A> {
    fn new() -> Self {
        Self {
            artifacts: BTreeMap::new(),
            outcomes: BTreeMap::new(),
        }
    }

    pub fn get(&self, category: &Category) -> Option<&A> {
        self.artifacts.get(category)
    }

    pub fn outcome(&self, category: &Category) -> Option<CacheOutcome> {
        self.outcomes.get(category).copied()
    }

    pub fn artifacts(&self) -> &BTreeMap<Category, A> {
        &self.artifacts
    }

    /// Per-category report, with the paths taken from `config`
    pub fn report(&self, config: &CalibrationConfig) -> Report {
        let mut report = Report::new();
        for (category, outcome) in &self.outcomes {
            report.push(
                CategoryReport::new(category.clone(), *outcome)
                    .with_persisted_path(config.persisted_path(category))
                    .with_raw_path(config.raw_path(category)),
            );
        }
        report
    }

    fn insert(&mut self, category: &Category, artifact: Option<A>, outcome: CacheOutcome) {
        if let Some(artifact) = artifact {
            self.artifacts.insert(category.clone(), artifact);
        }
        self.outcomes.insert(category.clone(), outcome);
    }
}

/// Runs the reuse/rebuild policy over every configured category
pub struct Orchestrator<'a, R, B> {
    store: &'a ArtifactStore,
    reader: &'a R,
    builder: &'a B,
}

impl<'a, R, B> Orchestrator<'a, R, B>
where
    R: RawReader,
    B: ArtifactBuilder<R::Dataset>,
    B::Artifact: Serialize + DeserializeOwned,
{
    pub fn new(store: &'a ArtifactStore, reader: &'a R, builder: &'a B) -> Self {
        Self {
            store,
            reader,
            builder,
        }
    }

    /// Resolve every category of `config`
    ///
    /// With `force_rebuild`, persisted artifacts are never loaded: every
    /// category with raw input is rebuilt and written through.
    pub fn run(
        &self,
        config: &CalibrationConfig,
        force_rebuild: bool,
    ) -> Result<CalibrationSet<B::Artifact>, CalibError> {
        info!(force_rebuild, "creating master calibration frames");

        let mut set = CalibrationSet::new();
        for category in config.categories() {
            let paths = CategoryPaths {
                persisted: config.persisted_path(category),
                raw: config.raw_path(category),
            };
            let decision = decide(category, paths, force_rebuild, self.store)?;
            debug!(%category, decision = decision.name(), "resolved cache policy");

            let (artifact, outcome) = self.execute(category, decision)?;
            info!(%category, outcome = outcome.label(), "master calibration frame");
            set.insert(category, artifact, outcome);
        }

        Ok(set)
    }

    fn execute(
        &self,
        category: &Category,
        decision: Decision<B::Artifact>,
    ) -> Result<(Option<B::Artifact>, CacheOutcome), CalibError> {
        match decision {
            Decision::Reuse(artifact) => Ok((Some(artifact), CacheOutcome::Reused)),
            Decision::Absent => Ok((None, CacheOutcome::Absent)),
            Decision::Build { raw } => {
                let artifact = self.build(category, &raw)?;
                Ok((Some(artifact), CacheOutcome::Built))
            }
            Decision::BuildAndPersist { raw, target } => {
                let artifact = self.build(category, &raw)?;
                let outcome = self.persist(category, &target, &artifact)?;
                Ok((Some(artifact), outcome))
            }
        }
    }

    fn build(&self, category: &Category, raw: &Path) -> Result<B::Artifact, CalibError> {
        debug!(%category, path = %raw.display(), "creating master calibration frame");
        let dataset = self
            .reader
            .read_raw(raw)
            .map_err(|source| CalibError::RawReadFailed {
                category: category.clone(),
                path: raw.to_path_buf(),
                source,
            })?;
        self.builder
            .build(dataset)
            .map_err(|source| CalibError::BuildFailed {
                category: category.clone(),
                path: raw.to_path_buf(),
                source,
            })
    }

    fn persist(
        &self,
        category: &Category,
        target: &Path,
        artifact: &B::Artifact,
    ) -> Result<CacheOutcome, CalibError> {
        debug!(%category, path = %target.display(), "writing master calibration frame");
        match self.store.store(Some(target), artifact) {
            Ok(true) => Ok(CacheOutcome::BuiltAndPersisted),
            Ok(false) => Ok(CacheOutcome::Built),
            Err(source) => {
                warn!(
                    %category,
                    path = %target.display(),
                    "master calibration frame was built but not written; the on-disk cache is stale"
                );
                Err(CalibError::PersistFailed {
                    category: category.clone(),
                    path: target.to_path_buf(),
                    source,
                })
            }
        }
    }
}
