//! Frames module - Collaborators that turn raw exposures into master frames
//!
//! The cache orchestrator only depends on the two traits below. This module
//! also ships the reference implementations used by the binary:
//! - `JsonExposureReader`: reads a stack of raw exposures from a JSON file
//! - `MeanCombiner`: per-pixel mean of the stack into a `MasterFrame`

pub mod combine;
pub mod exposure;

use anyhow::Result;
use std::path::Path;

pub use combine::{MasterFrame, MeanCombiner};
pub use exposure::{ExposureStack, JsonExposureReader, RawExposure};

/// Reads the raw dataset for one category
pub trait RawReader {
    type Dataset;

    /// Fails if the path is unreadable or its contents are malformed.
    fn read_raw(&self, path: &Path) -> Result<Self::Dataset>;
}

/// Builds one master calibration artifact from a raw dataset
pub trait ArtifactBuilder<D> {
    type Artifact;

    /// May fail if the dataset is statistically insufficient.
    fn build(&self, dataset: D) -> Result<Self::Artifact>;
}
