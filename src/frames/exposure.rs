//! Raw exposure stacks
//!
//! Stand-in interchange format for raw exposures:
//!
//! ```json
//! { "exposures": [ { "width": 2, "height": 1, "pixels": [10.0, 12.0] } ] }
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

use crate::frames::RawReader;

/// A single raw exposure, row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawExposure {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<f32>,
}

impl RawExposure {
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

/// All raw exposures of one category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExposureStack {
    pub exposures: Vec<RawExposure>,
}

impl ExposureStack {
    pub fn len(&self) -> usize {
        self.exposures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exposures.is_empty()
    }

    /// Check that every exposure carries exactly width * height pixels
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            bail!("raw input contains no exposures");
        }
        for (idx, exp) in self.exposures.iter().enumerate() {
            let Some(expected) = exp.width.checked_mul(exp.height) else {
                bail!(
                    "exposure {} declares {}x{}, which overflows the pixel count",
                    idx,
                    exp.width,
                    exp.height
                );
            };
            if exp.pixels.len() != expected {
                bail!(
                    "exposure {} declares {}x{} but has {} pixels",
                    idx,
                    exp.width,
                    exp.height,
                    exp.pixels.len()
                );
            }
        }
        Ok(())
    }
}

/// Reads an `ExposureStack` from a JSON file
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExposureReader;

impl RawReader for JsonExposureReader {
    type Dataset = ExposureStack;

    fn read_raw(&self, path: &Path) -> Result<ExposureStack> {
        let file =
            File::open(path).with_context(|| format!("Failed to open raw input: {:?}", path))?;
        let stack: ExposureStack = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Malformed raw input: {:?}", path))?;
        stack.validate()?;
        debug!(path = %path.display(), exposures = stack.len(), "read raw exposures");
        Ok(stack)
    }
}
