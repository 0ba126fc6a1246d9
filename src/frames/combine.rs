//! Per-pixel mean combination of an exposure stack

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::frames::{ArtifactBuilder, ExposureStack};

/// A combined master calibration frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterFrame {
    pub width: usize,
    pub height: usize,
    /// Number of raw exposures that went into this frame
    pub frame_count: usize,
    pub pixels: Vec<f32>,
}

#[derive(Debug, Clone, Copy)]
pub struct MeanCombiner {
    pub min_frames: usize,
}

impl Default for MeanCombiner {
    fn default() -> Self {
        Self { min_frames: 1 }
    }
}

impl MeanCombiner {
    pub fn new(min_frames: usize) -> Self {
        Self {
            min_frames: min_frames.max(1),
        }
    }
}

impl ArtifactBuilder<ExposureStack> for MeanCombiner {
    type Artifact = MasterFrame;

    fn build(&self, stack: ExposureStack) -> Result<MasterFrame> {
        if stack.len() < self.min_frames {
            bail!(
                "need at least {} exposures, got {}",
                self.min_frames,
                stack.len()
            );
        }

        let Some(first) = stack.exposures.first() else {
            bail!("no exposures to combine");
        };
        let (width, height) = first.shape();
        if let Some(odd) = stack.exposures.iter().find(|e| e.shape() != (width, height)) {
            bail!(
                "exposure shapes disagree: {}x{} vs {}x{}",
                width,
                height,
                odd.width,
                odd.height
            );
        }

        let Some(len) = width.checked_mul(height) else {
            bail!("exposure size {}x{} overflows the pixel count", width, height);
        };
        let mut sums = vec![0f64; len];
        for exp in &stack.exposures {
            for (acc, px) in sums.iter_mut().zip(&exp.pixels) {
                *acc += f64::from(*px);
            }
        }

        let n = stack.len() as f64;
        Ok(MasterFrame {
            width,
            height,
            frame_count: stack.len(),
            pixels: sums.into_iter().map(|s| (s / n) as f32).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::RawExposure;

    fn exposure(pixels: Vec<f32>) -> RawExposure {
        RawExposure {
            width: pixels.len(),
            height: 1,
            pixels,
        }
    }

    #[test]
    fn test_mean_of_stack() {
        let stack = ExposureStack {
            exposures: vec![exposure(vec![1.0, 10.0]), exposure(vec![3.0, 20.0])],
        };

        let frame = MeanCombiner::default().build(stack).unwrap();
        assert_eq!(frame.frame_count, 2);
        assert_eq!((frame.width, frame.height), (2, 1));
        assert_eq!(frame.pixels, vec![2.0, 15.0]);
    }

    #[test]
    fn test_too_few_frames() {
        let stack = ExposureStack {
            exposures: vec![exposure(vec![1.0])],
        };

        let err = MeanCombiner::new(3).build(stack).unwrap_err();
        assert!(err.to_string().contains("need at least 3 exposures, got 1"));
    }

    #[test]
    fn test_empty_stack_rejected() {
        let err = MeanCombiner::new(0).build(ExposureStack::default()).unwrap_err();
        assert!(err.to_string().contains("got 0"));
    }

    #[test]
    fn test_shape_mismatch() {
        let stack = ExposureStack {
            exposures: vec![exposure(vec![1.0, 2.0]), exposure(vec![1.0])],
        };

        let err = MeanCombiner::default().build(stack).unwrap_err();
        assert!(err.to_string().contains("shapes disagree"));
    }

    #[test]
    fn test_oversized_shape_rejected() {
        let stack = ExposureStack {
            exposures: vec![RawExposure {
                width: usize::MAX,
                height: 2,
                pixels: Vec::new(),
            }],
        };

        let err = MeanCombiner::default().build(stack).unwrap_err();
        assert!(err.to_string().contains("overflows the pixel count"));
    }
}
