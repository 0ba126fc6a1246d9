//! Core module - Contains the fundamental data structures and utilities
//!
//! This module provides:
//! - Report model (categories, outcomes)
//! - Error kinds for a calibration run
//! - Rendering functions for different output formats
//! - Path and hashing helpers

pub mod error;
pub mod model;
pub mod paths;
pub mod render;
pub mod util;
