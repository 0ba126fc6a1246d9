//! Cache module - Manages persisted master calibration frames
//!
//! Provides:
//! - Artifact storage (one .bin file per category)
//! - The reuse/rebuild policy
//! - The orchestrator that runs the policy over every category

pub mod meta;
pub mod orchestrator;
pub mod policy;
pub mod store;
