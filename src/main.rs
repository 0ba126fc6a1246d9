//! mastercal - Master calibration frames for a time-series photometry pipeline
//!
//! mastercal provides:
//! - A per-category cache of master calibration frames (bias, dark, flat, ...)
//! - Reuse of previously written frames, or a forced re-reduction
//! - Write-through of freshly built frames
//! - Unified report output (jsonl/json/md)

use anyhow::Result;
use clap::Parser;

mod cache;
mod cli;
mod config;
mod core;
mod frames;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::run(cli)
}
