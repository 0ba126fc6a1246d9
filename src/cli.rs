//! CLI module - Command-line interface definitions and handlers

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::cache::orchestrator::Orchestrator;
use crate::cache::store::ArtifactStore;
use crate::config::{load_config, DEFAULT_CONFIG};
use crate::core::render::{OutputFormat, RenderConfig, Renderer};
use crate::frames::{JsonExposureReader, MeanCombiner};

/// mastercal - build and reuse master calibration frames.
#[derive(Parser, Debug)]
#[command(name = "mastercal")]
#[command(
    author,
    version,
    about,
    long_about = r#"mastercal reads a configuration file and creates the master calibration
frames (bias, dark, flat, ...) of a photometry run.

For each category, a previously written master file is reused when it exists
and carries the .bin extension. Otherwise the master frame is built from the
category's raw input and written back. --rereduce rebuilds and overwrites
every category.

A per-category report is printed to stdout in the selected format (default:
jsonl). Diagnostics go to stderr.

Examples:
    mastercal --config night1/config.json
    mastercal --config night1/config.json --rereduce -v
    mastercal --config night1/config.json --format md
"#
)]
pub struct Cli {
    /// Input configuration file (.json).
    #[arg(
        long,
        alias = "fconfig",
        default_value = DEFAULT_CONFIG,
        value_name = "FILE",
        long_help = "Input configuration file. Must exist and have the .json extension.\n\n\
It maps each category to its master file under \"master\" (null disables caching)\n\
and to its raw input under \"calib\". Relative paths are resolved against the\n\
directory containing the configuration file."
    )]
    pub config: PathBuf,

    /// Re-reduce all categories, overwriting previously written master files.
    #[arg(
        long,
        alias = "force-rebuild",
        long_help = "Re-reduce all categories. Existing master files are never loaded; every\n\
category with raw input is rebuilt and its master file overwritten.\n\n\
If omitted, previously written master files are reused."
    )]
    pub rereduce: bool,

    /// Increase diagnostics on stderr (-v info, -vv debug).
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        long_help = "Increase the amount of diagnostics printed to stderr.\n\n\
-v prints INFO messages, -vv adds DEBUG messages (including the configuration\n\
contents). RUST_LOG overrides this flag when set."
    )]
    pub verbose: u8,

    /// Minimum number of raw exposures needed to build a master frame.
    #[arg(long, default_value = "1", value_name = "N")]
    pub min_frames: usize,

    /// Output format (jsonl/json/md).
    #[arg(
        long,
        default_value = "jsonl",
        value_name = "FORMAT",
        long_help = "Select the output format for the run report.\n\n\
Supported values:\n\
- jsonl (default)\n\
- json\n\
- md (markdown)"
    )]
    pub format: String,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(long)]
    pub pretty: bool,
}

/// Default log filter for a verbosity count
pub fn verbosity_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "mastercal=warn",
        1 => "mastercal=info",
        _ => "mastercal=debug",
    }
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_filter(verbose)));

    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);
    debug!(?cli, "arguments");

    let format: OutputFormat = cli.format.parse().unwrap_or_default();
    let render_config = RenderConfig::with_pretty(format, cli.pretty);

    let config = load_config(&cli.config)?;

    let store = ArtifactStore::default();
    debug!(extension = store.extension(), "artifact store ready");
    let reader = JsonExposureReader;
    let builder = MeanCombiner::new(cli.min_frames);
    let set = Orchestrator::new(&store, &reader, &builder)
        .run(&config, cli.rereduce)
        .inspect_err(|e| {
            if let Some(category) = e.category() {
                error!(%category, "calibration run aborted");
            }
        })?;
    for category in config.categories() {
        debug!(
            %category,
            outcome = set.outcome(category).map(|o| o.label()),
            frames = set.get(category).map(|f| f.frame_count),
            "category done"
        );
    }
    info!(
        categories = config.categories().len(),
        available = set.artifacts().len(),
        "master calibration frames ready"
    );

    let report = set.report(&config);
    let renderer = Renderer::with_config(render_config);
    renderer
        .render_to(&report, std::io::stdout().lock())
        .context("Failed to write report")?;
    std::io::stdout().flush().ok();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["mastercal"]);
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert!(!cli.rereduce);
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.min_frames, 1);
        assert_eq!(cli.format, "jsonl");
    }

    #[test]
    fn test_aliases_and_verbosity_count() {
        let cli = Cli::parse_from([
            "mastercal",
            "--fconfig",
            "night1/config.json",
            "--force-rebuild",
            "-vv",
        ]);
        assert_eq!(cli.config, PathBuf::from("night1/config.json"));
        assert!(cli.rereduce);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_verbosity_filter() {
        assert_eq!(verbosity_filter(0), "mastercal=warn");
        assert_eq!(verbosity_filter(1), "mastercal=info");
        assert_eq!(verbosity_filter(5), "mastercal=debug");
    }
}
