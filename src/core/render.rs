//! Renderer module
//!
//! Renders a run Report to different output formats: jsonl, json, md

use crate::core::model::{CacheOutcome, CategoryReport, Report};
use std::io::Write;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    /// Create a new render config with default options
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            pretty: false,
        }
    }

    /// Create a new render config with pretty option
    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self {
            pretty,
            ..Self::new(format)
        }
    }
}

/// Renderer for run reports
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    #[cfg(test)]
    pub fn new(format: OutputFormat) -> Self {
        Self {
            config: RenderConfig::new(format),
        }
    }

    /// Create a new renderer with render config
    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a report to a string
    pub fn render(&self, report: &Report) -> String {
        match self.config.format {
            OutputFormat::Jsonl => self.render_jsonl(report),
            OutputFormat::Json => self.render_json(report),
            OutputFormat::Markdown => self.render_markdown(report),
        }
    }

    /// Render to a writer
    pub fn render_to<W: Write>(&self, report: &Report, mut writer: W) -> std::io::Result<()> {
        let output = self.render(report);
        if output.is_empty() {
            return Ok(());
        }
        writeln!(writer, "{}", output)
    }

    /// Render as JSON Lines (one JSON object per line)
    fn render_jsonl(&self, report: &Report) -> String {
        report
            .items
            .iter()
            .filter_map(|item| {
                if self.config.pretty {
                    serde_json::to_string_pretty(item).ok()
                } else {
                    serde_json::to_string(item).ok()
                }
            })
            .collect::<Vec<_>>()
            .join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    /// Render as a single JSON array
    fn render_json(&self, report: &Report) -> String {
        if self.config.pretty {
            serde_json::to_string_pretty(&report.items).unwrap_or_else(|_| "[]".to_string())
        } else {
            serde_json::to_string(&report.items).unwrap_or_else(|_| "[]".to_string())
        }
    }

    /// Render as Markdown
    fn render_markdown(&self, report: &Report) -> String {
        if report.is_empty() {
            return String::new();
        }

        let mut output = String::new();
        output.push_str("## Master calibration frames\n\n");
        output.push_str("| Category | Outcome | Master file | Raw input |\n");
        output.push_str("|----------|---------|-------------|-----------|\n");
        for item in &report.items {
            self.render_row_md(&mut output, item);
        }
        output.push('\n');

        output.push_str(&format!(
            "{} reused, {} built, {} persisted, {} absent\n",
            report.count(CacheOutcome::Reused),
            report.count(CacheOutcome::Built),
            report.count(CacheOutcome::BuiltAndPersisted),
            report.count(CacheOutcome::Absent),
        ));

        if report.count(CacheOutcome::Absent) > 0 {
            output.push_str("\n> ⚠️ Some categories have no master calibration frame\n");
        }

        output
    }

    fn render_row_md(&self, output: &mut String, item: &CategoryReport) {
        let cell = |p: &Option<String>| match p {
            Some(p) => format!("`{}`", p),
            None => "-".to_string(),
        };
        output.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            item.category,
            item.outcome.label(),
            cell(&item.persisted_path),
            cell(&item.raw_path),
        ));
    }
}
