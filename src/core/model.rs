//! Report Model
//!
//! Every calibration run maps its per-category outcomes to this model
//! before rendering output.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::core::paths::normalize_path;

/// Name of a kind of calibration artifact (bias, dark, flat, ...)
///
/// Ordering is lexicographic on the name, which fixes the order in which
/// categories are processed and reported.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Terminal state of one category after a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheOutcome {
    /// Loaded from the persisted artifact, nothing rebuilt
    Reused,
    /// Built from raw input, kept in memory only
    Built,
    /// Built from raw input and written through to the persisted path
    BuiltAndPersisted,
    /// No usable cache and no usable raw input
    Absent,
}

impl CacheOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CacheOutcome::Reused => "reused",
            CacheOutcome::Built => "built",
            CacheOutcome::BuiltAndPersisted => "built_and_persisted",
            CacheOutcome::Absent => "absent",
        }
    }
}

/// One line of the run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: Category,

    pub outcome: CacheOutcome,

    /// Master calibration file, using '/' as separator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted_path: Option<String>,

    /// Raw input file, using '/' as separator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_path: Option<String>,
}

impl CategoryReport {
    pub fn new(category: Category, outcome: CacheOutcome) -> Self {
        Self {
            category,
            outcome,
            persisted_path: None,
            raw_path: None,
        }
    }

    pub fn with_persisted_path(mut self, path: Option<&Path>) -> Self {
        self.persisted_path = path.map(normalize_path);
        self
    }

    pub fn with_raw_path(mut self, path: Option<&Path>) -> Self {
        self.raw_path = path.map(normalize_path);
        self
    }
}

/// Report for a whole run, in category order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub items: Vec<CategoryReport>,
}

impl Report {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: CategoryReport) {
        self.items.push(item);
    }

    /// Number of categories with the given outcome
    pub fn count(&self, outcome: CacheOutcome) -> usize {
        self.items.iter().filter(|i| i.outcome == outcome).count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<CategoryReport> for Report {
    fn from_iter<T: IntoIterator<Item = CategoryReport>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
