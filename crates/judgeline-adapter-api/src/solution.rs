//! Judge result types: the incremental [`SolutionInfo`] snapshot and the final
//! [`SolutionDetails`] report tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Schema version written into every details report.
pub const DETAILS_VERSION: u32 = 1;

/// Full replacement snapshot of a solution's current result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolutionInfo {
    pub score: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BTreeMap<String, f64>>,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub message: String,
}

impl SolutionInfo {
    pub fn new(score: f64, status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            score,
            metrics: None,
            status: status.into(),
            message: message.into(),
        }
    }

    pub fn with_metrics(mut self, metrics: BTreeMap<String, f64>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Final structured report of a judge run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionDetails {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub jobs: Vec<DetailsJob>,

    #[serde(default)]
    pub summary: String,
}

fn default_version() -> u32 {
    DETAILS_VERSION
}

impl Default for SolutionDetails {
    fn default() -> Self {
        Self {
            version: DETAILS_VERSION,
            jobs: Vec::new(),
            summary: String::new(),
        }
    }
}

impl SolutionDetails {
    pub fn with_summary(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Self::default()
        }
    }

    /// Details whose summary embeds `detail` in a fenced code block.
    pub fn error(detail: impl std::fmt::Display) -> Self {
        Self::with_summary(format!("An Error has occurred:\n\n```\n{}\n```", detail))
    }

    /// Append a paragraph to the summary, keeping what is already there.
    pub fn append_note(&mut self, note: impl AsRef<str>) {
        self.summary.push_str("\n\n");
        self.summary.push_str(note.as_ref());
    }
}

/// One group or subtask of a details report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsJob {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub score: f64,

    /// Denominator for `score`.
    #[serde(default)]
    pub score_scale: f64,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub tests: Vec<DetailsTest>,

    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailsTest {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub score: f64,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub summary: String,
}
