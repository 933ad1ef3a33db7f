//! Error type returned by judge adapters.

use crate::solution::{SolutionDetails, SolutionInfo};
use crate::status;

/// Judge adapter errors.
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    /// The submission itself is at fault (bad archive, missing file, ...).
    ///
    /// `status` and `message` become the reported result, `detail` lands in a
    /// fenced block of the details summary.
    #[error("{message}")]
    Solution {
        status: String,
        message: String,
        detail: String,
    },

    /// The problem's adapter config could not be decoded or is invalid.
    #[error("invalid {adapter} adapter config: {reason}")]
    InvalidConfig { adapter: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl JudgeError {
    pub fn solution(
        status: impl Into<String>,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Solution {
            status: status.into(),
            message: message.into(),
            detail: detail.into(),
        }
    }

    pub fn invalid_config(adapter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            adapter: adapter.into(),
            reason: reason.into(),
        }
    }

    /// Result snapshot to report for this error.
    pub fn info(&self) -> SolutionInfo {
        match self {
            Self::Solution {
                status, message, ..
            } => SolutionInfo::new(0.0, status.clone(), message.clone()),
            _ => SolutionInfo::new(0.0, status::JUDGE_ERROR, "Judge error"),
        }
    }

    /// Details report to upload for this error.
    pub fn details(&self) -> SolutionDetails {
        match self {
            Self::Solution { detail, .. } => SolutionDetails::error(detail),
            other => SolutionDetails::error(other),
        }
    }
}
