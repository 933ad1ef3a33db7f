//! Capability surfaces handed to adapters.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;

use crate::problem::ProblemConfig;
use crate::solution::{SolutionDetails, SolutionInfo};

/// One judge dispatch as seen by a [`crate::JudgeAdapter`].
///
/// Reporting calls are best effort: an adapter may ignore their errors, the
/// engine logs failures on its side.
#[async_trait]
pub trait JudgeTask: Send + Sync {
    fn config(&self) -> &ProblemConfig;

    /// Extra context supplied by the server (for example the expected submitter).
    fn env(&self) -> &BTreeMap<String, String>;

    fn problem_data(&self) -> &Path;

    fn solution_data(&self) -> &Path;

    /// Replace the solution's current result snapshot.
    async fn update(&self, info: &SolutionInfo) -> anyhow::Result<()>;

    /// Upload the final report tree.
    async fn upload_details(&self, details: &SolutionDetails) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceAction {
    Start,
    Destroy,
}

/// One instance dispatch as seen by a [`crate::InstanceAdapter`].
#[async_trait]
pub trait InstanceTask: Send + Sync {
    fn action(&self) -> InstanceAction;

    fn config(&self) -> &ProblemConfig;

    fn instance_id(&self) -> &str;

    /// Problem data archive; only present for [`InstanceAction::Start`].
    fn problem_data(&self) -> Option<&Path>;

    /// Local working directory owned by this instance.
    fn work_dir(&self) -> &Path;

    /// Publish a progress message (replaces the previous one).
    async fn patch(&self, message: &str) -> anyhow::Result<()>;

    /// Terminal signal for the task.
    async fn complete(&self, succeeded: bool, message: &str) -> anyhow::Result<()>;
}
