//! Task implementations handed to adapters.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use judgeline_adapter_api::{
    InstanceAction, InstanceTask, JudgeTask, ProblemConfig, SolutionDetails, SolutionInfo,
};
use judgeline_remote::{InstanceTaskRef, RunnerApi, SolutionTaskRef};
use tracing::info;

/// Judge task backed by the control server.
pub struct RemoteJudgeTask {
    api: Arc<dyn RunnerApi>,
    task: SolutionTaskRef,
    config: ProblemConfig,
    env: BTreeMap<String, String>,
    problem_data: PathBuf,
    solution_data: PathBuf,
}

impl RemoteJudgeTask {
    pub fn new(
        api: Arc<dyn RunnerApi>,
        task: SolutionTaskRef,
        config: ProblemConfig,
        env: BTreeMap<String, String>,
        problem_data: PathBuf,
        solution_data: PathBuf,
    ) -> Self {
        Self {
            api,
            task,
            config,
            env,
            problem_data,
            solution_data,
        }
    }
}

#[async_trait]
impl JudgeTask for RemoteJudgeTask {
    fn config(&self) -> &ProblemConfig {
        &self.config
    }

    fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    fn problem_data(&self) -> &Path {
        &self.problem_data
    }

    fn solution_data(&self) -> &Path {
        &self.solution_data
    }

    async fn update(&self, info: &SolutionInfo) -> anyhow::Result<()> {
        self.api.patch_solution_task(&self.task, info).await?;
        Ok(())
    }

    async fn upload_details(&self, details: &SolutionDetails) -> anyhow::Result<()> {
        self.api.upload_solution_details(&self.task, details).await?;
        Ok(())
    }
}

/// Offline judge task built from files on disk.
///
/// Reports are logged as pretty JSON and kept for inspection.
#[derive(Debug, Default)]
pub struct LocalJudgeTask {
    config: ProblemConfig,
    env: BTreeMap<String, String>,
    problem_data: PathBuf,
    solution_data: PathBuf,
    updates: Mutex<Vec<SolutionInfo>>,
    details: Mutex<Option<SolutionDetails>>,
}

impl LocalJudgeTask {
    pub fn new(
        config: ProblemConfig,
        env: BTreeMap<String, String>,
        problem_data: PathBuf,
        solution_data: PathBuf,
    ) -> Self {
        Self {
            config,
            env,
            problem_data,
            solution_data,
            ..Self::default()
        }
    }

    pub fn updates(&self) -> Vec<SolutionInfo> {
        self.updates.lock().map(|u| u.clone()).unwrap_or_default()
    }

    pub fn last_update(&self) -> Option<SolutionInfo> {
        self.updates().pop()
    }

    pub fn details(&self) -> Option<SolutionDetails> {
        self.details.lock().ok().and_then(|d| d.clone())
    }
}

#[async_trait]
impl JudgeTask for LocalJudgeTask {
    fn config(&self) -> &ProblemConfig {
        &self.config
    }

    fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    fn problem_data(&self) -> &Path {
        &self.problem_data
    }

    fn solution_data(&self) -> &Path {
        &self.solution_data
    }

    async fn update(&self, info: &SolutionInfo) -> anyhow::Result<()> {
        info!("update:\n{}", serde_json::to_string_pretty(info)?);
        if let Ok(mut updates) = self.updates.lock() {
            updates.push(info.clone());
        }
        Ok(())
    }

    async fn upload_details(&self, details: &SolutionDetails) -> anyhow::Result<()> {
        info!("details:\n{}", serde_json::to_string_pretty(details)?);
        if let Ok(mut slot) = self.details.lock() {
            *slot = Some(details.clone());
        }
        Ok(())
    }
}

/// Instance task backed by the control server.
pub struct RemoteInstanceTask {
    api: Arc<dyn RunnerApi>,
    task: InstanceTaskRef,
    action: InstanceAction,
    config: ProblemConfig,
    problem_data: Option<PathBuf>,
    work_dir: PathBuf,
}

impl RemoteInstanceTask {
    pub fn new(
        api: Arc<dyn RunnerApi>,
        task: InstanceTaskRef,
        action: InstanceAction,
        config: ProblemConfig,
        problem_data: Option<PathBuf>,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            api,
            task,
            action,
            config,
            problem_data,
            work_dir,
        }
    }
}

#[async_trait]
impl InstanceTask for RemoteInstanceTask {
    fn action(&self) -> InstanceAction {
        self.action
    }

    fn config(&self) -> &ProblemConfig {
        &self.config
    }

    fn instance_id(&self) -> &str {
        &self.task.instance_id
    }

    fn problem_data(&self) -> Option<&Path> {
        self.problem_data.as_deref()
    }

    fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    async fn patch(&self, message: &str) -> anyhow::Result<()> {
        self.api.patch_instance_task(&self.task, message).await?;
        Ok(())
    }

    async fn complete(&self, succeeded: bool, message: &str) -> anyhow::Result<()> {
        self.api
            .complete_instance_task(&self.task, succeeded, message)
            .await?;
        Ok(())
    }
}
