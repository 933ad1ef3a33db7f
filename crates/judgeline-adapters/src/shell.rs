//! Instance adapter that runs bash snippets from the problem config.

use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use judgeline_adapter_api::{InstanceAdapter, InstanceTask, JudgeError};
use judgeline_core::sandbox::{run_command, SandboxCommand};
use serde::Deserialize;
use tracing::info;

fn default_timeout() -> u64 {
    300
}

#[derive(Debug, Deserialize)]
struct ShellConfig {
    #[serde(default)]
    start: String,

    #[serde(default)]
    destroy: String,

    #[serde(default = "default_timeout")]
    timeout: u64,
}

#[derive(Debug, Default, Clone)]
pub struct ShellInstancer;

impl ShellInstancer {
    fn config(&self, task: &dyn InstanceTask) -> Result<ShellConfig, JudgeError> {
        let section = task
            .config()
            .instance
            .as_ref()
            .ok_or_else(|| JudgeError::invalid_config(self.name(), "problem has no instance section"))?;
        let config: ShellConfig = section.config.decode(self.name())?;
        if config.timeout == 0 {
            return Err(JudgeError::invalid_config(self.name(), "timeout must be at least 1 second"));
        }
        Ok(config)
    }

    async fn run_script(&self, task: &dyn InstanceTask, script: &str, timeout: u64) -> anyhow::Result<()> {
        let mut command = SandboxCommand::new("bash")
            .args(["-e", "-c", script])
            .env("INSTANCE_ID", task.instance_id())
            .env("INSTANCE_DIR", task.work_dir());
        if let Some(data) = task.problem_data() {
            command = command.env("PROBLEM_DATA", data);
        }

        let exit = run_command(&command, task.work_dir(), Duration::from_secs(timeout))
            .await
            .context("failed to run instance script")?;
        if !exit.is_success() {
            bail!("instance script failed: {exit}");
        }
        Ok(())
    }
}

#[async_trait]
impl InstanceAdapter for ShellInstancer {
    fn name(&self) -> &str {
        "shell"
    }

    async fn start(&self, task: &dyn InstanceTask) -> anyhow::Result<()> {
        let config = self.config(task)?;
        if config.start.is_empty() {
            bail!("no start script configured");
        }
        info!(instance_id = %task.instance_id(), "starting shell instance");
        self.run_script(task, &config.start, config.timeout).await
    }

    async fn destroy(&self, task: &dyn InstanceTask) -> anyhow::Result<()> {
        let config = self.config(task)?;
        if config.destroy.is_empty() {
            return Ok(());
        }
        info!(instance_id = %task.instance_id(), "destroying shell instance");
        self.run_script(task, &config.destroy, config.timeout).await
    }
}
