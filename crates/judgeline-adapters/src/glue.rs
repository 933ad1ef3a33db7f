//! Judge that delegates to an arbitrary command or inline bash script.
//!
//! The child sees:
//!
//! | variable             | value                            |
//! |----------------------|----------------------------------|
//! | `GLUE_PROBLEM_DATA`  | problem data archive             |
//! | `GLUE_SOLUTION_DATA` | solution data archive            |
//! | `GLUE_REPORT`        | report pipe (`key=value` lines)  |
//! | `GLUE_DETAILS`       | details JSON file to overwrite   |

use std::time::Duration;

use async_trait::async_trait;
use judgeline_adapter_api::{JudgeAdapter, JudgeError, JudgeTask};
use judgeline_core::sandbox::{SandboxCommand, SandboxWorkspace};
use judgeline_remote::StorageLayout;
use serde::Deserialize;
use tracing::warn;

const SCRIPT_HEADER: &str = "#!/bin/bash\n\nset -ex\n\n";

fn default_timeout() -> u64 {
    60
}

#[derive(Debug, Deserialize)]
struct GlueConfig {
    #[serde(default)]
    command: Vec<String>,

    #[serde(default)]
    run: String,

    /// Wall-clock limit in seconds.
    #[serde(default = "default_timeout")]
    timeout: u64,
}

#[derive(Debug, Clone)]
pub struct GlueAdapter {
    storage: StorageLayout,
}

impl GlueAdapter {
    pub fn new(storage: StorageLayout) -> Self {
        Self { storage }
    }

    fn config(&self, task: &dyn JudgeTask) -> Result<GlueConfig, JudgeError> {
        let config: GlueConfig = task.config().judge.config.decode(self.name())?;
        if config.timeout == 0 {
            return Err(JudgeError::invalid_config(self.name(), "timeout must be at least 1 second"));
        }
        if config.command.is_empty() && config.run.is_empty() {
            return Err(JudgeError::invalid_config(self.name(), "either `command` or `run` is required"));
        }
        Ok(config)
    }
}

#[async_trait]
impl JudgeAdapter for GlueAdapter {
    fn name(&self) -> &str {
        "glue"
    }

    async fn judge(&self, task: &dyn JudgeTask) -> Result<(), JudgeError> {
        let config = self.config(task)?;
        let workspace = SandboxWorkspace::create(&self.storage.tmp_dir(), "glue-").map_err(anyhow::Error::from)?;

        let command = if config.command.is_empty() {
            let script = workspace.path().join("run.sh");
            write_script(&script, &config.run).await?;
            SandboxCommand::new("bash").arg(script)
        } else {
            if !config.run.is_empty() {
                warn!("glue config sets both `command` and `run`; ignoring `run`");
            }
            SandboxCommand::from_argv(&config.command).map_err(anyhow::Error::from)?
        };
        let command = command
            .env("GLUE_PROBLEM_DATA", task.problem_data())
            .env("GLUE_SOLUTION_DATA", task.solution_data())
            .env("GLUE_REPORT", workspace.report_path())
            .env("GLUE_DETAILS", workspace.details_path());

        let outcome = workspace
            .run(&command, Duration::from_secs(config.timeout), task)
            .await
            .map_err(anyhow::Error::from)?;
        outcome.report(task).await;
        Ok(())
    }
}

async fn write_script(path: &std::path::Path, body: &str) -> Result<(), JudgeError> {
    tokio::fs::write(path, format!("{SCRIPT_HEADER}{body}")).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700)).await?;
    }
    Ok(())
}
