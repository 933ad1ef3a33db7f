//! Judge scripts written for Deno.
//!
//! Both archives are unpacked into private directories and the configured
//! script (relative to the problem root) runs with read access limited to
//! those two directories and write access limited to the report pipe and the
//! details file.

use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use judgeline_adapter_api::{JudgeAdapter, JudgeError, JudgeTask};
use judgeline_core::sandbox::{SandboxCommand, SandboxWorkspace};
use judgeline_remote::StorageLayout;
use serde::Deserialize;

use crate::archive::{extract_solution, extract_to_temp};

fn default_timeout() -> u64 {
    60
}

#[derive(Debug, Deserialize)]
struct DenoConfig {
    script: String,

    #[serde(default = "default_timeout")]
    timeout: u64,
}

#[derive(Debug, Clone)]
pub struct DenoAdapter {
    storage: StorageLayout,
}

impl DenoAdapter {
    pub fn new(storage: StorageLayout) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl JudgeAdapter for DenoAdapter {
    fn name(&self) -> &str {
        "deno"
    }

    async fn judge(&self, task: &dyn JudgeTask) -> Result<(), JudgeError> {
        let config: DenoConfig = task.config().judge.config.decode(self.name())?;
        if config.timeout == 0 {
            return Err(JudgeError::invalid_config(self.name(), "timeout must be at least 1 second"));
        }
        let script = Path::new(&config.script);
        if config.script.is_empty() || script.is_absolute() {
            return Err(JudgeError::invalid_config(
                self.name(),
                "script must be a path relative to the problem data",
            ));
        }

        let tmp = self.storage.tmp_dir();
        let problem = extract_to_temp(task.problem_data(), &tmp, "problem-").await?;
        let script = problem.path().join(script);
        if !script.is_file() {
            return Err(anyhow::anyhow!("judge script {} not found in problem data", config.script).into());
        }
        let solution = extract_solution(task.solution_data(), &tmp).await?;

        let workspace = SandboxWorkspace::create(&tmp, "deno-").map_err(anyhow::Error::from)?;
        let command = SandboxCommand::new("deno")
            .arg("run")
            .arg(flag_with_paths("--allow-read=", &[problem.path(), solution.path()]))
            .arg(flag_with_paths(
                "--allow-write=",
                &[workspace.report_path(), workspace.details_path()],
            ))
            .arg("--no-prompt")
            .arg(&script)
            .inherit_env("HOME")
            .inherit_env("DENO_DIR")
            .env("JUDGELINE_PROBLEM_DATA_DIR", problem.path())
            .env("JUDGELINE_SOLUTION_DATA_DIR", solution.path())
            .env("JUDGELINE_REPORT", workspace.report_path())
            .env("JUDGELINE_DETAILS", workspace.details_path());

        let outcome = workspace
            .run(&command, Duration::from_secs(config.timeout), task)
            .await
            .map_err(anyhow::Error::from)?;
        outcome.report(task).await;
        Ok(())
    }
}

fn flag_with_paths(flag: &str, paths: &[&Path]) -> OsString {
    let mut out = OsString::from(flag);
    for (i, path) in paths.iter().enumerate() {
        if i > 0 {
            out.push(",");
        }
        out.push(path.as_os_str());
    }
    out
}
