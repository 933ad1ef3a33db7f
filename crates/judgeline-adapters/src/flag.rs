//! Capture-the-flag style judge: the solution archive holds an `answer.json`
//! whose `flag` must equal the configured one.

use async_trait::async_trait;
use judgeline_adapter_api::{status, JudgeAdapter, JudgeError, JudgeTask, SolutionDetails, SolutionInfo};
use judgeline_remote::StorageLayout;
use serde::Deserialize;
use tracing::debug;

use crate::archive::extract_solution;

const ANSWER_FILE: &str = "answer.json";

#[derive(Debug, Deserialize)]
struct FlagConfig {
    flag: String,
}

#[derive(Debug, Deserialize)]
struct Answer {
    #[serde(default)]
    flag: String,
}

#[derive(Debug, Clone)]
pub struct FlagAdapter {
    storage: StorageLayout,
}

impl FlagAdapter {
    pub fn new(storage: StorageLayout) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl JudgeAdapter for FlagAdapter {
    fn name(&self) -> &str {
        "flag"
    }

    async fn judge(&self, task: &dyn JudgeTask) -> Result<(), JudgeError> {
        let config: FlagConfig = task.config().judge.config.decode(self.name())?;
        if config.flag.is_empty() {
            return Err(JudgeError::invalid_config(self.name(), "flag must not be empty"));
        }

        let solution = extract_solution(task.solution_data(), &self.storage.tmp_dir()).await?;
        let answer_path = solution.path().join(ANSWER_FILE);

        let raw = match tokio::fs::read(&answer_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return wrong_answer(task, "answer.json not found").await;
            }
            Err(e) => return Err(e.into()),
        };
        let answer: Answer = match serde_json::from_slice(&raw) {
            Ok(answer) => answer,
            Err(e) => {
                debug!(error = %e, "unparsable answer file");
                return wrong_answer(task, "answer.json is not valid").await;
            }
        };

        if answer.flag == config.flag {
            task.update(&SolutionInfo::new(100.0, status::ACCEPTED, "")).await?;
            task.upload_details(&SolutionDetails::with_summary("Accepted")).await?;
            Ok(())
        } else {
            wrong_answer(task, "Wrong Answer").await
        }
    }
}

async fn wrong_answer(task: &dyn JudgeTask, summary: &str) -> Result<(), JudgeError> {
    task.update(&SolutionInfo::new(0.0, status::WRONG_ANSWER, "")).await?;
    task.upload_details(&SolutionDetails::with_summary(summary)).await?;
    Ok(())
}
