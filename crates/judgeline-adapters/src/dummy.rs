//! Judge that accepts everything; used to smoke-test a deployment.

use std::collections::BTreeMap;

use async_trait::async_trait;
use judgeline_adapter_api::{
    DetailsJob, DetailsTest, JudgeAdapter, JudgeError, JudgeTask, SolutionDetails, SolutionInfo,
};
use serde::Deserialize;

const ACCEPTED: &str = "AC";

#[derive(Debug, Default, Deserialize)]
struct DummyConfig {
    #[serde(default)]
    ping: String,
}

#[derive(Debug, Default)]
pub struct DummyAdapter;

#[async_trait]
impl JudgeAdapter for DummyAdapter {
    fn name(&self) -> &str {
        "dummy"
    }

    async fn judge(&self, task: &dyn JudgeTask) -> Result<(), JudgeError> {
        let config: DummyConfig = task.config().judge.config.decode(self.name())?;

        let metrics = BTreeMap::from([("cpu".to_string(), 0.0), ("mem".to_string(), 0.0)]);
        task.update(&SolutionInfo::new(100.0, ACCEPTED, "Well Done! Accepted").with_metrics(metrics))
            .await?;

        let details = SolutionDetails {
            jobs: vec![DetailsJob {
                name: "Group 1".into(),
                score: 100.0,
                score_scale: 100.0,
                status: ACCEPTED.into(),
                tests: vec![DetailsTest {
                    name: "Test 1".into(),
                    score: 100.0,
                    status: ACCEPTED.into(),
                    summary: "Accepted".into(),
                }],
                summary: "Accepted".into(),
            }],
            summary: format!("Accepted\nPing is: `{}`", config.ping),
            ..SolutionDetails::default()
        };
        task.upload_details(&details).await?;
        Ok(())
    }
}
