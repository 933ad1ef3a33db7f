use async_trait::async_trait;

use crate::error::JudgeError;
use crate::task::{InstanceTask, JudgeTask};

/// Grades solutions.
///
/// Implementations report through the task as they go. Returning `Ok(())`
/// means the adapter has already reported its verdict; an error is turned
/// into a failure report by the engine.
#[async_trait]
pub trait JudgeAdapter: Send + Sync {
    fn name(&self) -> &str;

    async fn judge(&self, task: &dyn JudgeTask) -> Result<(), JudgeError>;
}

/// Provisions and tears down long-lived problem instances.
///
/// The engine sends the terminal `complete` call; adapters only `patch`.
#[async_trait]
pub trait InstanceAdapter: Send + Sync {
    fn name(&self) -> &str;

    async fn start(&self, task: &dyn InstanceTask) -> anyhow::Result<()>;

    async fn destroy(&self, task: &dyn InstanceTask) -> anyhow::Result<()>;
}
