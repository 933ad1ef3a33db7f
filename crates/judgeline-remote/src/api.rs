//! Transport-agnostic runner API.

use async_trait::async_trait;
use judgeline_adapter_api::{SolutionDetails, SolutionInfo};

use crate::error::RemoteResult;
use crate::types::{InstanceTaskRef, PollInstanceResponse, PollSolutionResponse, SolutionTaskRef};

/// The control server calls the engine makes.
///
/// [`crate::RunnerClient`] implements this over HTTP; tests substitute an
/// in-memory fake.
#[async_trait]
pub trait RunnerApi: Send + Sync {
    async fn poll_solution(&self) -> RemoteResult<PollSolutionResponse>;

    async fn patch_solution_task(&self, task: &SolutionTaskRef, info: &SolutionInfo) -> RemoteResult<()>;

    async fn upload_solution_details(
        &self,
        task: &SolutionTaskRef,
        details: &SolutionDetails,
    ) -> RemoteResult<()>;

    async fn complete_solution_task(&self, task: &SolutionTaskRef) -> RemoteResult<()>;

    async fn poll_instance(&self) -> RemoteResult<PollInstanceResponse>;

    async fn patch_instance_task(&self, task: &InstanceTaskRef, message: &str) -> RemoteResult<()>;

    async fn complete_instance_task(
        &self,
        task: &InstanceTaskRef,
        succeeded: bool,
        message: &str,
    ) -> RemoteResult<()>;
}
