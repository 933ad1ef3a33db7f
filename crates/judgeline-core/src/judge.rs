//! Judge task dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use judgeline_adapter_api::{status, JudgeAdapter, JudgeError, JudgeTask, SolutionInfo};
use judgeline_remote::{ArtifactCache, PollSolutionResponse, RunnerApi, SolutionTaskRef};
use tracing::{error, info, warn};

use crate::poller::{Claim, Dispatcher};
use crate::registry::AdapterRegistry;
use crate::shutdown::Shutdown;
use crate::task::RemoteJudgeTask;

pub const SERVER_ERROR_MESSAGE: &str = "Server side error occurred";

/// Which loop drives the dispatcher; only changes the progress labels sent
/// while a task waits for a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeMode {
    Serial,
    Parallel,
}

pub struct JudgeDispatcher {
    api: Arc<dyn RunnerApi>,
    cache: ArtifactCache,
    registry: Arc<AdapterRegistry>,
    mode: JudgeMode,
}

/// A claimed task with its inputs prepared.
pub struct ClaimedJudge {
    task_ref: SolutionTaskRef,
    adapter: Arc<dyn JudgeAdapter>,
    task: RemoteJudgeTask,
}

impl JudgeDispatcher {
    pub fn new(
        api: Arc<dyn RunnerApi>,
        cache: ArtifactCache,
        registry: Arc<AdapterRegistry>,
        mode: JudgeMode,
    ) -> Self {
        Self {
            api,
            cache,
            registry,
            mode,
        }
    }

    async fn patch(&self, task: &SolutionTaskRef, info: SolutionInfo) {
        if let Err(e) = self.api.patch_solution_task(task, &info).await {
            warn!(task_id = %task.task_id, error = %e, "failed to patch task");
        }
    }

    async fn complete(&self, task: &SolutionTaskRef) {
        if let Err(e) = self.api.complete_solution_task(task).await {
            warn!(task_id = %task.task_id, error = %e, "failed to complete task");
        }
    }

    /// Upload the error details and result for a failed run.
    async fn report_error(&self, task: &SolutionTaskRef, err: &JudgeError) {
        if let Err(e) = self.api.upload_solution_details(task, &err.details()).await {
            warn!(task_id = %task.task_id, error = %e, "failed to upload error details");
        }
        self.patch(task, err.info()).await;
    }

    /// Everything between a successful poll and the adapter run.
    async fn prepare(&self, poll: PollSolutionResponse) -> Claim<ClaimedJudge> {
        let task_ref = poll.task_ref();

        if !poll.err_msg.is_empty() {
            warn!(task_id = %task_ref.task_id, err_msg = %poll.err_msg, "server reported an error for task");
            self.patch(
                &task_ref,
                SolutionInfo::new(0.0, status::JUDGE_ERROR, SERVER_ERROR_MESSAGE),
            )
            .await;
            self.complete(&task_ref).await;
            return Claim::Resolved;
        }

        info!(
            task_id = %task_ref.task_id,
            solution_id = %task_ref.solution_id,
            adapter = %poll.problem_config.judge_adapter(),
            "got judge task"
        );

        let progress = match self.mode {
            JudgeMode::Serial => status::RUNNING,
            JudgeMode::Parallel => status::QUEUED,
        };
        self.patch(&task_ref, SolutionInfo::new(0.0, progress, "Preparing solution"))
            .await;

        let adapter_name = poll.problem_config.judge_adapter().to_string();
        let Some(adapter) = self.registry.judge(&adapter_name) else {
            warn!(task_id = %task_ref.task_id, adapter = %adapter_name, "judge adapter not found");
            self.patch(
                &task_ref,
                SolutionInfo::new(
                    0.0,
                    status::JUDGE_ERROR,
                    format!("Judge adapter not found: {adapter_name}"),
                ),
            )
            .await;
            self.complete(&task_ref).await;
            return Claim::Resolved;
        };

        let inputs = async {
            let problem = self
                .cache
                .prepare(&poll.problem_data_url, &poll.problem_data_hash)
                .await
                .map_err(|e| anyhow::Error::new(e).context("failed to prepare problem data"))?;
            let solution = self
                .cache
                .prepare(&poll.solution_data_url, &poll.solution_data_hash)
                .await
                .map_err(|e| anyhow::Error::new(e).context("failed to prepare solution data"))?;
            Ok::<_, anyhow::Error>((problem, solution))
        };
        let (problem_data, solution_data) = match inputs.await {
            Ok(paths) => paths,
            Err(e) => {
                error!(task_id = %task_ref.task_id, error = %format!("{e:#}"), "failed to prepare task inputs");
                self.report_error(&task_ref, &JudgeError::Other(e)).await;
                self.complete(&task_ref).await;
                return Claim::Resolved;
            }
        };

        let next = match self.mode {
            JudgeMode::Serial => SolutionInfo::new(0.0, status::RUNNING, "Judging"),
            JudgeMode::Parallel => SolutionInfo::new(0.0, status::QUEUED, "Waiting for judge"),
        };
        self.patch(&task_ref, next).await;

        let task = RemoteJudgeTask::new(
            Arc::clone(&self.api),
            task_ref.clone(),
            poll.problem_config,
            poll.env,
            problem_data,
            solution_data,
        );
        Claim::Ready(ClaimedJudge {
            task_ref,
            adapter,
            task,
        })
    }
}

#[async_trait]
impl Dispatcher for JudgeDispatcher {
    type Work = ClaimedJudge;

    async fn claim(&self, shutdown: &Shutdown) -> Claim<ClaimedJudge> {
        let polled = tokio::select! {
            polled = self.api.poll_solution() => polled,
            _ = shutdown.triggered() => return Claim::Idle,
        };
        match polled {
            Ok(poll) if poll.has_task() => self.prepare(poll).await,
            Ok(_) => Claim::Idle,
            Err(e) => {
                warn!(error = %e, "solution poll failed");
                Claim::Idle
            }
        }
    }

    async fn execute(&self, work: ClaimedJudge) {
        let ClaimedJudge {
            task_ref,
            adapter,
            task,
        } = work;

        if self.mode == JudgeMode::Parallel {
            self.patch(&task_ref, SolutionInfo::new(0.0, status::RUNNING, "Judging"))
                .await;
        }

        match adapter.judge(&task).await {
            Ok(()) => info!(task_id = %task_ref.task_id, adapter = %adapter.name(), "judge finished"),
            Err(e) => {
                warn!(task_id = %task_ref.task_id, adapter = %adapter.name(), error = %e, "judge finished with error");
                self.report_error(&task_ref, &e).await;
            }
        }

        self.complete(&task_ref).await;
    }
}

/// Run a judge adapter against a local task, reporting an adapter error
/// through the task the same way the remote dispatcher does.
pub async fn judge_local(adapter: &dyn JudgeAdapter, task: &dyn JudgeTask) -> Result<(), JudgeError> {
    match adapter.judge(task).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Err(report) = task.upload_details(&e.details()).await {
                warn!(error = %report, "failed to record error details");
            }
            if let Err(report) = task.update(&e.info()).await {
                warn!(error = %report, "failed to record error result");
            }
            Err(e)
        }
    }
}
