//! Instance task dispatch.
//!
//! The engine owns `instances/<id>/`: it is created before an adapter starts
//! the instance and removed after a successful destroy. A destroy whose
//! directory is already gone succeeds without calling the adapter.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use judgeline_adapter_api::{InstanceAction, InstanceAdapter};
use judgeline_remote::{
    ArtifactCache, InstanceState, InstanceTaskRef, PollInstanceResponse, RunnerApi,
};
use tracing::{info, warn};

use crate::judge::SERVER_ERROR_MESSAGE;
use crate::poller::{Claim, Dispatcher};
use crate::registry::AdapterRegistry;
use crate::shutdown::Shutdown;
use crate::task::RemoteInstanceTask;

/// Markdown checklist published while an instance task runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressLog {
    text: String,
}

impl ProgressLog {
    pub fn new(title: &str) -> Self {
        Self {
            text: format!("{title}\n"),
        }
    }

    pub fn step(&mut self, name: &str) {
        self.text.push_str("- ");
        self.text.push_str(name);
    }

    pub fn ok(&mut self) {
        self.text.push_str(" ✅\n");
    }

    pub fn fail(&mut self, err: &anyhow::Error) {
        self.text
            .push_str(&format!(" ❌\n\nError:\n\n```\n{err:#}\n```\n"));
    }

    pub fn line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

pub struct InstanceDispatcher {
    api: Arc<dyn RunnerApi>,
    cache: ArtifactCache,
    registry: Arc<AdapterRegistry>,
}

/// Reporting context for one instance task.
struct Progress<'a> {
    api: &'a dyn RunnerApi,
    task: &'a InstanceTaskRef,
    log: ProgressLog,
}

impl Progress<'_> {
    async fn publish(&self) {
        if let Err(e) = self.api.patch_instance_task(self.task, self.log.as_str()).await {
            warn!(task_id = %self.task.task_id, error = %e, "failed to patch instance task");
        }
    }

    fn step(&mut self, name: &str) {
        self.log.step(name);
    }

    async fn ok(&mut self) {
        self.log.ok();
        self.publish().await;
    }

    async fn complete(&self, succeeded: bool) {
        if let Err(e) = self
            .api
            .complete_instance_task(self.task, succeeded, self.log.as_str())
            .await
        {
            warn!(task_id = %self.task.task_id, error = %e, "failed to complete instance task");
        }
    }

    async fn fail(mut self, err: anyhow::Error) {
        warn!(task_id = %self.task.task_id, error = %format!("{err:#}"), "instance task failed");
        self.log.fail(&err);
        self.complete(false).await;
    }
}

impl InstanceDispatcher {
    pub fn new(api: Arc<dyn RunnerApi>, cache: ArtifactCache, registry: Arc<AdapterRegistry>) -> Self {
        Self {
            api,
            cache,
            registry,
        }
    }

    fn adapter_for(&self, poll: &PollInstanceResponse) -> anyhow::Result<Arc<dyn InstanceAdapter>> {
        let name = poll
            .problem_config
            .instance_adapter()
            .ok_or_else(|| anyhow::anyhow!("instance not configured"))?;
        self.registry
            .instancer(name)
            .ok_or_else(|| anyhow::anyhow!("instance adapter not found: {name}"))
    }

    fn instance_dir(&self, poll: &PollInstanceResponse) -> anyhow::Result<PathBuf> {
        Ok(self.cache.layout().instance_dir(&poll.instance_id)?)
    }

    fn task(
        &self,
        poll: &PollInstanceResponse,
        action: InstanceAction,
        problem_data: Option<PathBuf>,
        work_dir: PathBuf,
    ) -> RemoteInstanceTask {
        RemoteInstanceTask::new(
            Arc::clone(&self.api),
            poll.task_ref(),
            action,
            poll.problem_config.clone(),
            problem_data,
            work_dir,
        )
    }

    async fn start(&self, poll: &PollInstanceResponse) {
        let task_ref = poll.task_ref();
        let mut progress = Progress {
            api: self.api.as_ref(),
            task: &task_ref,
            log: ProgressLog::new("Starting instance"),
        };
        progress.publish().await;

        progress.step("Prepare problem data");
        let problem_data = match self
            .cache
            .prepare(&poll.problem_data_url, &poll.problem_data_hash)
            .await
        {
            Ok(path) => path,
            Err(e) => return progress.fail(e.into()).await,
        };
        progress.ok().await;

        progress.step("Prepare adapter");
        let adapter = match self.adapter_for(poll) {
            Ok(adapter) => adapter,
            Err(e) => return progress.fail(e).await,
        };
        progress.ok().await;

        progress.step("Prepare instance directory");
        let work_dir = match self.instance_dir(poll) {
            Ok(dir) => dir,
            Err(e) => return progress.fail(e).await,
        };
        if let Err(e) = tokio::fs::create_dir_all(&work_dir).await {
            return progress.fail(e.into()).await;
        }
        progress.ok().await;

        progress.step("Start instance");
        let task = self.task(poll, InstanceAction::Start, Some(problem_data), work_dir);
        if let Err(e) = adapter.start(&task).await {
            return progress.fail(e).await;
        }
        progress.log.ok();
        progress.log.line("Instance started successfully");
        info!(instance_id = %task_ref.instance_id, adapter = %adapter.name(), "instance started");
        progress.complete(true).await;
    }

    async fn destroy(&self, poll: &PollInstanceResponse) {
        let task_ref = poll.task_ref();
        let mut progress = Progress {
            api: self.api.as_ref(),
            task: &task_ref,
            log: ProgressLog::new("Destroying instance"),
        };
        progress.publish().await;

        progress.step("Locate instance directory");
        let work_dir = match self.instance_dir(poll) {
            Ok(dir) => dir,
            Err(e) => return progress.fail(e).await,
        };
        let exists = match tokio::fs::try_exists(&work_dir).await {
            Ok(exists) => exists,
            Err(e) => {
                let err = anyhow::Error::new(e)
                    .context(format!("cannot inspect instance directory {}", work_dir.display()));
                return progress.fail(err).await;
            }
        };
        if !exists {
            progress.log.ok();
            progress.log.line("Instance directory absent; nothing to destroy");
            progress.log.line("Instance destroyed successfully");
            info!(instance_id = %task_ref.instance_id, "instance already gone");
            return progress.complete(true).await;
        }
        progress.ok().await;

        progress.step("Prepare adapter");
        let adapter = match self.adapter_for(poll) {
            Ok(adapter) => adapter,
            Err(e) => return progress.fail(e).await,
        };
        progress.ok().await;

        progress.step("Destroy instance");
        let task = self.task(poll, InstanceAction::Destroy, None, work_dir.clone());
        if let Err(e) = adapter.destroy(&task).await {
            return progress.fail(e).await;
        }
        progress.ok().await;

        progress.step("Clean up instance directory");
        if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
            return progress.fail(e.into()).await;
        }
        progress.log.ok();
        progress.log.line("Instance destroyed successfully");
        info!(instance_id = %task_ref.instance_id, adapter = %adapter.name(), "instance destroyed");
        progress.complete(true).await;
    }
}

#[async_trait]
impl Dispatcher for InstanceDispatcher {
    type Work = PollInstanceResponse;

    async fn claim(&self, shutdown: &Shutdown) -> Claim<PollInstanceResponse> {
        let polled = tokio::select! {
            polled = self.api.poll_instance() => polled,
            _ = shutdown.triggered() => return Claim::Idle,
        };
        let poll = match polled {
            Ok(poll) if poll.has_task() => poll,
            Ok(_) => return Claim::Idle,
            Err(e) => {
                warn!(error = %e, "instance poll failed");
                return Claim::Idle;
            }
        };

        if !poll.err_msg.is_empty() {
            let task_ref = poll.task_ref();
            warn!(task_id = %task_ref.task_id, err_msg = %poll.err_msg, "server reported an error for task");
            if let Err(e) = self
                .api
                .complete_instance_task(&task_ref, false, SERVER_ERROR_MESSAGE)
                .await
            {
                warn!(task_id = %task_ref.task_id, error = %e, "failed to complete instance task");
            }
            return Claim::Resolved;
        }

        Claim::Ready(poll)
    }

    async fn execute(&self, poll: PollInstanceResponse) {
        info!(
            task_id = %poll.task_id,
            instance_id = %poll.instance_id,
            problem_id = %poll.problem_id,
            state = poll.state,
            "got instance task"
        );

        match InstanceState::try_from(poll.state) {
            Ok(InstanceState::Allocating) => self.start(&poll).await,
            Ok(InstanceState::Destroying) => self.destroy(&poll).await,
            _ => {
                let task_ref = poll.task_ref();
                let message = format!("Task error:\n\n```\nunexpected instance state: {}\n```", poll.state);
                warn!(task_id = %task_ref.task_id, state = poll.state, "unexpected instance state");
                if let Err(e) = self
                    .api
                    .complete_instance_task(&task_ref, false, &message)
                    .await
                {
                    warn!(task_id = %task_ref.task_id, error = %e, "failed to complete instance task");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_log_renders_checklist() {
        let mut log = ProgressLog::new("Starting instance");
        log.step("Prepare problem data");
        log.ok();
        log.step("Prepare adapter");
        log.fail(&anyhow::anyhow!("instance not configured"));

        assert_eq!(
            log.as_str(),
            "Starting instance\n- Prepare problem data ✅\n- Prepare adapter ❌\n\nError:\n\n```\ninstance not configured\n```\n"
        );
    }
}
