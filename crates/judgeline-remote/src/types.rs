//! Wire types for the runner protocol.

use std::collections::BTreeMap;

use judgeline_adapter_api::ProblemConfig;
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Control server base URL.
    pub url: String,

    /// Runner id sent as `X-AOI-Runner-Id`.
    pub runner_id: Option<String>,

    /// Runner key sent as `X-AOI-Runner-Key`.
    pub runner_key: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Retries for transient failures on reporting calls.
    pub max_retries: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            runner_id: None,
            runner_key: None,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl RemoteConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_credentials(mut self, runner_id: impl Into<String>, runner_key: impl Into<String>) -> Self {
        self.runner_id = Some(runner_id.into());
        self.runner_key = Some(runner_key.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), RemoteError> {
        if self.url.trim().is_empty() {
            return Err(RemoteError::Config {
                message: "server address not set".to_string(),
            });
        }
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(RemoteError::Config {
                message: format!("server address must be an http(s) URL: {}", self.url),
            });
        }
        Ok(())
    }
}

/// Response from `POST /api/runner/solution/poll`.
///
/// An empty `task_id` means there is no pending work.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollSolutionResponse {
    pub task_id: String,
    pub solution_id: String,
    pub problem_config: ProblemConfig,
    pub problem_data_url: String,
    pub problem_data_hash: String,
    pub solution_data_url: String,
    pub solution_data_hash: String,
    pub err_msg: String,
    pub env: BTreeMap<String, String>,
}

impl PollSolutionResponse {
    pub fn has_task(&self) -> bool {
        !self.task_id.is_empty()
    }

    pub fn task_ref(&self) -> SolutionTaskRef {
        SolutionTaskRef {
            solution_id: self.solution_id.clone(),
            task_id: self.task_id.clone(),
        }
    }
}

/// Response from `POST /api/runner/instance/poll`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollInstanceResponse {
    pub task_id: String,
    pub instance_id: String,
    pub org_id: String,
    pub user_id: String,
    pub problem_id: String,
    pub contest_id: String,
    pub state: i32,
    pub problem_config: ProblemConfig,
    pub problem_data_url: String,
    pub problem_data_hash: String,
    pub err_msg: String,
}

impl PollInstanceResponse {
    pub fn has_task(&self) -> bool {
        !self.task_id.is_empty()
    }

    pub fn task_ref(&self) -> InstanceTaskRef {
        InstanceTaskRef {
            instance_id: self.instance_id.clone(),
            task_id: self.task_id.clone(),
        }
    }
}

/// Instance lifecycle state as encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Destroyed,
    Destroying,
    Allocated,
    Allocating,
    Error,
}

impl TryFrom<i32> for InstanceState {
    type Error = RemoteError;

    fn try_from(value: i32) -> Result<Self, RemoteError> {
        match value {
            0 => Ok(Self::Destroyed),
            1 => Ok(Self::Destroying),
            2 => Ok(Self::Allocated),
            3 => Ok(Self::Allocating),
            4 => Ok(Self::Error),
            other => Err(RemoteError::InvalidResponse {
                message: format!("unknown instance state {other}"),
            }),
        }
    }
}

impl From<InstanceState> for i32 {
    fn from(state: InstanceState) -> i32 {
        match state {
            InstanceState::Destroyed => 0,
            InstanceState::Destroying => 1,
            InstanceState::Allocated => 2,
            InstanceState::Allocating => 3,
            InstanceState::Error => 4,
        }
    }
}

/// Addresses one claimed judge task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionTaskRef {
    pub solution_id: String,
    pub task_id: String,
}

/// Addresses one claimed instance task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceTaskRef {
    pub instance_id: String,
    pub task_id: String,
}

/// Body of `PATCH /api/runner/instance/task/{instanceId}/{taskId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchInstanceTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `POST /api/runner/instance/task/{instanceId}/{taskId}/complete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteTaskRequest {
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `POST /api/runner/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub version: String,
    pub labels: Vec<String>,
    pub registration_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub runner_id: String,
    pub runner_key: String,
}
