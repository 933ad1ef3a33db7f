//! Control server client.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::time::Duration;

use async_trait::async_trait;
use judgeline_adapter_api::{SolutionDetails, SolutionInfo};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::api::RunnerApi;
use crate::error::{RemoteError, RemoteResult};
use crate::types::{
    CompleteTaskRequest, InstanceTaskRef, PatchInstanceTaskRequest, PollInstanceResponse,
    PollSolutionResponse, RegisterRequest, RegisterResponse, RemoteConfig, SolutionTaskRef,
};

mod http;

use http::{HttpBackend, Retry};

pub const RUNNER_USER_AGENT: &str = concat!("judgeline/", env!("CARGO_PKG_VERSION"));

const RUNNER_ID_HEADER: &str = "x-aoi-runner-id";
const RUNNER_KEY_HEADER: &str = "x-aoi-runner-key";

/// HTTP client for the runner API.
#[derive(Debug, Clone)]
pub struct RunnerClient {
    http: HttpBackend,
}

impl RunnerClient {
    pub fn new(config: RemoteConfig) -> RemoteResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(RUNNER_USER_AGENT));
        if let Some(id) = &config.runner_id {
            default_headers.insert(
                HeaderName::from_static(RUNNER_ID_HEADER),
                header_value("runner id", id)?,
            );
        }
        if let Some(key) = &config.runner_key {
            let mut value = header_value("runner key", key)?;
            value.set_sensitive(true);
            default_headers.insert(HeaderName::from_static(RUNNER_KEY_HEADER), value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| RemoteError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        let base_url = config.url.trim_end_matches('/').to_string();

        Ok(Self {
            http: HttpBackend {
                client,
                base_url,
                config,
            },
        })
    }

    pub fn base_url(&self) -> &str {
        &self.http.base_url
    }

    /// Exchange a registration token for runner credentials.
    pub async fn register(&self, request: &RegisterRequest) -> RemoteResult<RegisterResponse> {
        debug!(name = %request.name, "registering runner");
        self.call(Method::POST, "/api/runner/register", request, Retry::Never)
            .await
    }

    async fn call<B, T>(&self, method: Method, path: &str, body: &B, retry: Retry) -> RemoteResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, retry).await?;
        response.json::<T>().await.map_err(|e| RemoteError::InvalidResponse {
            message: format!("failed to decode {}: {}", path, e),
        })
    }

    async fn send<B>(&self, method: Method, path: &str, body: &B, retry: Retry) -> RemoteResult<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).map_err(|e| RemoteError::InvalidResponse {
            message: format!("failed to encode request body: {}", e),
        })?;
        self.http.request(method, path, &body, retry).await
    }
}

fn header_value(what: &str, value: &str) -> RemoteResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| RemoteError::Config {
        message: format!("{what} contains characters not allowed in a header"),
    })
}

fn solution_task_path(task: &SolutionTaskRef) -> String {
    format!(
        "/api/runner/solution/task/{}/{}",
        task.solution_id, task.task_id
    )
}

fn instance_task_path(task: &InstanceTaskRef) -> String {
    format!(
        "/api/runner/instance/task/{}/{}",
        task.instance_id, task.task_id
    )
}

fn empty_body() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

#[async_trait]
impl RunnerApi for RunnerClient {
    async fn poll_solution(&self) -> RemoteResult<PollSolutionResponse> {
        self.call(
            Method::POST,
            "/api/runner/solution/poll",
            &empty_body(),
            Retry::Never,
        )
        .await
    }

    async fn patch_solution_task(&self, task: &SolutionTaskRef, info: &SolutionInfo) -> RemoteResult<()> {
        self.send(Method::PATCH, &solution_task_path(task), info, Retry::Transient)
            .await?;
        Ok(())
    }

    async fn upload_solution_details(
        &self,
        task: &SolutionTaskRef,
        details: &SolutionDetails,
    ) -> RemoteResult<()> {
        let path = format!("{}/details", solution_task_path(task));
        self.send(Method::POST, &path, details, Retry::Transient).await?;
        Ok(())
    }

    async fn complete_solution_task(&self, task: &SolutionTaskRef) -> RemoteResult<()> {
        let path = format!("{}/complete", solution_task_path(task));
        self.send(Method::POST, &path, &empty_body(), Retry::Transient)
            .await?;
        Ok(())
    }

    async fn poll_instance(&self) -> RemoteResult<PollInstanceResponse> {
        self.call(
            Method::POST,
            "/api/runner/instance/poll",
            &empty_body(),
            Retry::Never,
        )
        .await
    }

    async fn patch_instance_task(&self, task: &InstanceTaskRef, message: &str) -> RemoteResult<()> {
        let body = PatchInstanceTaskRequest {
            message: Some(message.to_string()),
        };
        self.send(Method::PATCH, &instance_task_path(task), &body, Retry::Transient)
            .await?;
        Ok(())
    }

    async fn complete_instance_task(
        &self,
        task: &InstanceTaskRef,
        succeeded: bool,
        message: &str,
    ) -> RemoteResult<()> {
        let path = format!("{}/complete", instance_task_path(task));
        let body = CompleteTaskRequest {
            succeeded,
            message: Some(message.to_string()),
        };
        self.send(Method::POST, &path, &body, Retry::Transient).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_carries_version() {
        assert!(RUNNER_USER_AGENT.starts_with("judgeline/"));
    }

    #[test]
    fn rejects_bad_credentials() {
        let config = RemoteConfig::default()
            .with_url("http://localhost")
            .with_credentials("id", "key\nwith newline");
        assert!(matches!(
            RunnerClient::new(config),
            Err(RemoteError::Config { .. })
        ));
    }

    #[test]
    fn trims_trailing_slash() {
        let client = RunnerClient::new(RemoteConfig::default().with_url("http://localhost:1/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:1");
    }

    #[test]
    fn task_paths() {
        let task = SolutionTaskRef {
            solution_id: "s".into(),
            task_id: "t".into(),
        };
        assert_eq!(solution_task_path(&task), "/api/runner/solution/task/s/t");
        let task = InstanceTaskRef {
            instance_id: "i".into(),
            task_id: "t".into(),
        };
        assert_eq!(instance_task_path(&task), "/api/runner/instance/task/i/t");
    }
}
