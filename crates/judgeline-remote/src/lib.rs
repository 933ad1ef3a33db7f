//! Remote side of a judgeline runner.
//!
//! This crate provides:
//!
//! - [`RunnerClient`], the HTTP client for the control server's runner API
//! - [`RunnerApi`], the transport-agnostic surface the engine depends on
//! - [`ArtifactCache`], a content-addressed download cache keyed by SHA-256
//! - [`StorageLayout`], the on-disk layout (`tmp/`, `cache/`, `instances/`)
//!
//! # Quick Start
//!
//! ```no_run
//! use judgeline_remote::{ArtifactCache, RemoteConfig, RunnerApi, RunnerClient, StorageLayout};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = RemoteConfig::default()
//!     .with_url("https://judge.example.org")
//!     .with_credentials("runner-id", "runner-key");
//! let client = RunnerClient::new(config)?;
//!
//! let layout = StorageLayout::new("/var/lib/judgeline")?;
//! layout.initialize()?;
//! let cache = ArtifactCache::new(layout)?;
//!
//! let poll = client.poll_solution().await?;
//! if !poll.task_id.is_empty() {
//!     let data = cache.prepare(&poll.problem_data_url, &poll.problem_data_hash).await?;
//!     println!("problem data at {}", data.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod client;
pub mod digest;
pub mod error;
pub mod storage;
pub mod types;

pub use api::RunnerApi;
pub use cache::{ArtifactCache, DOWNLOAD_ATTEMPTS};
pub use client::{RunnerClient, RUNNER_USER_AGENT};
pub use error::{RemoteError, RemoteResult};
pub use storage::StorageLayout;
pub use types::{
    CompleteTaskRequest, InstanceState, InstanceTaskRef, PatchInstanceTaskRequest,
    PollInstanceResponse, PollSolutionResponse, RegisterRequest, RegisterResponse, RemoteConfig,
    SolutionTaskRef,
};
