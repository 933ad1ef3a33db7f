//! Task execution engine for judgeline runners.
//!
//! The engine polls the control server for work, prepares inputs through the
//! content-addressed cache, and hands each task to the adapter registered
//! under the name the problem asks for.
//!
//! - [`poller`]: serial loop and worker pool, both driving a [`Dispatcher`]
//! - [`judge`] / [`instance`]: the two dispatchers
//! - [`registry`]: explicit adapter registry built at startup
//! - [`sandbox`] and [`report`]: sandboxed child processes and their
//!   streaming report protocol (unix only)
//! - [`config`]: the runner's YAML configuration

pub mod config;
pub mod instance;
pub mod judge;
pub mod poller;
pub mod queue;
pub mod registry;
pub mod report;
#[cfg(unix)]
pub mod sandbox;
pub mod shutdown;
pub mod task;

pub use config::{
    load_config, load_config_or_default, resolve_config_path, save_config, ConfigError, RunnerConfig,
};
pub use instance::{InstanceDispatcher, ProgressLog};
pub use judge::{judge_local, JudgeDispatcher, JudgeMode};
pub use poller::{run_parallel, run_serial, Claim, Dispatcher};
pub use registry::{AdapterRegistry, AdapterRegistryBuilder, RegistryError};
pub use shutdown::{shutdown_channel, spawn_signal_handler, Shutdown, ShutdownTrigger};
pub use task::{LocalJudgeTask, RemoteInstanceTask, RemoteJudgeTask};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
