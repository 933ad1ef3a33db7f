use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use judgeline_core::{load_config, resolve_config_path, AdapterRegistry, RunnerConfig};
use judgeline_remote::{ArtifactCache, RunnerApi, RunnerClient, StorageLayout};
use tracing::info;

mod daemon;
mod dispatch;
mod info;
mod instancer;
mod judge;
mod register;

pub use dispatch::dispatch;

/// Everything a poll loop needs, loaded from the runner config.
pub(crate) struct Runtime {
    pub config: RunnerConfig,
    pub api: Arc<dyn RunnerApi>,
    pub cache: ArtifactCache,
    pub registry: Arc<AdapterRegistry>,
}

impl Runtime {
    pub fn load(explicit: Option<&Path>, poll_interval: Option<u64>) -> anyhow::Result<Self> {
        let path = resolve_config_path(explicit);
        let mut config = load_config(&path)?;
        if let Some(secs) = poll_interval {
            config.poll_interval = secs;
        }

        let remote = config.remote_config()?;
        let storage = StorageLayout::new(&config.storage_path)?;
        storage
            .initialize()
            .with_context(|| format!("failed to prepare storage at {}", config.storage_path.display()))?;

        let registry = Arc::new(judgeline_adapters::builtin_registry(&storage)?);
        let api: Arc<dyn RunnerApi> = Arc::new(RunnerClient::new(remote)?);
        let cache = ArtifactCache::new(storage)?;

        info!(
            config = %path.display(),
            server = %config.server_addr,
            storage = %config.storage_path.display(),
            "runner configured"
        );
        Ok(Self {
            config,
            api,
            cache,
            registry,
        })
    }
}
