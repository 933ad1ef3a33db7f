//! Runner configuration file.

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use judgeline_remote::RemoteConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "JUDGELINE_CONFIG";
pub const SYSTEM_CONFIG_PATH: &str = "/etc/judgeline/config.yaml";
pub const LOCAL_CONFIG_PATH: &str = "config.yaml";
pub const DEFAULT_STORAGE_PATH: &str = "/var/lib/judgeline";

#[derive(Debug)]
pub struct ConfigError(pub String);

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConfigError: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server_addr: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner_key: Option<String>,

    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    /// Seconds to wait after an idle or failed poll.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_PATH)
}

fn default_poll_interval() -> u64 {
    1
}

fn default_concurrency() -> usize {
    1
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            server_addr: String::new(),
            runner_id: None,
            runner_key: None,
            storage_path: default_storage_path(),
            poll_interval: default_poll_interval(),
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            labels: Vec::new(),
        }
    }
}

impl RunnerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn is_registered(&self) -> bool {
        self.runner_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Client settings for a registered runner.
    pub fn remote_config(&self) -> Result<RemoteConfig, ConfigError> {
        if self.server_addr.is_empty() {
            return Err(ConfigError("serverAddr not set".into()));
        }
        let runner_id = self
            .runner_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError("runnerId not set; run `judgeline register` first".into()))?;
        let runner_key = self
            .runner_key
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError("runnerKey not set; run `judgeline register` first".into()))?;

        Ok(RemoteConfig::default()
            .with_url(&self.server_addr)
            .with_credentials(runner_id, runner_key)
            .with_timeout_secs(self.timeout_secs)
            .with_max_retries(self.max_retries))
    }
}

/// Resolve the config path: explicit flag, then `JUDGELINE_CONFIG`, then the
/// system path if it exists, then `./config.yaml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    let system = Path::new(SYSTEM_CONFIG_PATH);
    if system.exists() {
        return system.to_path_buf();
    }
    PathBuf::from(LOCAL_CONFIG_PATH)
}

pub fn load_config(path: &Path) -> Result<RunnerConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    parse_config(&raw)
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_config_or_default(path: &Path) -> Result<RunnerConfig, ConfigError> {
    if !path.exists() {
        return Ok(RunnerConfig::default());
    }
    load_config(path)
}

pub fn parse_config(raw: &str) -> Result<RunnerConfig, ConfigError> {
    if raw.trim().is_empty() {
        return Ok(RunnerConfig::default());
    }
    let cfg: RunnerConfig = serde_yaml::from_str(raw)
        .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;
    if cfg.concurrency == 0 {
        return Err(ConfigError("concurrency must be at least 1".into()));
    }
    if cfg.timeout_secs == 0 {
        return Err(ConfigError("timeoutSecs must be at least 1".into()));
    }
    Ok(cfg)
}

pub fn save_config(path: &Path, cfg: &RunnerConfig) -> Result<(), ConfigError> {
    let raw = serde_yaml::to_string(cfg)
        .map_err(|e| ConfigError(format!("failed to encode config: {}", e)))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError(format!("failed to create {}: {}", parent.display(), e)))?;
    }
    std::fs::write(path, raw)
        .map_err(|e| ConfigError(format!("failed to write config {}: {}", path.display(), e)))?;
    Ok(())
}
