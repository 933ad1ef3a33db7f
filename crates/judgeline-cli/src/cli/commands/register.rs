use std::path::Path;

use anyhow::Context;
use judgeline_core::{load_config_or_default, resolve_config_path, save_config, ConfigError, VERSION};
use judgeline_remote::{RegisterRequest, RemoteConfig, RunnerClient};
use tracing::info;

use super::super::args::RegisterArgs;
use crate::exit_codes::SUCCESS;

const DEFAULT_LABEL: &str = "default";
const FALLBACK_NAME: &str = "judgeline-runner";

pub async fn run(args: RegisterArgs, config: Option<&Path>) -> anyhow::Result<i32> {
    let path = resolve_config_path(config);
    let mut cfg = load_config_or_default(&path)?;

    if cfg.is_registered() && !args.force {
        info!(config = %path.display(), "runner already registered; pass --force to register again");
        return Ok(SUCCESS);
    }

    let server = args
        .server
        .filter(|s| !s.is_empty())
        .or_else(|| Some(cfg.server_addr.clone()).filter(|s| !s.is_empty()))
        .ok_or_else(|| ConfigError("--server is required when the config has no serverAddr".into()))?;
    let labels = if !args.labels.is_empty() {
        args.labels
    } else if !cfg.labels.is_empty() {
        cfg.labels.clone()
    } else {
        vec![DEFAULT_LABEL.to_string()]
    };
    let name = args.name.unwrap_or_else(host_name);

    let client = RunnerClient::new(
        RemoteConfig::default()
            .with_url(&server)
            .with_timeout_secs(cfg.timeout_secs),
    )?;
    let request = RegisterRequest {
        name: name.clone(),
        version: VERSION.to_string(),
        labels: labels.clone(),
        registration_token: args.token,
    };
    let registered = client
        .register(&request)
        .await
        .with_context(|| format!("failed to register with {server}"))?;

    cfg.server_addr = server;
    cfg.runner_id = Some(registered.runner_id.clone());
    cfg.runner_key = Some(registered.runner_key);
    cfg.labels = labels;
    save_config(&path, &cfg)?;

    info!(runner_id = %registered.runner_id, name = %name, config = %path.display(), "runner registered");
    println!("Registered runner {} ({})", registered.runner_id, name);
    Ok(SUCCESS)
}

#[cfg(unix)]
fn host_name() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

#[cfg(not(unix))]
fn host_name() -> String {
    FALLBACK_NAME.to_string()
}
