//! Offline judging: run one adapter against files on disk and print the
//! final result as JSON.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use judgeline_adapter_api::ProblemConfig;
use judgeline_core::{judge_local, ConfigError, LocalJudgeTask};
use judgeline_remote::StorageLayout;
use tracing::{error, info};

use super::super::args::JudgeArgs;
use crate::exit_codes::{RUNTIME_ERROR, SUCCESS};

pub async fn run(args: JudgeArgs) -> anyhow::Result<i32> {
    let config = read_problem_config(&args.problem_config)?;
    let env = parse_env(args.env.as_deref())?;
    let problem_data = std::path::absolute(&args.problem_data)
        .with_context(|| format!("invalid path {}", args.problem_data.display()))?;
    let solution_data = std::path::absolute(&args.solution_data)
        .with_context(|| format!("invalid path {}", args.solution_data.display()))?;

    // Held until the run ends; the scratch tree is removed on drop.
    let scratch;
    let root: &Path = match &args.storage {
        Some(path) => path,
        None => {
            scratch = tempfile::tempdir().context("failed to create scratch directory")?;
            scratch.path()
        }
    };
    let storage = StorageLayout::new(root)?;
    storage.initialize()?;

    let registry = judgeline_adapters::builtin_registry(&storage)?;
    let name = config.judge_adapter().to_string();
    let adapter = registry
        .judge(&name)
        .ok_or_else(|| ConfigError(format!("judge adapter not found: {name}")))?;

    info!(adapter = %name, "judging locally");
    let task = LocalJudgeTask::new(config, env, problem_data, solution_data);
    let code = match judge_local(adapter.as_ref(), &task).await {
        Ok(()) => SUCCESS,
        Err(e) => {
            error!(adapter = %name, error = %e, "judge failed");
            RUNTIME_ERROR
        }
    };

    let report = serde_json::json!({
        "result": task.last_update(),
        "details": task.details(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(code)
}

/// Problem configs are JSON as served, but YAML is accepted for hand-written
/// files.
fn read_problem_config(path: &Path) -> anyhow::Result<ProblemConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
    let config = serde_yaml::from_str(&raw)
        .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
    Ok(config)
}

fn parse_env(raw: Option<&str>) -> anyhow::Result<BTreeMap<String, String>> {
    match raw {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| anyhow::Error::new(ConfigError(format!("--env must be a JSON object of strings: {}", e)))),
        None => Ok(BTreeMap::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_must_be_string_map() {
        let env = parse_env(Some(r#"{"user":"alice"}"#)).unwrap();
        assert_eq!(env.get("user").map(String::as_str), Some("alice"));
        assert!(parse_env(Some(r#"{"user":1}"#)).is_err());
        assert!(parse_env(None).unwrap().is_empty());
    }

    #[test]
    fn yaml_problem_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("problem.yaml");
        std::fs::write(&path, "judge:\n  adapter: dummy\n  config:\n    ping: hi\n").unwrap();

        let config = read_problem_config(&path).unwrap();
        assert_eq!(config.judge_adapter(), "dummy");
    }
}
