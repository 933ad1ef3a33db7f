use std::path::Path;

use judgeline_core::{load_config_or_default, resolve_config_path, VERSION};
use judgeline_remote::StorageLayout;

use crate::exit_codes::SUCCESS;

pub fn run(config: Option<&Path>) -> anyhow::Result<i32> {
    let path = resolve_config_path(config);
    let cfg = load_config_or_default(&path)?;
    // Listing adapters needs a layout but must not touch the disk.
    let storage = StorageLayout::new(&cfg.storage_path)?;
    let registry = judgeline_adapters::builtin_registry(&storage)?;

    let or_unset = |s: &str| if s.is_empty() { "(not set)".to_string() } else { s.to_string() };

    println!("judgeline {VERSION}");
    println!("config:     {}", path.display());
    println!("storage:    {}", storage.root().display());
    println!("server:     {}", or_unset(&cfg.server_addr));
    println!("runner id:  {}", or_unset(cfg.runner_id.as_deref().unwrap_or_default()));
    println!("labels:     {}", cfg.labels.join(", "));
    println!("judges:     {}", registry.judge_names().collect::<Vec<_>>().join(", "));
    println!("instancers: {}", registry.instancer_names().collect::<Vec<_>>().join(", "));
    Ok(SUCCESS)
}
