use std::path::Path;

use judgeline_core::{run_serial, shutdown_channel, spawn_signal_handler, InstanceDispatcher};
use tracing::info;

use super::super::args::InstancerArgs;
use super::Runtime;
use crate::exit_codes::SUCCESS;

pub async fn run(args: InstancerArgs, config: Option<&Path>) -> anyhow::Result<i32> {
    let runtime = Runtime::load(config, args.poll_interval)?;

    let (trigger, shutdown) = shutdown_channel();
    spawn_signal_handler(trigger);

    let interval = runtime.config.poll_interval();
    info!(
        instancers = ?runtime.registry.instancer_names().collect::<Vec<_>>(),
        "instancer starting"
    );

    let dispatcher = InstanceDispatcher::new(runtime.api, runtime.cache, runtime.registry);
    run_serial(&dispatcher, interval, shutdown).await;

    info!("instancer stopped");
    Ok(SUCCESS)
}
