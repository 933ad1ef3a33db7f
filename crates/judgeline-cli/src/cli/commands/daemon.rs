use std::path::Path;
use std::sync::Arc;

use judgeline_core::{
    run_parallel, run_serial, shutdown_channel, spawn_signal_handler, ConfigError, JudgeDispatcher,
    JudgeMode,
};
use tracing::info;

use super::super::args::DaemonArgs;
use super::Runtime;
use crate::exit_codes::SUCCESS;

pub async fn run(args: DaemonArgs, config: Option<&Path>) -> anyhow::Result<i32> {
    let mut runtime = Runtime::load(config, args.poll_interval)?;
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 {
            return Err(ConfigError("--concurrency must be at least 1".into()).into());
        }
        runtime.config.concurrency = concurrency;
    }

    let (trigger, shutdown) = shutdown_channel();
    spawn_signal_handler(trigger);

    let interval = runtime.config.poll_interval();
    let concurrency = runtime.config.concurrency;
    info!(concurrency, judges = ?runtime.registry.judge_names().collect::<Vec<_>>(), "judge daemon starting");

    if concurrency == 1 {
        let dispatcher = JudgeDispatcher::new(runtime.api, runtime.cache, runtime.registry, JudgeMode::Serial);
        run_serial(&dispatcher, interval, shutdown).await;
    } else {
        let dispatcher = Arc::new(JudgeDispatcher::new(
            runtime.api,
            runtime.cache,
            runtime.registry,
            JudgeMode::Parallel,
        ));
        run_parallel(dispatcher, concurrency, interval, shutdown).await;
    }

    info!("judge daemon stopped");
    Ok(SUCCESS)
}
