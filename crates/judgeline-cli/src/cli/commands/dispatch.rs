use super::super::args::*;
use crate::exit_codes::SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let config = cli.config.as_deref();
    match cli.cmd {
        Command::Register(args) => super::register::run(args, config).await,
        Command::Daemon(args) => super::daemon::run(args, config).await,
        Command::Instancer(args) => super::instancer::run(args, config).await,
        Command::Judge(args) => super::judge::run(args).await,
        Command::Info => super::info::run(config),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}
