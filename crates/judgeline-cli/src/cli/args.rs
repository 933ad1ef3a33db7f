use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "judgeline",
    version,
    about = "Remote task runner for online judge systems"
)]
pub struct Cli {
    /// Config file (default: $JUDGELINE_CONFIG, /etc/judgeline/config.yaml, ./config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Exchange a registration token for runner credentials
    Register(RegisterArgs),
    /// Poll for and judge solutions
    Daemon(DaemonArgs),
    /// Poll for and run instance start/destroy tasks
    Instancer(InstancerArgs),
    /// Judge a solution from local files without a server
    Judge(JudgeArgs),
    /// Show runner configuration and available adapters
    Info,
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    /// Control server address (falls back to `serverAddr` from the config)
    #[arg(long)]
    pub server: Option<String>,

    #[arg(long, env = "JUDGELINE_REGISTRATION_TOKEN")]
    pub token: String,

    /// Runner name (default: host name)
    #[arg(long)]
    pub name: Option<String>,

    /// Comma-separated runner labels (default: "default")
    #[arg(long, value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Register again even if the config already holds credentials
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DaemonArgs {
    /// Seconds between polls when idle (overrides `pollInterval`)
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Parallel judge workers (overrides `concurrency`)
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InstancerArgs {
    #[arg(long)]
    pub poll_interval: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct JudgeArgs {
    /// Problem config (JSON or YAML)
    #[arg(long)]
    pub problem_config: PathBuf,

    #[arg(long)]
    pub problem_data: PathBuf,

    #[arg(long)]
    pub solution_data: PathBuf,

    /// Extra task environment as a JSON object of strings
    #[arg(long)]
    pub env: Option<String>,

    /// Scratch storage root (default: a temporary directory)
    #[arg(long)]
    pub storage: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn labels_split_on_commas() {
        let cli = Cli::parse_from([
            "judgeline",
            "register",
            "--server",
            "http://localhost:1234",
            "--token",
            "t",
            "--labels",
            "default,gpu",
        ]);
        match cli.cmd {
            Command::Register(args) => assert_eq!(args.labels, ["default", "gpu"]),
            _ => panic!("expected register"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["judgeline", "daemon", "--concurrency", "4", "--log-format", "json"]);
        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.cmd {
            Command::Daemon(args) => assert_eq!(args.concurrency, Some(4)),
            _ => panic!("expected daemon"),
        }
    }
}
