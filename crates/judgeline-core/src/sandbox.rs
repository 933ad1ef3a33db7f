//! Sandboxed subprocess runs.
//!
//! A [`SandboxWorkspace`] is a private directory under `tmp/` holding a named
//! pipe (`report`) for the streaming report protocol and a `details.json` the
//! child may overwrite. The engine opens the pipe for reading and keeps one
//! write end of its own until the child exits, so the reader never sees EOF
//! before the child had a chance to open the pipe.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use judgeline_adapter_api::{status, JudgeTask, SolutionDetails, SolutionInfo};
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::sys::stat::Mode;
use nix::unistd::Pid;
use tokio::net::unix::pipe;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::report::read_reports;

/// How long the report reader may keep draining after the child exited.
const READER_GRACE: Duration = Duration::from_secs(5);

pub const ABNORMAL_EXIT_MESSAGE: &str = "Judge process exited abnormally";

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create report pipe: {0}")]
    Fifo(#[from] nix::Error),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("sandbox command is empty")]
    EmptyCommand,
}

impl SandboxError {
    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Program, arguments and extra environment for a sandboxed child.
///
/// The child's environment is cleared except for `PATH` and the variables
/// added here. It leads its own process group, which is killed as a whole
/// once the child is done.
#[derive(Debug, Clone)]
pub struct SandboxCommand {
    program: OsString,
    args: Vec<OsString>,
    env: Vec<(String, OsString)>,
    current_dir: Option<PathBuf>,
}

impl SandboxCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            current_dir: None,
        }
    }

    /// Build from an argv vector such as a config's `command` list.
    pub fn from_argv<S: AsRef<str>>(argv: &[S]) -> Result<Self, SandboxError> {
        let (program, args) = argv.split_first().ok_or(SandboxError::EmptyCommand)?;
        Ok(Self::new(program.as_ref()).args(args.iter().map(AsRef::as_ref)))
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Pass `key` through from the runner's environment if it is set.
    pub fn inherit_env(self, key: &str) -> Self {
        match std::env::var_os(key) {
            Some(value) => self.env(key, value),
            None => self,
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn spawn(&self, default_dir: &Path) -> Result<Child, SandboxError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(self.current_dir.as_deref().unwrap_or(default_dir))
            .env_clear()
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .process_group(0)
            .kill_on_drop(true);
        if let Some(path) = std::env::var_os("PATH") {
            command.env("PATH", path);
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command.spawn().map_err(|source| SandboxError::Spawn {
            program: self.program(),
            source,
        })
    }
}

/// How a sandboxed child ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    Success,
    Failed(String),
    TimedOut(Duration),
}

impl ExitReason {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            Self::Success
        } else {
            Self::Failed(status.to_string())
        }
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => f.write_str("exited successfully"),
            Self::Failed(status) => f.write_str(status),
            Self::TimedOut(limit) => write!(f, "timed out after {limit:?}"),
        }
    }
}

/// SIGKILL every process left in the group led by `leader`.
fn kill_group(leader: Option<u32>) {
    let Some(pgid) = leader.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!(pgid, error = %e, "failed to kill process group"),
    }
}

async fn wait_with_timeout(child: &mut Child, limit: Duration) -> Result<ExitReason, SandboxError> {
    let leader = child.id();
    let exit = match tokio::time::timeout(limit, child.wait()).await {
        Ok(status) => status
            .map(ExitReason::from_status)
            .map_err(|e| SandboxError::io("failed to wait for child", e)),
        Err(_) => {
            warn!(timeout_ms = limit.as_millis() as u64, "sandboxed process timed out; killing");
            kill_group(leader);
            if let Err(e) = child.kill().await {
                warn!(error = %e, "failed to kill timed out process");
            }
            Ok(ExitReason::TimedOut(limit))
        }
    };
    // Descendants the child left running in the background go too.
    kill_group(leader);
    exit
}

/// Run a command with a wall-clock limit and no report channel.
pub async fn run_command(command: &SandboxCommand, work_dir: &Path, limit: Duration) -> Result<ExitReason, SandboxError> {
    debug!(program = %command.program(), dir = %work_dir.display(), "running command");
    let mut child = command.spawn(work_dir)?;
    wait_with_timeout(&mut child, limit).await
}

/// Result of one sandboxed judge run.
#[derive(Debug)]
pub struct SandboxOutcome {
    pub exit: ExitReason,
    /// Details re-read from the workspace after exit.
    pub details: SolutionDetails,
    /// Number of snapshots committed through the report pipe.
    pub commits: usize,
}

impl SandboxOutcome {
    /// Report the outcome: on abnormal exit override the result and note the
    /// reason in the summary, then upload the (possibly partial) details.
    pub async fn report(mut self, task: &dyn JudgeTask) {
        if !self.exit.is_success() {
            let info = SolutionInfo::new(0.0, status::JUDGE_ERROR, ABNORMAL_EXIT_MESSAGE);
            if let Err(e) = task.update(&info).await {
                warn!(error = %e, "failed to report abnormal exit");
            }
            self.details
                .append_note(format!("{}: {}", ABNORMAL_EXIT_MESSAGE, self.exit));
        }
        if let Err(e) = task.upload_details(&self.details).await {
            warn!(error = %e, "failed to upload details");
        }
    }
}

/// Private working directory with a report pipe and a details file.
#[derive(Debug)]
pub struct SandboxWorkspace {
    dir: tempfile::TempDir,
    report: PathBuf,
    details: PathBuf,
}

impl SandboxWorkspace {
    /// Create a fresh workspace under `tmp_root`.
    pub fn create(tmp_root: &Path, prefix: &str) -> Result<Self, SandboxError> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(tmp_root)
            .map_err(|e| SandboxError::io("failed to create sandbox dir", e))?;

        let report = dir.path().join("report");
        nix::unistd::mkfifo(report.as_path(), Mode::S_IRUSR | Mode::S_IWUSR)?;

        let details = dir.path().join("details.json");
        let empty = serde_json::to_vec(&SolutionDetails::default())
            .map_err(|e| SandboxError::io("failed to encode details", e.into()))?;
        std::fs::write(&details, empty)
            .map_err(|e| SandboxError::io("failed to write details file", e))?;

        Ok(Self {
            dir,
            report,
            details,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn report_path(&self) -> &Path {
        &self.report
    }

    pub fn details_path(&self) -> &Path {
        &self.details
    }

    /// Run `command` inside the workspace, forwarding committed report
    /// snapshots to `task` as they arrive.
    ///
    /// The reader is joined (or given up on after a short grace period)
    /// before this returns, so no update can race the final report.
    pub async fn run(
        &self,
        command: &SandboxCommand,
        limit: Duration,
        task: &dyn JudgeTask,
    ) -> Result<SandboxOutcome, SandboxError> {
        let receiver = pipe::OpenOptions::new()
            .open_receiver(&self.report)
            .map_err(|e| SandboxError::io("failed to open report pipe", e))?;
        let keeper = pipe::OpenOptions::new()
            .open_sender(&self.report)
            .map_err(|e| SandboxError::io("failed to open report pipe", e))?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut reader = tokio::spawn(read_reports(receiver, tx));

        let mut child = match command.spawn(self.path()) {
            Ok(child) => child,
            Err(e) => {
                reader.abort();
                return Err(e);
            }
        };
        info!(program = %command.program(), "sandboxed process started");

        let forward = async {
            while let Some(info) = rx.recv().await {
                if let Err(e) = task.update(&info).await {
                    warn!(error = %e, "failed to forward report update");
                }
            }
        };

        let supervise = async {
            let exit = wait_with_timeout(&mut child, limit).await;
            drop(keeper);
            let commits = match tokio::time::timeout(READER_GRACE, &mut reader).await {
                Ok(Ok(commits)) => commits,
                Ok(Err(e)) => {
                    warn!(error = %e, "report reader failed");
                    0
                }
                Err(_) => {
                    warn!("report pipe still open after exit; abandoning reader");
                    reader.abort();
                    0
                }
            };
            (exit, commits)
        };

        let ((), (exit, commits)) = tokio::join!(forward, supervise);
        let exit = exit?;
        info!(exit = %exit, commits, "sandboxed process finished");

        Ok(SandboxOutcome {
            exit,
            details: self.read_details().await,
            commits,
        })
    }

    /// Re-read the details file; falls back to empty details when it is
    /// missing or unparsable.
    async fn read_details(&self) -> SolutionDetails {
        match tokio::fs::read(&self.details).await {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "failed to parse details file");
                SolutionDetails::default()
            }),
            Err(e) => {
                warn!(error = %e, "failed to read details file");
                SolutionDetails::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_layout() {
        let root = tempfile::tempdir().unwrap();
        let ws = SandboxWorkspace::create(root.path(), "glue-").unwrap();

        assert!(ws.path().starts_with(root.path()));
        let meta = std::fs::metadata(ws.report_path()).unwrap();
        use std::os::unix::fs::FileTypeExt;
        assert!(meta.file_type().is_fifo());
        let details: SolutionDetails =
            serde_json::from_slice(&std::fs::read(ws.details_path()).unwrap()).unwrap();
        assert_eq!(details, SolutionDetails::default());
    }

    #[test]
    fn from_argv_rejects_empty() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            SandboxCommand::from_argv(&empty),
            Err(SandboxError::EmptyCommand)
        ));
        assert_eq!(
            SandboxCommand::from_argv(&["bash", "-c", "true"]).unwrap().program(),
            "bash"
        );
    }

    #[tokio::test]
    async fn run_command_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let exit = run_command(
            &SandboxCommand::new("sleep").arg("5"),
            dir.path(),
            Duration::from_millis(200),
        )
        .await
        .unwrap();
        assert_eq!(exit, ExitReason::TimedOut(Duration::from_millis(200)));
    }

    #[test]
    fn timeout_display_keeps_subsecond_limits() {
        assert_eq!(
            ExitReason::TimedOut(Duration::from_millis(200)).to_string(),
            "timed out after 200ms"
        );
        assert_eq!(
            ExitReason::TimedOut(Duration::from_secs(3)).to_string(),
            "timed out after 3s"
        );
    }

    #[cfg(target_os = "linux")]
    fn is_running(pid: u32) -> bool {
        std::fs::read_to_string(format!("/proc/{pid}/stat"))
            .ok()
            .and_then(|stat| {
                let (_, rest) = stat.rsplit_once(')')?;
                rest.trim_start().chars().next()
            })
            .is_some_and(|state| state != 'Z')
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn background_descendants_die_with_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("bg.pid");
        let script = format!("sleep 30 & echo $! > '{}'", pid_file.display());
        let exit = run_command(
            &SandboxCommand::new("sh").args(["-c", script.as_str()]),
            dir.path(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert!(exit.is_success());

        let pid: u32 = std::fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while is_running(pid) && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!is_running(pid), "background process {pid} outlived the child");
    }

    #[tokio::test]
    async fn run_command_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let exit = run_command(
            &SandboxCommand::new("sh").args(["-c", "exit 3"]),
            dir.path(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert!(matches!(exit, ExitReason::Failed(_)));
        assert!(exit.to_string().contains('3'));
    }
}
