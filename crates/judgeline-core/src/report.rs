//! Streaming progress reports from a sandboxed judge process.
//!
//! The child writes newline-terminated `key=value` records to a named pipe:
//!
//! | key       | effect                                              |
//! |-----------|-----------------------------------------------------|
//! | `score`   | float in `[0, 100]`; anything else is ignored       |
//! | `status`  | replaced verbatim                                   |
//! | `message` | replaced verbatim                                   |
//! | `metrics` | JSON object of numbers; replaces the metrics map    |
//! | `commit`  | emits the accumulated snapshot                      |
//!
//! Unknown keys are ignored; lines without `=` other than `commit` are
//! logged and skipped.

use std::collections::BTreeMap;

use judgeline_adapter_api::SolutionInfo;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Fields accumulated between commits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportState {
    score: f64,
    status: String,
    message: String,
    metrics: Option<BTreeMap<String, f64>>,
}

impl ReportState {
    /// Apply one record. Returns the snapshot to emit on `commit`.
    pub fn apply(&mut self, line: &str) -> Option<SolutionInfo> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            return None;
        }

        let Some((key, value)) = line.split_once('=') else {
            if line == "commit" {
                return Some(self.snapshot());
            }
            warn!(line = %line, "malformed report line");
            return None;
        };

        match key {
            "score" => match value.trim().parse::<f64>() {
                Ok(score) if (0.0..=100.0).contains(&score) => self.score = score,
                Ok(score) => warn!(score, "report score out of range"),
                Err(e) => warn!(value = %value, error = %e, "invalid report score"),
            },
            "status" => self.status = value.to_string(),
            "message" => self.message = value.to_string(),
            "metrics" => match serde_json::from_str::<BTreeMap<String, f64>>(value) {
                Ok(metrics) => self.metrics = Some(metrics),
                Err(e) => warn!(error = %e, "invalid report metrics"),
            },
            "commit" => return Some(self.snapshot()),
            other => debug!(key = %other, "ignoring unknown report key"),
        }
        None
    }

    pub fn snapshot(&self) -> SolutionInfo {
        SolutionInfo {
            score: self.score,
            metrics: self.metrics.clone(),
            status: self.status.clone(),
            message: self.message.clone(),
        }
    }
}

/// Read records until every writer has closed the stream or a read fails,
/// forwarding each committed snapshot in order.
///
/// Returns the number of commits seen.
pub async fn read_reports<R>(reader: R, updates: mpsc::UnboundedSender<SolutionInfo>) -> usize
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut state = ReportState::default();
    let mut buf = Vec::new();
    let mut commits = 0;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let raw = String::from_utf8_lossy(&buf);
                let line = raw.strip_suffix('\n').unwrap_or(&raw);
                if let Some(info) = state.apply(line) {
                    commits += 1;
                    if updates.send(info).is_err() {
                        debug!("report consumer gone; discarding further updates");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "report stream read failed");
                break;
            }
        }
    }

    commits
}
