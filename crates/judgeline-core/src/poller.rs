//! Poll/dispatch loops.
//!
//! Both loops drive a [`Dispatcher`]: `claim` asks the server for the next
//! task and resolves anything that needs no adapter run, `execute` runs a
//! claimed task to completion and sends the final report. A claim that
//! returns work is followed by another poll right away; an idle claim waits
//! for the poll interval.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::queue::handoff;
use crate::shutdown::Shutdown;

/// Result of one poll.
#[derive(Debug)]
pub enum Claim<T> {
    /// No work, or the poll failed. Wait before polling again.
    Idle,
    /// A task was claimed and already settled (server error, missing adapter,
    /// failed preparation). Poll again immediately.
    Resolved,
    /// A task ready for an adapter run.
    Ready(T),
}

#[async_trait]
pub trait Dispatcher: Send + Sync + 'static {
    type Work: Send + 'static;

    /// Poll once. Only the poll request itself may be cut short by
    /// `shutdown`; once a task is claimed it is always settled or returned.
    async fn claim(&self, shutdown: &Shutdown) -> Claim<Self::Work>;

    /// Run a claimed task and send its terminal report. Never aborted.
    async fn execute(&self, work: Self::Work);
}

/// Wait out the poll interval. Returns `false` if shutdown was requested.
async fn idle(interval: Duration, shutdown: &Shutdown) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(interval) => true,
        _ = shutdown.triggered() => false,
    }
}

/// Poll and execute one task at a time.
pub async fn run_serial<D: Dispatcher>(dispatcher: &D, interval: Duration, shutdown: Shutdown) {
    info!(interval_ms = interval.as_millis() as u64, "serial poll loop started");

    while !shutdown.is_triggered() {
        match dispatcher.claim(&shutdown).await {
            Claim::Ready(work) => dispatcher.execute(work).await,
            Claim::Resolved => {}
            Claim::Idle => {
                if !idle(interval, &shutdown).await {
                    break;
                }
            }
        }
    }

    info!("serial poll loop stopped");
}

/// One producer polls, `concurrency` workers execute.
///
/// On shutdown the producer stops and closes the queue; workers finish what
/// they hold, drain the queue and exit before this returns.
pub async fn run_parallel<D: Dispatcher>(
    dispatcher: Arc<D>,
    concurrency: usize,
    interval: Duration,
    shutdown: Shutdown,
) {
    let concurrency = concurrency.max(1);
    info!(
        concurrency,
        interval_ms = interval.as_millis() as u64,
        "parallel poll loop started"
    );

    let (queue, receiver) = handoff::<D::Work>();
    let mut workers = JoinSet::new();
    for worker in 0..concurrency {
        let dispatcher = Arc::clone(&dispatcher);
        let receiver = receiver.clone();
        workers.spawn(async move {
            while let Some(work) = receiver.recv().await {
                dispatcher.execute(work).await;
            }
            debug!(worker, "worker exiting");
        });
    }
    drop(receiver);

    while !shutdown.is_triggered() {
        let permit = tokio::select! {
            permit = queue.reserve() => permit,
            _ = shutdown.triggered() => break,
        };
        let Some(permit) = permit else {
            error!("all workers exited; stopping producer");
            break;
        };

        match dispatcher.claim(&shutdown).await {
            Claim::Ready(work) => permit.send(work),
            Claim::Resolved => {}
            Claim::Idle => {
                drop(permit);
                if !idle(interval, &shutdown).await {
                    break;
                }
            }
        }
    }

    queue.close();
    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "worker panicked");
        }
    }

    info!("parallel poll loop stopped");
}
