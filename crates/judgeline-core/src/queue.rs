//! Rendezvous hand-off between the poll producer and the workers.
//!
//! The producer reserves a slot before it polls, so a task is only claimed
//! from the server when the queue can take it. With one buffered slot and N
//! busy workers at most N + 1 claimed tasks exist at any time.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

/// Producer half. Dropping or [`close`](Self::close)-ing it lets the workers
/// drain what is left and stop.
#[derive(Debug)]
pub struct HandoffQueue<T> {
    tx: mpsc::Sender<T>,
}

/// Worker half, shared by all workers.
#[derive(Debug)]
pub struct HandoffReceiver<T> {
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for HandoffReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

pub fn handoff<T>() -> (HandoffQueue<T>, HandoffReceiver<T>) {
    let (tx, rx) = mpsc::channel(1);
    (
        HandoffQueue { tx },
        HandoffReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

impl<T> HandoffQueue<T> {
    /// Wait for a free slot. `None` once every worker is gone.
    pub async fn reserve(&self) -> Option<mpsc::Permit<'_, T>> {
        self.tx.reserve().await.ok()
    }

    /// Stop accepting work. Items already queued are still delivered.
    pub fn close(self) {
        drop(self.tx);
    }
}

impl<T> HandoffReceiver<T> {
    /// Next item, or `None` when the queue is closed and drained.
    pub async fn recv(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn closed_queue_drains_then_ends() {
        let (queue, rx) = handoff();
        queue.reserve().await.unwrap().send(1);
        queue.close();

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn reserve_waits_for_a_free_slot() {
        let (queue, rx) = handoff();
        queue.reserve().await.unwrap().send("a");

        let blocked = tokio::time::timeout(Duration::from_millis(50), queue.reserve()).await;
        assert!(blocked.is_err(), "slot should still be taken");

        assert_eq!(rx.recv().await, Some("a"));
        assert!(queue.reserve().await.is_some());
    }

    #[tokio::test]
    async fn reserve_fails_without_receivers() {
        let (queue, rx) = handoff::<u8>();
        drop(rx);
        assert!(queue.reserve().await.is_none());
    }
}
