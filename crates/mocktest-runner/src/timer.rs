//! The countdown's tick source.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// A periodic tick stream backed by a spawned interval task.
///
/// The first tick arrives one full period after [`start`](Self::start).
/// Dropping the timer stops the task.
#[derive(Debug)]
pub struct SessionTimer {
    ticks: mpsc::Receiver<()>,
    handle: JoinHandle<()>,
    cancelled: bool,
}

impl SessionTimer {
    /// Spawn the interval task. Must be called inside a tokio runtime.
    pub fn start(period: Duration) -> Self {
        let (tx, ticks) = mpsc::channel(8);
        let handle = tokio::spawn(async move {
            // Missed ticks burst so the countdown keeps pace with wall time.
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });
        tracing::debug!(?period, "session timer started");
        Self {
            ticks,
            handle,
            cancelled: false,
        }
    }

    /// Wait for the next tick; `None` once the timer is cancelled.
    pub async fn next_tick(&mut self) -> Option<()> {
        if self.cancelled {
            return None;
        }
        self.ticks.recv().await
    }

    /// Stop ticking. Idempotent.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            self.cancelled = true;
            self.handle.abort();
            self.ticks.close();
            tracing::debug!("session timer cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        !self.cancelled && !self.handle.is_finished()
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
