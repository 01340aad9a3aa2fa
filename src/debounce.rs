//! Last-call-wins debouncing.

use std::future;
use std::time::Duration;

use tokio::time::{self, Instant};

/// Holds the most recent value until no newer one has arrived for the
/// quiescence period. Each new value replaces the pending one and restarts
/// the timer.
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T) {
        self.pending = Some((value, Instant::now() + self.quiet));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops any pending value.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Resolves with the pending value once it has been quiet long enough.
    /// Never resolves while nothing is pending.
    ///
    /// Cancel safe: dropping the future leaves the pending value in place.
    pub async fn ready(&mut self) -> T {
        loop {
            let Some((_, deadline)) = &self.pending else {
                return future::pending().await;
            };
            time::sleep_until(*deadline).await;
            if let Some((value, _)) = self.pending.take() {
                return value;
            }
        }
    }
}
