use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

/// Quiet-period timer: of several overlapping calls, only the last one to
/// start is allowed through once `quiet` has elapsed without another call.
///
/// Runs on the tokio clock, so tests drive it with `tokio::time::pause` and
/// `advance`.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    generation: AtomicU64,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            generation: AtomicU64::new(0),
        }
    }

    /// Restart the timer and wait it out. Returns `false` when a later call
    /// or [`Debouncer::cancel`] superseded this one.
    pub async fn settle(&self) -> bool {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.quiet).await;
        self.generation.load(Ordering::SeqCst) == ticket
    }

    /// Drop whatever call is pending.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
