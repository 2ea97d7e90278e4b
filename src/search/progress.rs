//! Cooperative cancellation and progress reporting for search loops

use crossbeam::channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::types::SearchProgress;

/// Cooperative stop flag shared between a search owner and its workers.
///
/// Stopping is a request, not preemption: loops observe the flag on their
/// next iteration. `stop()` on an already-stopped flag is a no-op.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Send a progress snapshot without blocking the search.
///
/// The channel is bounded; a slow consumer drops snapshots rather than
/// stalling the workers.
pub(crate) fn emit_progress(sender: &Sender<SearchProgress>, attempts: u64, started: Instant) {
    let _ = sender.try_send(SearchProgress::new(attempts, started.elapsed()));
}
