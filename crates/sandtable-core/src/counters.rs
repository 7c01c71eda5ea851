//! Global atomic counters for run observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Counters::flush`] at a natural boundary (end of a run) to emit current
//! values as a single `tracing::info!` event.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global counters singleton.
pub static COUNTERS: Counters = Counters::new();

/// Lightweight atomic counters — no allocations, no locking.
pub struct Counters {
    turns_completed: AtomicU64,
    tool_calls_executed: AtomicU64,
    actions_rejected: AtomicU64,
    runs_finished: AtomicU64,
}

impl Default for Counters {
    fn default() -> Self {
        Self::new()
    }
}

impl Counters {
    pub const fn new() -> Self {
        Self {
            turns_completed: AtomicU64::new(0),
            tool_calls_executed: AtomicU64::new(0),
            actions_rejected: AtomicU64::new(0),
            runs_finished: AtomicU64::new(0),
        }
    }

    pub fn inc_turns(&self) {
        self.turns_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tool_calls(&self) {
        self.tool_calls_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejections(&self) {
        self.actions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_runs_finished(&self) {
        self.runs_finished.fetch_add(1, Ordering::Relaxed);
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            turns_completed = self.turns_completed(),
            tool_calls_executed = self.tool_calls_executed(),
            actions_rejected = self.actions_rejected(),
            runs_finished = self.runs_finished(),
        );
    }

    pub fn turns_completed(&self) -> u64 {
        self.turns_completed.load(Ordering::Relaxed)
    }

    pub fn tool_calls_executed(&self) -> u64 {
        self.tool_calls_executed.load(Ordering::Relaxed)
    }

    pub fn actions_rejected(&self) -> u64 {
        self.actions_rejected.load(Ordering::Relaxed)
    }

    pub fn runs_finished(&self) -> u64 {
        self.runs_finished.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.turns_completed.store(0, Ordering::Relaxed);
        self.tool_calls_executed.store(0, Ordering::Relaxed);
        self.actions_rejected.store(0, Ordering::Relaxed);
        self.runs_finished.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let c = Counters::new();
        c.inc_turns();
        c.inc_turns();
        assert_eq!(c.turns_completed(), 2);
        c.inc_rejections();
        assert_eq!(c.actions_rejected(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let c = Counters::new();
        c.inc_turns();
        c.inc_tool_calls();
        c.inc_rejections();
        c.inc_runs_finished();
        c.reset();
        assert_eq!(c.turns_completed(), 0);
        assert_eq!(c.tool_calls_executed(), 0);
        assert_eq!(c.actions_rejected(), 0);
        assert_eq!(c.runs_finished(), 0);
    }
}
