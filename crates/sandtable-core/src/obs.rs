//! Structured observability hooks for run lifecycle events.
//!
//! Events are emitted at `info!` level and carry stable `event = "..."`
//! field names so log aggregation can filter on them.

use tracing::{info, warn};

use crate::world::Role;

/// RAII guard that enters a run-scoped tracing span for the duration of a run.
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Create and enter a span tagged with the run id.
    pub fn enter(run_id: &str) -> Self {
        let span = tracing::info_span!("sandtable.run", run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: run started.
pub fn emit_run_started(run_id: &str, scenario_id: &str, model_name: &str) {
    info!(event = "run.started", run_id = %run_id, scenario = %scenario_id, model = %model_name);
}

/// Emit event: a turn message was appended to the log.
pub fn emit_turn_message(run_id: &str, role: Role, turn: u32, tool_calls: usize) {
    info!(event = "run.message", run_id = %run_id, role = %role, turn = turn, tool_calls = tool_calls);
}

/// Emit event: a declared action failed validation (warning level).
pub fn emit_action_rejected(run_id: &str, role: Role, turn: u32, reason: &str) {
    warn!(event = "run.action_rejected", run_id = %run_id, role = %role, turn = turn, reason = %reason);
}

/// Emit event: the turn counter advanced.
pub fn emit_turn_advanced(run_id: &str, turn: u32) {
    info!(event = "run.turn_advanced", run_id = %run_id, turn = turn);
}

/// Emit event: run reached a terminal state.
pub fn emit_run_finished(run_id: &str, status: &str, total_turns: u32, messages: usize) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        status = %status,
        total_turns = total_turns,
        messages = messages,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_create() {
        let _span = RunSpan::enter("test-run-id");
    }
}
