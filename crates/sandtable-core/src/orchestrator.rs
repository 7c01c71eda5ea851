//! Turn orchestration state machine.
//!
//! Drives `INIT -> BLUE_TURN -> RED_TURN -> ANALYST_TURN -> ADVANCE ->
//! (BLUE_TURN | TERMINATED)` over one exclusively-owned [`WorldState`].
//! Turn order is fixed: Red always observes Blue's already-applied state
//! change before acting, and the ordering is never randomized.
//!
//! The orchestrator is the only component that mutates world state. Adapters
//! produce messages and declared actions; everything else flows through
//! [`crate::resolve`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use uuid::Uuid;

use crate::agents::{AgentAdapter, CompletionClient, ToolRegistry, Visibility, WorldView};
use crate::counters::COUNTERS;
use crate::error::AdapterError;
use crate::obs;
use crate::resolve::{
    apply_action, check_termination, resolve_captures, ResolutionRules, Termination,
};
use crate::scenario::Scenario;
use crate::world::{RejectedAction, Role, TurnMessage, WorldState};

/// Per-run configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Overrides the scenario's default turn limit when set.
    pub max_turns: Option<u32>,
    /// Bounded wait per adapter call; exceeding it counts as an adapter error.
    pub adapter_timeout: Duration,
    pub rules: ResolutionRules,
    pub visibility: Visibility,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_turns: None,
            adapter_timeout: Duration::from_secs(120),
            rules: ResolutionRules::default(),
            visibility: Visibility::Full,
        }
    }
}

impl RunConfig {
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    pub fn with_adapter_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout = timeout;
        self
    }
}

/// Observable lifecycle state of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Events emitted on the per-run stream, suitable for live consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    Started {
        run_id: Uuid,
        scenario_id: String,
        model_name: String,
    },
    Message(TurnMessage),
    ActionRejected(RejectedAction),
    TurnAdvanced {
        turn: u32,
    },
    Finished {
        run_id: Uuid,
        status: RunStatus,
        error: Option<String>,
    },
}

/// Final record of one run: status, provenance, and the owned world
/// (including the full log).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub scenario_id: String,
    /// Digest of the exact scenario revision this run executed against.
    pub scenario_digest: String,
    pub model_name: String,
    pub status: RunStatus,
    pub error: Option<String>,
    pub termination: Option<Termination>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Fully completed turns.
    pub total_turns: u32,
    pub world: WorldState,
}

impl RunRecord {
    /// The transcript: all turn messages in log order. Valid and scorable
    /// even for failed or cancelled runs.
    pub fn transcript(&self) -> Vec<&TurnMessage> {
        self.world.transcript()
    }
}

/// Convenience pair for cooperative cancellation.
pub fn cancel_pair() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    BlueTurn,
    RedTurn,
    AnalystTurn,
    Advance,
    Terminated,
}

enum TurnOutcome {
    Continue,
    Failed(AdapterError),
    Cancelled,
}

/// The turn orchestrator. Owns the world state for exactly one run.
pub struct Orchestrator {
    scenario: Arc<Scenario>,
    client: Arc<dyn CompletionClient>,
    config: RunConfig,
    events: Option<mpsc::UnboundedSender<RunEvent>>,
    cancel: Option<watch::Receiver<bool>>,
}

impl Orchestrator {
    pub fn new(
        scenario: Arc<Scenario>,
        client: Arc<dyn CompletionClient>,
        config: RunConfig,
    ) -> Self {
        Self {
            scenario,
            client,
            config,
            events: None,
            cancel: None,
        }
    }

    /// Stream run events to `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<RunEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Observe `rx` for cooperative cancellation.
    pub fn with_cancel(mut self, rx: watch::Receiver<bool>) -> Self {
        self.cancel = Some(rx);
        self
    }

    fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    fn cancel_requested(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Execute the run to termination. Never returns an `Err`: every failure
    /// mode is encoded in the record's status, and the partial transcript is
    /// kept.
    pub async fn run(self) -> RunRecord {
        use tracing::Instrument;
        let run_id = Uuid::new_v4();
        let run_id_str = run_id.to_string();
        let span = tracing::info_span!("sandtable.run", run_id = %run_id_str);
        async move {
        let started_at = Utc::now();

        let mut world = self.scenario.instantiate();
        if let Some(max_turns) = self.config.max_turns {
            world.max_turns = max_turns;
        }

        let tools = ToolRegistry::for_scenario(&self.scenario);
        let model_name = self.client.model_name();
        let blue = AgentAdapter::new(Role::BlueCommander, Arc::clone(&self.client), tools.clone());
        let red = AgentAdapter::new(Role::RedCommander, Arc::clone(&self.client), tools.clone());
        let analyst = AgentAdapter::new(Role::Analyst, Arc::clone(&self.client), tools);

        obs::emit_run_started(&run_id_str, &self.scenario.id, &model_name);
        self.emit(RunEvent::Started {
            run_id,
            scenario_id: self.scenario.id.clone(),
            model_name: model_name.clone(),
        });

        let mut status = RunStatus::Running;
        let mut error: Option<String> = None;
        let mut termination: Option<Termination> = None;
        let mut phase = Phase::Init;

        while phase != Phase::Terminated {
            phase = match phase {
                Phase::Init => Phase::BlueTurn,
                Phase::BlueTurn | Phase::RedTurn | Phase::AnalystTurn => {
                    let (adapter, next) = match phase {
                        Phase::BlueTurn => (&blue, Phase::RedTurn),
                        Phase::RedTurn => (&red, Phase::AnalystTurn),
                        _ => (&analyst, Phase::Advance),
                    };
                    match self.role_turn(&mut world, adapter, &run_id_str).await {
                        TurnOutcome::Continue => next,
                        TurnOutcome::Failed(e) => {
                            error = Some(e.to_string());
                            status = RunStatus::Failed;
                            Phase::Terminated
                        }
                        TurnOutcome::Cancelled => {
                            status = RunStatus::Cancelled;
                            Phase::Terminated
                        }
                    }
                }
                Phase::Advance => {
                    resolve_captures(&mut world, &self.config.rules);
                    COUNTERS.inc_turns();
                    world.turn += 1;
                    obs::emit_turn_advanced(&run_id_str, world.turn);
                    self.emit(RunEvent::TurnAdvanced { turn: world.turn });

                    // Cooperative cancellation checkpoint between turns.
                    if self.cancel_requested() {
                        status = RunStatus::Cancelled;
                        Phase::Terminated
                    } else if let Some(t) = check_termination(&world) {
                        info!(termination = ?t, "run reached terminal condition");
                        termination = Some(t);
                        status = RunStatus::Completed;
                        Phase::Terminated
                    } else {
                        Phase::BlueTurn
                    }
                }
                Phase::Terminated => Phase::Terminated,
            };
        }

        let total_turns = world.turn.saturating_sub(1);
        let messages = world.transcript().len();
        obs::emit_run_finished(&run_id_str, &status.to_string(), total_turns, messages);
        COUNTERS.inc_runs_finished();
        COUNTERS.flush();
        self.emit(RunEvent::Finished {
            run_id,
            status,
            error: error.clone(),
        });

        RunRecord {
            run_id,
            scenario_id: self.scenario.id.clone(),
            scenario_digest: self.scenario.digest(),
            model_name,
            status,
            error,
            termination,
            started_at,
            finished_at: Utc::now(),
            total_turns,
            world,
        }
        }
        .instrument(span)
        .await
    }

    /// One role's turn: invoke the adapter (retry once on error), append the
    /// message, then validate and resolve declared actions in order.
    async fn role_turn(
        &self,
        world: &mut WorldState,
        adapter: &AgentAdapter,
        run_id: &str,
    ) -> TurnOutcome {
        let role = adapter.role();
        let view = WorldView::project(world, role, self.config.visibility);
        let history: Vec<TurnMessage> = world.transcript().into_iter().cloned().collect();

        let mut last_error: Option<AdapterError> = None;
        let mut produced = None;
        for attempt in 0..2 {
            match self.call_adapter(adapter, &view, &history).await {
                CallResult::Ok(turn) => {
                    produced = Some(turn);
                    break;
                }
                CallResult::Cancelled => return TurnOutcome::Cancelled,
                CallResult::Err(e) => {
                    warn!(role = %role, attempt = attempt + 1, error = %e, "adapter call failed");
                    last_error = Some(e);
                }
            }
        }

        let Some(turn) = produced else {
            // Retry exhausted. The partial transcript collected so far stays
            // valid and scorable.
            return TurnOutcome::Failed(last_error.expect("failure recorded on both attempts"));
        };

        obs::emit_turn_message(run_id, role, turn.message.turn, turn.message.tool_calls.len());
        self.emit(RunEvent::Message(turn.message.clone()));
        world.push_message(turn.message);

        match role.side() {
            Some(side) => {
                for action in turn.actions {
                    match crate::resolve::validate_action(world, side, &action, &self.config.rules)
                    {
                        Ok(()) => apply_action(world, &action, &self.config.rules),
                        Err(reason) => {
                            let rejection = RejectedAction {
                                turn: world.turn,
                                role,
                                action,
                                reason: reason.clone(),
                            };
                            obs::emit_action_rejected(run_id, role, world.turn, &reason);
                            COUNTERS.inc_rejections();
                            self.emit(RunEvent::ActionRejected(rejection.clone()));
                            world.push_rejection(rejection);
                        }
                    }
                }
            }
            None => {
                // Analyst turns carry commentary only; the adapter already
                // drops any declared actions.
                debug_assert!(turn.actions.is_empty());
            }
        }

        TurnOutcome::Continue
    }

    async fn call_adapter(
        &self,
        adapter: &AgentAdapter,
        view: &WorldView,
        history: &[TurnMessage],
    ) -> CallResult {
        let timeout = self.config.adapter_timeout;
        let role = adapter.role();
        let call = tokio::time::timeout(timeout, adapter.produce_turn(view, history));
        tokio::pin!(call);

        match self.cancel.clone() {
            Some(mut rx) => {
                if *rx.borrow() {
                    return CallResult::Cancelled;
                }
                tokio::select! {
                    // A completed call wins over a simultaneous cancel; the
                    // ADVANCE checkpoint picks the cancellation up next.
                    biased;
                    result = &mut call => CallResult::from_timeout_result(result, role, timeout),
                    // Best-effort mid-call cancellation: the in-flight call
                    // is abandoned, not interrupted.
                    changed = rx.changed() => {
                        if changed.is_ok() && *rx.borrow() {
                            CallResult::Cancelled
                        } else {
                            // Sender dropped or a spurious non-cancel update;
                            // keep waiting for the adapter.
                            CallResult::from_timeout_result((&mut call).await, role, timeout)
                        }
                    }
                }
            }
            None => CallResult::from_timeout_result(call.await, role, timeout),
        }
    }
}

enum CallResult {
    Ok(crate::agents::AgentTurn),
    Err(AdapterError),
    Cancelled,
}

impl CallResult {
    fn from_timeout_result(
        result: Result<Result<crate::agents::AgentTurn, AdapterError>, tokio::time::error::Elapsed>,
        role: Role,
        timeout: Duration,
    ) -> Self {
        match result {
            Ok(Ok(turn)) => CallResult::Ok(turn),
            Ok(Err(e)) => CallResult::Err(e),
            Err(_) => CallResult::Err(AdapterError::Timeout {
                role,
                seconds: timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_serde_uppercase() {
        assert_eq!(
            serde_json::to_string(&RunStatus::Completed).unwrap(),
            "\"COMPLETED\""
        );
        assert_eq!(
            serde_json::to_string(&RunStatus::Cancelled).unwrap(),
            "\"CANCELLED\""
        );
    }

    #[test]
    fn test_run_config_builders() {
        let config = RunConfig::default()
            .with_max_turns(3)
            .with_adapter_timeout(Duration::from_secs(5));
        assert_eq!(config.max_turns, Some(3));
        assert_eq!(config.adapter_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_run_event_serde_tags() {
        let event = RunEvent::TurnAdvanced { turn: 2 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "turn_advanced");
        assert_eq!(json["turn"], 2);
    }
}
