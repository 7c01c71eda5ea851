//! End-to-end orchestrated runs with deterministic completion doubles.
//!
//! Exercises the full Blue -> Red -> Analyst turn cycle, the rejected-action
//! containment path, the retry-then-halt adapter policy, and cooperative
//! cancellation.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use sandtable_core::fakes::{FlakyCompletionClient, ScriptedCompletionClient};
use sandtable_core::{
    cancel_pair, CompletionClient, CompletionError, Orchestrator, Role, RunConfig, RunEvent,
    RunStatus, ScenarioStore,
};

const PLAIN_RESPONSE: &str = "### SITUATION ASSESSMENT\nHolding position and observing.";

fn scenario() -> Arc<sandtable_core::Scenario> {
    ScenarioStore::load("taiwan_strait").unwrap()
}

#[tokio::test]
async fn test_three_turn_run_produces_nine_messages() {
    let client = Arc::new(ScriptedCompletionClient::repeating(PLAIN_RESPONSE));
    let record = Orchestrator::new(
        scenario(),
        client,
        RunConfig::default().with_max_turns(3),
    )
    .run()
    .await;

    assert_eq!(record.status, RunStatus::Completed);
    assert_eq!(record.total_turns, 3);
    assert_eq!(record.transcript().len(), 9, "3 roles x 3 turns");
    assert!(record.error.is_none());
}

#[tokio::test]
async fn test_turn_ordering_invariant() {
    let client = Arc::new(ScriptedCompletionClient::repeating(PLAIN_RESPONSE));
    let record = Orchestrator::new(
        scenario(),
        client,
        RunConfig::default().with_max_turns(3),
    )
    .run()
    .await;

    let transcript = record.transcript();
    for turn in 1..=3u32 {
        let position = |role: Role| {
            transcript
                .iter()
                .position(|m| m.turn == turn && m.agent == role)
                .unwrap_or_else(|| panic!("missing {role:?} message for turn {turn}"))
        };
        let blue = position(Role::BlueCommander);
        let red = position(Role::RedCommander);
        let analyst = position(Role::Analyst);
        assert!(blue < red, "turn {turn}: blue must precede red");
        assert!(red < analyst, "turn {turn}: red must precede analyst");
    }
}

#[tokio::test]
async fn test_rejected_actions_never_mutate_world() {
    // Every declared action is invalid: the battery cannot move (speed 0)
    // and it belongs to Blue, so Red's identical declaration fails the
    // ownership check.
    let response = r#"### RECOMMENDED ACTION
Reposition the coastal battery north.
```actions
[{"type": "move_unit", "unit_id": "blue_ground_1", "to": {"lat": 30.0, "lon": 121.4, "grid_ref": ""}}]
```"#;

    let baseline = scenario().instantiate();
    let client = Arc::new(ScriptedCompletionClient::repeating(response));
    let record = Orchestrator::new(
        scenario(),
        client,
        RunConfig::default().with_max_turns(1),
    )
    .run()
    .await;

    assert_eq!(record.status, RunStatus::Completed);
    assert_eq!(record.transcript().len(), 3);
    // Two commanders declared one invalid action each.
    let rejections = record
        .world
        .log
        .iter()
        .filter(|e| matches!(e, sandtable_core::LogEntry::Rejected(_)))
        .count();
    assert_eq!(rejections, 2);

    // Units and objectives identical to a fresh instantiation; only the log
    // and turn counter differ.
    assert_eq!(record.world.units, baseline.units);
    assert_eq!(record.world.objectives, baseline.objectives);
}

#[tokio::test]
async fn test_valid_action_mutates_world() {
    let response = r#"### STRATEGIC MOVE
Bombers strike the destroyer screen.
```actions
[{"type": "engage", "unit_id": "red_air_2", "target_id": "blue_naval_1"}]
```"#;

    // Only Red's declaration passes validation (Blue does not own red_air_2).
    let client = Arc::new(ScriptedCompletionClient::repeating(response));
    let record = Orchestrator::new(
        scenario(),
        client,
        RunConfig::default().with_max_turns(1),
    )
    .run()
    .await;

    assert_eq!(record.status, RunStatus::Completed);
    assert_eq!(record.world.units["blue_naval_1"].strength, 70.0);
}

#[tokio::test]
async fn test_adapter_error_retries_once_then_succeeds() {
    let client = Arc::new(FlakyCompletionClient::new(1, PLAIN_RESPONSE));
    let record = Orchestrator::new(
        scenario(),
        client,
        RunConfig::default().with_max_turns(1),
    )
    .run()
    .await;

    assert_eq!(record.status, RunStatus::Completed);
    assert_eq!(record.transcript().len(), 3);
}

#[tokio::test]
async fn test_adapter_exhaustion_halts_with_partial_transcript() {
    // Three good responses cover turn 1; turn 2's Blue call fails twice.
    let client = Arc::new(ScriptedCompletionClient::from_responses(vec![
        PLAIN_RESPONSE.to_string(),
        PLAIN_RESPONSE.to_string(),
        PLAIN_RESPONSE.to_string(),
    ]));
    let record = Orchestrator::new(
        scenario(),
        client,
        RunConfig::default().with_max_turns(3),
    )
    .run()
    .await;

    assert_eq!(record.status, RunStatus::Failed);
    assert!(record.error.is_some());
    // The partial transcript remains valid and scorable.
    assert_eq!(record.transcript().len(), 3);
    assert_eq!(record.total_turns, 1);
}

#[tokio::test]
async fn test_pre_cancelled_run_never_invokes_adapters() {
    let (tx, rx) = cancel_pair();
    tx.send(true).unwrap();

    let client = Arc::new(ScriptedCompletionClient::repeating(PLAIN_RESPONSE));
    let record = Orchestrator::new(
        scenario(),
        client,
        RunConfig::default().with_max_turns(3),
    )
    .with_cancel(rx)
    .run()
    .await;

    assert_eq!(record.status, RunStatus::Cancelled);
    assert!(record.transcript().is_empty());
}

/// Completion client that requests cancellation after its Nth call.
struct CancellingClient {
    calls: AtomicU32,
    cancel_after: u32,
    tx: watch::Sender<bool>,
}

#[async_trait]
impl CompletionClient for CancellingClient {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, CompletionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.cancel_after {
            let _ = self.tx.send(true);
        }
        Ok(PLAIN_RESPONSE.to_string())
    }

    fn model_name(&self) -> String {
        "cancelling".to_string()
    }
}

#[tokio::test]
async fn test_cancellation_checkpoint_between_turns() {
    let (tx, rx) = cancel_pair();
    // Cancel as the analyst call of turn 1 completes; the ADVANCE checkpoint
    // must mark the run cancelled, not completed.
    let client = Arc::new(CancellingClient {
        calls: AtomicU32::new(0),
        cancel_after: 3,
        tx,
    });
    let record = Orchestrator::new(
        scenario(),
        client,
        RunConfig::default().with_max_turns(5),
    )
    .with_cancel(rx)
    .run()
    .await;

    assert_eq!(record.status, RunStatus::Cancelled);
    assert_eq!(record.transcript().len(), 3, "turn 1 messages are kept");
}

#[tokio::test]
async fn test_event_stream_mirrors_run() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = Arc::new(ScriptedCompletionClient::repeating(PLAIN_RESPONSE));
    let record = Orchestrator::new(
        scenario(),
        client,
        RunConfig::default().with_max_turns(2),
    )
    .with_events(tx)
    .run()
    .await;

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert!(matches!(events.first(), Some(RunEvent::Started { .. })));
    assert!(matches!(events.last(), Some(RunEvent::Finished { status: RunStatus::Completed, .. })));

    let messages = events
        .iter()
        .filter(|e| matches!(e, RunEvent::Message(_)))
        .count();
    assert_eq!(messages, record.transcript().len());

    let advances = events
        .iter()
        .filter(|e| matches!(e, RunEvent::TurnAdvanced { .. }))
        .count();
    assert_eq!(advances, 2);
}

#[tokio::test]
async fn test_concurrent_runs_share_one_scenario() {
    let scenario = scenario();
    let mut handles = Vec::new();
    for _ in 0..4 {
        let scenario = Arc::clone(&scenario);
        let client = Arc::new(ScriptedCompletionClient::repeating(PLAIN_RESPONSE));
        handles.push(tokio::spawn(async move {
            Orchestrator::new(scenario, client, RunConfig::default().with_max_turns(2))
                .run()
                .await
        }));
    }

    for handle in handles {
        let record = handle.await.unwrap();
        assert_eq!(record.status, RunStatus::Completed);
        assert_eq!(record.transcript().len(), 6);
    }
}

#[tokio::test]
async fn test_run_record_carries_scenario_digest() {
    let scenario = scenario();
    let client = Arc::new(ScriptedCompletionClient::repeating(PLAIN_RESPONSE));
    let record = Orchestrator::new(
        Arc::clone(&scenario),
        client,
        RunConfig::default().with_max_turns(1),
    )
    .run()
    .await;

    assert_eq!(record.scenario_digest, scenario.digest());
    assert_eq!(record.scenario_id, "taiwan_strait");
}
