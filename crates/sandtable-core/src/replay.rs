//! Deterministic replay: apply a fixed action script with no adapters.
//!
//! Fixing the action sequence and omitting the language model isolates the
//! orchestrator's mutation logic, so world-state transitions can be asserted
//! exactly. Replay routes through the same validation and resolution
//! functions as a live run.

use serde::{Deserialize, Serialize};

use crate::actions::DeclaredAction;
use crate::resolve::{apply_action, check_termination, resolve_captures, ResolutionRules};
use crate::scenario::Scenario;
use crate::world::{RejectedAction, Role, Side, WorldState};

/// One side's scripted orders for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedTurn {
    pub side: Side,
    pub actions: Vec<DeclaredAction>,
}

/// Outcome of a replay.
#[derive(Debug, Clone)]
pub struct ReplaySummary {
    pub world: WorldState,
    pub rejections: Vec<RejectedAction>,
    pub turns_applied: u32,
}

/// Replay `script` against a fresh instantiation of `scenario`.
///
/// Each script entry resolves in order under the live validation rules;
/// invalid actions are collected as rejections exactly as a live run would
/// log them. Captures and termination checks run after each Blue/Red pair,
/// mirroring the `ADVANCE` phase.
pub fn replay(
    scenario: &Scenario,
    script: &[(ScriptedTurn, ScriptedTurn)],
    rules: &ResolutionRules,
) -> ReplaySummary {
    let mut world = scenario.instantiate();
    let mut rejections = Vec::new();
    let mut turns_applied = 0;

    for (blue, red) in script {
        for scripted in [blue, red] {
            let role = match scripted.side {
                Side::Blue => Role::BlueCommander,
                Side::Red => Role::RedCommander,
            };
            for action in &scripted.actions {
                match crate::resolve::validate_action(&world, scripted.side, action, rules) {
                    Ok(()) => apply_action(&mut world, action, rules),
                    Err(reason) => {
                        let rejection = RejectedAction {
                            turn: world.turn,
                            role,
                            action: action.clone(),
                            reason,
                        };
                        world.push_rejection(rejection.clone());
                        rejections.push(rejection);
                    }
                }
            }
        }

        resolve_captures(&mut world, rules);
        world.turn += 1;
        turns_applied += 1;
        if check_termination(&world).is_some() {
            break;
        }
    }

    ReplaySummary {
        world,
        rejections,
        turns_applied,
    }
}
