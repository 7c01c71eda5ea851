//! Agent adapters: one per role, turning a world view into one text turn.
//!
//! The adapter owns prompt assembly, the bounded tool round, and the strict
//! action-parsing boundary. It never touches [`crate::world::WorldState`];
//! only the orchestrator applies effects, which keeps the run replayable by
//! fixing the action list independent of model non-determinism.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::actions::{parse_actions, DeclaredAction};
use crate::agents::completion::CompletionClient;
use crate::agents::prompts;
use crate::agents::tools::{tool_requests, ToolRegistry};
use crate::counters::COUNTERS;
use crate::error::AdapterError;
use crate::world::{Role, ToolCallRecord, TurnMessage, WorldState};

/// Cross-side intelligence rule applied when projecting a world view.
///
/// `Full` is a documented simplification: each side sees the opponent's
/// exact unit data. Fog-of-war would add a filtering variant here and leave
/// every other seam untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Full,
}

/// Read-only, role-scoped projection of the world handed to an adapter.
#[derive(Debug, Clone)]
pub struct WorldView {
    pub role: Role,
    pub turn: u32,
    pub max_turns: u32,
    pub scenario_name: String,
    pub visibility: Visibility,
    rendered: String,
}

impl WorldView {
    /// Project the current world state for a role.
    pub fn project(world: &WorldState, role: Role, visibility: Visibility) -> Self {
        let rendered = render_world(world, role, visibility);
        Self {
            role,
            turn: world.turn,
            max_turns: world.max_turns,
            scenario_name: world.scenario_name.clone(),
            visibility,
            rendered,
        }
    }

    /// The textual rendering embedded into the turn prompt.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }
}

fn render_world(world: &WorldState, role: Role, _visibility: Visibility) -> String {
    let mut lines = vec![
        format!("Scenario: {}", world.scenario_name),
        format!("Turn: {} of {}", world.turn, world.max_turns),
        String::new(),
        "Objectives:".to_string(),
    ];
    for obj in world.objectives.values() {
        lines.push(format!(
            "- {} [{}] value {} owner {:?} at {}",
            obj.name,
            obj.id,
            obj.value,
            obj.owner,
            obj.position,
        ));
    }

    // Visibility::Full - both rosters rendered with exact data. The role
    // only controls presentation order (own side first).
    let (first, second) = match role.side() {
        Some(side) => (side, side.opponent()),
        None => (crate::world::Side::Blue, crate::world::Side::Red),
    };
    for side in [first, second] {
        lines.push(String::new());
        lines.push(format!("{side} forces:"));
        for unit in world.units_of(side) {
            lines.push(format!(
                "- {} [{}] {:?} at {} strength {:.0} status {:?} range {:.0} km speed {:.0} km/h",
                unit.name,
                unit.id,
                unit.unit_type,
                unit.position,
                unit.strength,
                unit.status(),
                unit.range_km,
                unit.speed_kmh,
            ));
        }
    }
    lines.join("\n")
}

/// Format the tail of the transcript for prompt context.
fn render_history(history: &[TurnMessage], limit: usize) -> String {
    if history.is_empty() {
        return "No previous turns.".to_string();
    }
    let start = history.len().saturating_sub(limit);
    history[start..]
        .iter()
        .map(|m| {
            let summary: String = m.content.chars().take(240).collect();
            format!("Turn {} [{}]: {}", m.turn, m.agent, summary)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One produced turn: the message for the log plus the declared actions for
/// the orchestrator to validate and resolve.
#[derive(Debug, Clone)]
pub struct AgentTurn {
    pub message: TurnMessage,
    pub actions: Vec<DeclaredAction>,
}

/// Boundary object wrapping a prompt template, a completion client, and the
/// bounded geospatial tool set for one role.
pub struct AgentAdapter {
    role: Role,
    client: Arc<dyn CompletionClient>,
    tools: ToolRegistry,
}

impl AgentAdapter {
    pub fn new(role: Role, client: Arc<dyn CompletionClient>, tools: ToolRegistry) -> Self {
        Self {
            role,
            client,
            tools,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Produce one turn for this role.
    ///
    /// Flow: completion, then at most one tool round (execute every
    /// requested tool, feed results back, take the follow-up completion as
    /// the final text), then the strict action parse. Completion failures,
    /// tool failures, and malformed blocks all surface as [`AdapterError`]
    /// for the orchestrator's retry-once policy.
    #[instrument(skip(self, view, history), fields(role = %self.role, turn = view.turn))]
    pub async fn produce_turn(
        &self,
        view: &WorldView,
        history: &[TurnMessage],
    ) -> Result<AgentTurn, AdapterError> {
        let system = prompts::system_prompt(self.role);
        let prompt = prompts::turn_prompt(
            view.turn,
            view.max_turns,
            view.rendered(),
            &render_history(history, 6),
            prompts::role_task(self.role),
        );

        let initial = self
            .client
            .complete(&system, &prompt)
            .await
            .map_err(|e| AdapterError::Completion {
                role: self.role,
                detail: e.to_string(),
            })?;

        let requests = tool_requests(&initial).map_err(|detail| {
            AdapterError::MalformedResponse {
                role: self.role,
                detail,
            }
        })?;

        let (content, tool_calls) = if requests.is_empty() {
            (initial, Vec::new())
        } else {
            let mut records: Vec<ToolCallRecord> = Vec::with_capacity(requests.len());
            for request in &requests {
                let record = self.tools.execute(request).map_err(|detail| {
                    warn!(tool = %request.tool, %detail, "tool call failed");
                    AdapterError::Tool {
                        role: self.role,
                        tool: request.tool.clone(),
                        detail,
                    }
                })?;
                COUNTERS.inc_tool_calls();
                records.push(record);
            }

            let results = records
                .iter()
                .map(|r| format!("[{}] {}", r.tool_name, r.result))
                .collect::<Vec<_>>()
                .join("\n\n");
            let followup_prompt = format!(
                "{prompt}\n\n### Tool Results\n{results}\n\n\
                 Finalize your response for this turn using these verified figures."
            );

            debug!(tool_calls = records.len(), "tool round complete");

            let followup = self
                .client
                .complete(&system, &followup_prompt)
                .await
                .map_err(|e| AdapterError::Completion {
                    role: self.role,
                    detail: e.to_string(),
                })?;
            (followup, records)
        };

        let actions = if self.role == Role::Analyst {
            // The analyst observes; any declared actions are dropped at the
            // orchestrator's validation boundary anyway, but not parsing them
            // avoids failing a turn over commentary formatting.
            Vec::new()
        } else {
            parse_actions(&content).map_err(|detail| AdapterError::MalformedResponse {
                role: self.role,
                detail,
            })?
        };

        Ok(AgentTurn {
            message: TurnMessage {
                agent: self.role,
                turn: view.turn,
                timestamp: Utc::now(),
                content,
                tool_calls,
            },
            actions,
        })
    }
}
