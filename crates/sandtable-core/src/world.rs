//! Mutable per-run world state: units, objectives, turn counter, message log.
//!
//! Exactly one [`WorldState`] exists per run. It is owned by the orchestrator
//! and mutated only through action resolution there; adapters receive
//! read-only views. The log is append-only; everything else mutates in place.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sandtable_geo::Position;

use crate::actions::DeclaredAction;

/// Capability string marking a side's headquarters unit.
pub const CAPABILITY_COMMAND: &str = "command";

/// Strength below which a unit counts as damaged.
pub const DAMAGED_THRESHOLD: f64 = 50.0;

/// One of the two opposing factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Blue,
    Red,
}

impl Side {
    /// The opposing side.
    pub fn opponent(&self) -> Side {
        match self {
            Side::Blue => Side::Red,
            Side::Red => Side::Blue,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Blue => write!(f, "blue"),
            Side::Red => write!(f, "red"),
        }
    }
}

/// The three agent roles in a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    BlueCommander,
    RedCommander,
    Analyst,
}

impl Role {
    /// The side this role commands; the analyst commands neither.
    pub fn side(&self) -> Option<Side> {
        match self {
            Role::BlueCommander => Some(Side::Blue),
            Role::RedCommander => Some(Side::Red),
            Role::Analyst => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::BlueCommander => "blue_commander",
            Role::RedCommander => "red_commander",
            Role::Analyst => "analyst",
        };
        write!(f, "{s}")
    }
}

/// Broad domain of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    Air,
    Naval,
    Ground,
}

/// Operating posture, set via the `set_posture` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Posture {
    Defensive,
    Offensive,
    Patrol,
}

/// Readiness state, derived from strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Ready,
    Damaged,
    Destroyed,
}

/// A military unit.
///
/// Strength is monotonically non-increasing except through explicit
/// reinforcement; status is never stored, only derived, so the
/// `destroyed ⇔ strength == 0` invariant cannot drift. Units are never
/// removed from the roster, only marked destroyed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub name: String,
    pub side: Side,
    pub unit_type: UnitType,
    pub position: Position,
    /// Combat strength in `[0, 100]`.
    pub strength: f64,
    pub capabilities: Vec<String>,
    /// Maximum engagement range in kilometers.
    pub range_km: f64,
    /// Movement speed in km/h (0 for static units).
    pub speed_kmh: f64,
    pub posture: Posture,
}

impl Unit {
    /// Readiness derived from current strength.
    pub fn status(&self) -> UnitStatus {
        if self.strength <= 0.0 {
            UnitStatus::Destroyed
        } else if self.strength < DAMAGED_THRESHOLD {
            UnitStatus::Damaged
        } else {
            UnitStatus::Ready
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.status() == UnitStatus::Destroyed
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// Whether this unit is a side's headquarters.
    pub fn is_headquarters(&self) -> bool {
        self.has_capability(CAPABILITY_COMMAND)
    }

    /// Reduce strength, clamped at zero.
    pub fn apply_damage(&mut self, amount: f64) {
        self.strength = (self.strength - amount.max(0.0)).max(0.0);
    }

    /// Restore strength, clamped at 100. Destroyed units stay destroyed.
    pub fn reinforce(&mut self, amount: f64) {
        if self.is_destroyed() {
            return;
        }
        self.strength = (self.strength + amount.max(0.0)).min(100.0);
    }
}

/// Ownership of an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    Blue,
    Red,
    Contested,
}

impl Owner {
    pub fn from_side(side: Side) -> Owner {
        match side {
            Side::Blue => Owner::Blue,
            Side::Red => Owner::Red,
        }
    }
}

/// A strategic objective. Ownership mutates only through the orchestrator's
/// capture resolution at turn advance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub id: String,
    pub name: String,
    pub description: String,
    pub position: Position,
    /// Strategic value (1-10).
    pub value: u32,
    pub owner: Owner,
}

/// One audited tool invocation attached to a turn message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub arguments: serde_json::Value,
    pub result: String,
}

/// One agent's output for one turn. Immutable once appended to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnMessage {
    pub agent: Role,
    pub turn: u32,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    pub tool_calls: Vec<ToolCallRecord>,
}

/// Note recorded when a declared action fails validation. The turn
/// continues; the world is untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedAction {
    pub turn: u32,
    pub role: Role,
    pub action: DeclaredAction,
    pub reason: String,
}

/// Ordered log entry: a turn message or a rejected-action note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEntry {
    Turn(TurnMessage),
    Rejected(RejectedAction),
}

/// The complete mutable state of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub scenario_name: String,
    /// Current turn, starting at 1.
    pub turn: u32,
    pub max_turns: u32,
    pub units: BTreeMap<String, Unit>,
    pub objectives: BTreeMap<String, Objective>,
    pub log: Vec<LogEntry>,
}

impl WorldState {
    /// Append a turn message to the log.
    pub fn push_message(&mut self, message: TurnMessage) {
        self.log.push(LogEntry::Turn(message));
    }

    /// Append a rejected-action note to the log.
    pub fn push_rejection(&mut self, rejection: RejectedAction) {
        self.log.push(LogEntry::Rejected(rejection));
    }

    /// The transcript: all turn messages, in log order.
    pub fn transcript(&self) -> Vec<&TurnMessage> {
        self.log
            .iter()
            .filter_map(|entry| match entry {
                LogEntry::Turn(m) => Some(m),
                LogEntry::Rejected(_) => None,
            })
            .collect()
    }

    /// All units of one side, roster order.
    pub fn units_of(&self, side: Side) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.side == side)
    }

    /// Whether the side still has a non-destroyed headquarters.
    pub fn headquarters_alive(&self, side: Side) -> bool {
        self.units_of(side)
            .any(|u| u.is_headquarters() && !u.is_destroyed())
    }

    /// Whether every objective is owned by `side`.
    pub fn all_objectives_held_by(&self, side: Side) -> bool {
        let owner = Owner::from_side(side);
        !self.objectives.is_empty() && self.objectives.values().all(|o| o.owner == owner)
    }
}
