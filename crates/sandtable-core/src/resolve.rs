//! Action validation and resolution: the single world-state mutation path.
//!
//! The orchestrator routes every declared action through [`validate_action`]
//! then [`apply_action`]; the deterministic replay path uses the same
//! functions, which is what makes "fix the action list, omit the adapters,
//! assert the resulting world" a valid test strategy.

use sandtable_geo::{distance, within_range};
use serde::{Deserialize, Serialize};

use crate::actions::DeclaredAction;
use crate::world::{Owner, Side, WorldState};

/// Deterministic tuning for action resolution and capture logic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolutionRules {
    /// Hours of movement budget per turn.
    pub turn_duration_hours: f64,
    /// A unit within this radius of an objective contests it.
    pub capture_radius_km: f64,
    /// Fraction of attacker strength dealt as damage on engagement.
    pub attrition_factor: f64,
    /// Maximum strength restored by a single reinforce action.
    pub max_reinforce: f64,
}

impl Default for ResolutionRules {
    fn default() -> Self {
        Self {
            turn_duration_hours: 6.0,
            capture_radius_km: 50.0,
            attrition_factor: 0.3,
            max_reinforce: 25.0,
        }
    }
}

/// Validate one declared action against world-state invariants.
///
/// Returns the rejection reason on failure. Rejection never mutates
/// anything; the orchestrator records it as a log note and moves on.
pub fn validate_action(
    world: &WorldState,
    acting_side: Side,
    action: &DeclaredAction,
    rules: &ResolutionRules,
) -> Result<(), String> {
    let unit = world
        .units
        .get(action.unit_id())
        .ok_or_else(|| format!("unit not found: {}", action.unit_id()))?;

    if unit.side != acting_side {
        return Err(format!(
            "unit {} belongs to {}, not the acting side",
            unit.id, unit.side
        ));
    }
    if unit.is_destroyed() {
        return Err(format!("unit {} is destroyed", unit.id));
    }

    match action {
        DeclaredAction::MoveUnit { to, .. } => {
            to.validate().map_err(|e| e.to_string())?;
            let leg = distance(&unit.position, to).map_err(|e| e.to_string())?;
            let reach = unit.speed_kmh * rules.turn_duration_hours;
            if leg > reach {
                return Err(format!(
                    "destination {leg:.0} km away exceeds per-turn reach of {reach:.0} km"
                ));
            }
            Ok(())
        }
        DeclaredAction::Engage { target_id, .. } => {
            let target = world
                .units
                .get(target_id)
                .ok_or_else(|| format!("target not found: {target_id}"))?;
            if target.side != acting_side.opponent() {
                return Err(format!("target {} is not hostile", target.id));
            }
            if target.is_destroyed() {
                return Err(format!("target {} is already destroyed", target.id));
            }
            let in_range = within_range(&unit.position, &target.position, unit.range_km)
                .map_err(|e| e.to_string())?;
            if !in_range {
                return Err(format!(
                    "target {} outside weapon range of {:.0} km",
                    target.id, unit.range_km
                ));
            }
            Ok(())
        }
        DeclaredAction::SetPosture { .. } => Ok(()),
        DeclaredAction::Reinforce { amount, .. } => {
            if *amount <= 0.0 || *amount > rules.max_reinforce {
                return Err(format!(
                    "reinforce amount {amount} outside (0, {}]",
                    rules.max_reinforce
                ));
            }
            Ok(())
        }
    }
}

/// Apply a validated action. Callers must have run [`validate_action`] first.
pub fn apply_action(world: &mut WorldState, action: &DeclaredAction, rules: &ResolutionRules) {
    match action {
        DeclaredAction::MoveUnit { unit_id, to } => {
            if let Some(unit) = world.units.get_mut(unit_id) {
                unit.position = to.clone();
            }
        }
        DeclaredAction::Engage { unit_id, target_id } => {
            let damage = world
                .units
                .get(unit_id)
                .map(|u| rules.attrition_factor * u.strength)
                .unwrap_or(0.0);
            if let Some(target) = world.units.get_mut(target_id) {
                target.apply_damage(damage);
            }
        }
        DeclaredAction::SetPosture { unit_id, posture } => {
            if let Some(unit) = world.units.get_mut(unit_id) {
                unit.posture = *posture;
            }
        }
        DeclaredAction::Reinforce { unit_id, amount } => {
            if let Some(unit) = world.units.get_mut(unit_id) {
                unit.reinforce(*amount);
            }
        }
    }
}

/// Resolve objective ownership from unit presence.
///
/// Sole non-destroyed presence within the capture radius takes the
/// objective; joint presence leaves it contested; an empty radius leaves
/// ownership unchanged.
pub fn resolve_captures(world: &mut WorldState, rules: &ResolutionRules) {
    let presence: Vec<(String, bool, bool)> = world
        .objectives
        .values()
        .map(|obj| {
            let near = |side: Side| {
                world.units_of(side).any(|u| {
                    !u.is_destroyed()
                        && within_range(&u.position, &obj.position, rules.capture_radius_km)
                            .unwrap_or(false)
                })
            };
            (obj.id.clone(), near(Side::Blue), near(Side::Red))
        })
        .collect();

    for (id, blue, red) in presence {
        let owner = match (blue, red) {
            (true, false) => Some(Owner::Blue),
            (false, true) => Some(Owner::Red),
            (true, true) => Some(Owner::Contested),
            (false, false) => None,
        };
        if let (Some(owner), Some(obj)) = (owner, world.objectives.get_mut(&id)) {
            obj.owner = owner;
        }
    }
}

/// Why a run reached its terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    TurnLimitReached,
    HeadquartersDestroyed { side: Side },
    ObjectivesSwept { side: Side },
}

/// Check the termination conditions after a turn advance.
pub fn check_termination(world: &WorldState) -> Option<Termination> {
    if world.turn > world.max_turns {
        return Some(Termination::TurnLimitReached);
    }
    for side in [Side::Blue, Side::Red] {
        if !world.headquarters_alive(side) {
            return Some(Termination::HeadquartersDestroyed { side });
        }
    }
    for side in [Side::Blue, Side::Red] {
        if world.all_objectives_held_by(side) {
            return Some(Termination::ObjectivesSwept { side });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioStore;
    use sandtable_geo::Position;

    fn world() -> WorldState {
        ScenarioStore::load("taiwan_strait").unwrap().instantiate()
    }

    fn rules() -> ResolutionRules {
        ResolutionRules::default()
    }

    #[test]
    fn test_validate_rejects_unknown_unit() {
        let action = DeclaredAction::SetPosture {
            unit_id: "blue_ghost".to_string(),
            posture: crate::world::Posture::Offensive,
        };
        let err = validate_action(&world(), Side::Blue, &action, &rules()).unwrap_err();
        assert!(err.contains("unit not found"));
    }

    #[test]
    fn test_validate_rejects_wrong_side() {
        let action = DeclaredAction::SetPosture {
            unit_id: "red_air_1".to_string(),
            posture: crate::world::Posture::Offensive,
        };
        let err = validate_action(&world(), Side::Blue, &action, &rules()).unwrap_err();
        assert!(err.contains("acting side"));
    }

    #[test]
    fn test_validate_rejects_move_beyond_reach() {
        // Frigates at 50 km/h cover 300 km in a 6h turn; ask for ~1000 km.
        let action = DeclaredAction::MoveUnit {
            unit_id: "blue_naval_2".to_string(),
            to: Position::new(32.0, 119.5),
        };
        let err = validate_action(&world(), Side::Blue, &action, &rules()).unwrap_err();
        assert!(err.contains("exceeds per-turn reach"));
    }

    #[test]
    fn test_validate_rejects_engage_out_of_range() {
        // Coastal battery (150 km) against the carrier group on the far shore.
        let action = DeclaredAction::Engage {
            unit_id: "blue_ground_1".to_string(),
            target_id: "red_naval_1".to_string(),
        };
        let err = validate_action(&world(), Side::Blue, &action, &rules()).unwrap_err();
        assert!(err.contains("outside weapon range"));
    }

    #[test]
    fn test_validate_rejects_friendly_target() {
        let action = DeclaredAction::Engage {
            unit_id: "blue_air_1".to_string(),
            target_id: "blue_air_2".to_string(),
        };
        let err = validate_action(&world(), Side::Blue, &action, &rules()).unwrap_err();
        assert!(err.contains("not hostile"));
    }

    #[test]
    fn test_validate_rejects_destroyed_actor() {
        let mut w = world();
        w.units.get_mut("blue_air_1").unwrap().apply_damage(100.0);
        let action = DeclaredAction::SetPosture {
            unit_id: "blue_air_1".to_string(),
            posture: crate::world::Posture::Defensive,
        };
        assert!(validate_action(&w, Side::Blue, &action, &rules()).is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_reinforce() {
        let action = DeclaredAction::Reinforce {
            unit_id: "blue_air_1".to_string(),
            amount: 80.0,
        };
        assert!(validate_action(&world(), Side::Blue, &action, &rules()).is_err());
    }

    #[test]
    fn test_engage_applies_deterministic_attrition() {
        let mut w = world();
        // Bomber wing (3000 km range) can reach any blue unit.
        let action = DeclaredAction::Engage {
            unit_id: "red_air_2".to_string(),
            target_id: "blue_naval_1".to_string(),
        };
        validate_action(&w, Side::Red, &action, &rules()).unwrap();
        apply_action(&mut w, &action, &rules());
        assert_eq!(w.units["blue_naval_1"].strength, 70.0);

        // Same state, same action, same result.
        let mut w2 = world();
        apply_action(&mut w2, &action, &rules());
        assert_eq!(w2.units["blue_naval_1"].strength, 70.0);
    }

    #[test]
    fn test_move_updates_position() {
        let mut w = world();
        let to = Position::with_grid(24.3, 119.8, "TS-2500");
        let action = DeclaredAction::MoveUnit {
            unit_id: "blue_naval_1".to_string(),
            to: to.clone(),
        };
        validate_action(&w, Side::Blue, &action, &rules()).unwrap();
        apply_action(&mut w, &action, &rules());
        assert_eq!(w.units["blue_naval_1"].position, to);
    }

    #[test]
    fn test_capture_sole_presence_takes_objective() {
        let mut w = world();
        // Park a red unit on the contested strait-control objective and
        // every blue unit far away from it.
        let obj_pos = w.objectives["obj_strait_control"].position.clone();
        w.units.get_mut("red_naval_1").unwrap().position = obj_pos;
        for unit in w.units.values_mut() {
            if unit.side == Side::Blue {
                unit.position = Position::new(22.1, 122.4);
            }
        }
        resolve_captures(&mut w, &rules());
        assert_eq!(w.objectives["obj_strait_control"].owner, Owner::Red);
    }

    #[test]
    fn test_capture_joint_presence_contests() {
        let mut w = world();
        let obj_pos = w.objectives["obj_port_access"].position.clone();
        w.units.get_mut("red_air_1").unwrap().position = obj_pos;
        // Blue units already garrison the port objective in the scenario.
        resolve_captures(&mut w, &rules());
        assert_eq!(w.objectives["obj_port_access"].owner, Owner::Contested);
    }

    #[test]
    fn test_capture_empty_radius_leaves_owner() {
        let mut w = world();
        for unit in w.units.values_mut() {
            unit.position = Position::new(22.1, 122.4);
        }
        let before = w.objectives["obj_supply_corridor"].owner;
        resolve_captures(&mut w, &rules());
        assert_eq!(w.objectives["obj_supply_corridor"].owner, before);
    }

    #[test]
    fn test_termination_turn_limit() {
        let mut w = world();
        w.turn = w.max_turns + 1;
        assert_eq!(check_termination(&w), Some(Termination::TurnLimitReached));
    }

    #[test]
    fn test_termination_headquarters_destroyed() {
        let mut w = world();
        w.units.get_mut("blue_hq").unwrap().apply_damage(100.0);
        assert_eq!(
            check_termination(&w),
            Some(Termination::HeadquartersDestroyed { side: Side::Blue })
        );
    }

    #[test]
    fn test_termination_objectives_swept() {
        let mut w = world();
        for obj in w.objectives.values_mut() {
            obj.owner = Owner::Red;
        }
        assert_eq!(
            check_termination(&w),
            Some(Termination::ObjectivesSwept { side: Side::Red })
        );
    }

    #[test]
    fn test_no_termination_mid_run() {
        assert_eq!(check_termination(&world()), None);
    }
}
