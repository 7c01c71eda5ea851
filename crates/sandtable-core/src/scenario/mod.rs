//! Immutable scenario definitions and the scenario store.
//!
//! A [`Scenario`] is loaded once and never mutated by a run;
//! [`Scenario::instantiate`] produces the fresh mutable [`WorldState`] a run
//! owns, so one `Arc<Scenario>` can safely back any number of concurrent
//! runs.

pub mod taiwan_strait;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use sandtable_geo::{Position, TerrainClass, TerrainFeature};

use crate::error::{Result, SandtableError};
use crate::world::{Objective, Side, Unit, WorldState};

/// Geographic bounds of a theater.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl MapBounds {
    /// Center of the bounding box.
    pub fn center(&self) -> Position {
        Position::new(
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }
}

/// An immutable theater definition: rosters, objectives, terrain, limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub description: String,
    pub units: Vec<Unit>,
    pub objectives: Vec<Objective>,
    pub terrain_features: Vec<TerrainFeature>,
    pub bounds: MapBounds,
    /// Default turn limit when a run does not override it.
    pub default_turns: u32,
    /// Terrain class outside every feature's inclusion radius.
    pub default_terrain: TerrainClass,
}

impl Scenario {
    /// SHA-256 hex digest of the canonical scenario JSON.
    ///
    /// Recorded on every run so a transcript can be tied to the exact
    /// scenario revision it was produced against.
    pub fn digest(&self) -> String {
        use sha2::Digest as _;
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(sha2::Sha256::digest(&bytes))
    }

    /// Produce a fresh mutable world state for a new run.
    pub fn instantiate(&self) -> WorldState {
        let units: BTreeMap<String, Unit> = self
            .units
            .iter()
            .map(|u| (u.id.clone(), u.clone()))
            .collect();
        let objectives: BTreeMap<String, Objective> = self
            .objectives
            .iter()
            .map(|o| (o.id.clone(), o.clone()))
            .collect();

        WorldState {
            scenario_name: self.name.clone(),
            turn: 1,
            max_turns: self.default_turns,
            units,
            objectives,
            log: Vec::new(),
        }
    }

    /// Units of one side, roster order.
    pub fn units_of(&self, side: Side) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |u| u.side == side)
    }

    /// Names of all units, used by the opponent-modeling metric.
    pub fn unit_names(&self, side: Side) -> Vec<String> {
        self.units_of(side).map(|u| u.name.clone()).collect()
    }

    /// Names of all objectives.
    pub fn objective_names(&self) -> Vec<String> {
        self.objectives.iter().map(|o| o.name.clone()).collect()
    }
}

/// Registry of built-in scenarios, loaded by id.
#[derive(Debug, Default)]
pub struct ScenarioStore;

impl ScenarioStore {
    /// Load a scenario by id.
    ///
    /// Fails with [`SandtableError::ScenarioNotFound`] for unknown ids.
    pub fn load(scenario_id: &str) -> Result<Arc<Scenario>> {
        match scenario_id {
            taiwan_strait::SCENARIO_ID => Ok(Arc::new(taiwan_strait::build())),
            other => Err(SandtableError::ScenarioNotFound(other.to_string())),
        }
    }

    /// Ids of all available scenarios.
    pub fn available() -> Vec<&'static str> {
        vec![taiwan_strait::SCENARIO_ID]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_unknown_scenario_fails() {
        let err = ScenarioStore::load("eastern_europe").unwrap_err();
        assert!(matches!(err, SandtableError::ScenarioNotFound(_)));
    }

    #[test]
    fn test_load_taiwan_strait() {
        let scenario = ScenarioStore::load("taiwan_strait").unwrap();
        assert_eq!(scenario.id, "taiwan_strait");
    }

    #[test]
    fn test_digest_is_stable() {
        let a = ScenarioStore::load("taiwan_strait").unwrap();
        let b = ScenarioStore::load("taiwan_strait").unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn test_instantiate_produces_independent_worlds() {
        let scenario = ScenarioStore::load("taiwan_strait").unwrap();
        let mut world_a = scenario.instantiate();
        let world_b = scenario.instantiate();

        // Mutating one run's world leaves the scenario and sibling runs alone.
        world_a
            .units
            .get_mut("blue_air_1")
            .unwrap()
            .apply_damage(40.0);
        assert_eq!(world_b.units["blue_air_1"].strength, 100.0);
        assert_eq!(
            scenario.units.iter().find(|u| u.id == "blue_air_1").unwrap().strength,
            100.0
        );
    }

    #[test]
    fn test_bounds_center() {
        let bounds = MapBounds {
            north: 26.0,
            south: 22.0,
            east: 122.5,
            west: 117.0,
        };
        let center = bounds.center();
        assert!((center.lat - 24.0).abs() < 1e-9);
        assert!((center.lon - 119.75).abs() < 1e-9);
    }
}
