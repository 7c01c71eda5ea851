//! Taiwan Strait crisis scenario.
//!
//! Multi-domain theater: Blue defends island positions, Red contests sea and
//! air control across the strait. Fictional training data for agent
//! evaluation; rosters carry realistic ranges and speeds so transit and
//! engagement validation have something to bite on.

use sandtable_geo::{Position, TerrainClass, TerrainFeature};

use crate::scenario::{MapBounds, Scenario};
use crate::world::{Objective, Owner, Posture, Side, Unit, UnitType};

pub const SCENARIO_ID: &str = "taiwan_strait";

fn unit(
    id: &str,
    name: &str,
    side: Side,
    unit_type: UnitType,
    position: Position,
    capabilities: &[&str],
    range_km: f64,
    speed_kmh: f64,
) -> Unit {
    Unit {
        id: id.to_string(),
        name: name.to_string(),
        side,
        unit_type,
        position,
        strength: 100.0,
        capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        range_km,
        speed_kmh,
        posture: Posture::Defensive,
    }
}

/// Build the Taiwan Strait scenario: 8 Blue units, 9 Red units, 5 objectives.
pub fn build() -> Scenario {
    let blue = vec![
        unit(
            "blue_air_1",
            "1st Fighter Wing",
            Side::Blue,
            UnitType::Air,
            Position::with_grid(25.0777, 121.2325, "TW-1001"),
            &["air_superiority", "intercept", "patrol"],
            800.0,
            2400.0,
        ),
        unit(
            "blue_air_2",
            "2nd Fighter Wing",
            Side::Blue,
            UnitType::Air,
            Position::with_grid(22.6727, 120.4618, "TW-2001"),
            &["air_superiority", "ground_attack"],
            750.0,
            2200.0,
        ),
        unit(
            "blue_awacs_1",
            "Early Warning Squadron",
            Side::Blue,
            UnitType::Air,
            Position::with_grid(24.0, 121.5, "TW-1500"),
            &["early_warning", "surveillance"],
            500.0,
            850.0,
        ),
        unit(
            "blue_naval_1",
            "Destroyer Squadron 1",
            Side::Blue,
            UnitType::Naval,
            Position::with_grid(24.5, 120.0, "TS-3001"),
            &["anti_air", "anti_surface", "missile_defense"],
            300.0,
            55.0,
        ),
        unit(
            "blue_naval_2",
            "Frigate Group Alpha",
            Side::Blue,
            UnitType::Naval,
            Position::with_grid(23.5, 119.5, "TS-4001"),
            &["anti_submarine", "patrol", "escort"],
            250.0,
            50.0,
        ),
        unit(
            "blue_sub_1",
            "Submarine Division 1",
            Side::Blue,
            UnitType::Naval,
            Position::with_grid(24.0, 119.0, "TS-5001"),
            &["anti_surface", "reconnaissance", "mine_laying"],
            400.0,
            40.0,
        ),
        unit(
            "blue_ground_1",
            "Coastal Defense Battery 1",
            Side::Blue,
            UnitType::Ground,
            Position::with_grid(25.1, 121.4, "TW-1010"),
            &["anti_ship_missile", "coastal_defense"],
            150.0,
            0.0,
        ),
        unit(
            "blue_hq",
            "Joint Operations Center",
            Side::Blue,
            UnitType::Ground,
            Position::with_grid(24.9, 121.3, "TW-1100"),
            &["command", "air_defense"],
            200.0,
            0.0,
        ),
    ];

    let red = vec![
        unit(
            "red_air_1",
            "1st Attack Wing",
            Side::Red,
            UnitType::Air,
            Position::with_grid(25.5, 119.0, "ML-1001"),
            &["air_superiority", "strike", "escort"],
            1200.0,
            2500.0,
        ),
        unit(
            "red_air_2",
            "2nd Bomber Wing",
            Side::Red,
            UnitType::Air,
            Position::with_grid(26.0, 119.5, "ML-0501"),
            &["anti_ship", "strike", "standoff_attack"],
            3000.0,
            900.0,
        ),
        unit(
            "red_air_3",
            "Electronic Warfare Squadron",
            Side::Red,
            UnitType::Air,
            Position::with_grid(25.0, 118.5, "ML-2001"),
            &["jamming", "elint", "suppression"],
            600.0,
            800.0,
        ),
        unit(
            "red_naval_1",
            "Carrier Strike Group",
            Side::Red,
            UnitType::Naval,
            Position::with_grid(24.0, 118.0, "EC-1001"),
            &["power_projection", "air_ops"],
            500.0,
            55.0,
        ),
        unit(
            "red_naval_2",
            "Amphibious Ready Group",
            Side::Red,
            UnitType::Naval,
            Position::with_grid(24.5, 118.5, "EC-2001"),
            &["amphibious_assault", "transport", "fire_support"],
            300.0,
            35.0,
        ),
        unit(
            "red_naval_3",
            "Destroyer Squadron East",
            Side::Red,
            UnitType::Naval,
            Position::with_grid(25.0, 118.0, "EC-0501"),
            &["anti_air", "anti_surface", "land_attack"],
            350.0,
            55.0,
        ),
        unit(
            "red_sub_1",
            "Attack Submarine Division",
            Side::Red,
            UnitType::Naval,
            Position::with_grid(23.5, 118.0, "EC-3001"),
            &["anti_surface", "anti_submarine", "reconnaissance"],
            500.0,
            45.0,
        ),
        unit(
            "red_ground_1",
            "Rocket Force Brigade 1",
            Side::Red,
            UnitType::Ground,
            Position::with_grid(26.0, 118.0, "ML-0001"),
            &["ballistic_missile", "cruise_missile", "strike"],
            1500.0,
            0.0,
        ),
        unit(
            "red_hq",
            "Eastern Theater Command",
            Side::Red,
            UnitType::Ground,
            Position::with_grid(25.8, 118.3, "ML-0100"),
            &["command", "air_defense"],
            250.0,
            0.0,
        ),
    ];

    let mut units = blue;
    units.extend(red);

    let objectives = vec![
        Objective {
            id: "obj_strait_control".to_string(),
            name: "Strait Control".to_string(),
            description: "Establish sea control over Taiwan Strait shipping lanes".to_string(),
            position: Position::with_grid(24.5, 119.5, "TS-0000"),
            value: 10,
            owner: Owner::Contested,
        },
        Objective {
            id: "obj_air_superiority".to_string(),
            name: "Air Superiority Zone".to_string(),
            description: "Achieve air superiority over the operational area".to_string(),
            position: Position::with_grid(24.0, 120.0, "AS-0000"),
            value: 9,
            owner: Owner::Contested,
        },
        Objective {
            id: "obj_port_access".to_string(),
            name: "Port Access".to_string(),
            description: "Maintain or deny access to major port facilities".to_string(),
            position: Position::with_grid(25.0, 121.5, "PT-0001"),
            value: 8,
            owner: Owner::Blue,
        },
        Objective {
            id: "obj_early_warning".to_string(),
            name: "Early Warning Network".to_string(),
            description: "Maintain or suppress early warning radar coverage".to_string(),
            position: Position::with_grid(24.5, 121.0, "EW-0001"),
            value: 7,
            owner: Owner::Blue,
        },
        Objective {
            id: "obj_supply_corridor".to_string(),
            name: "Logistics Corridor".to_string(),
            description: "Secure the coastal resupply corridor feeding forward bases".to_string(),
            position: Position::with_grid(25.3, 118.8, "ML-3001"),
            value: 6,
            owner: Owner::Red,
        },
    ];

    let terrain_features = vec![
        TerrainFeature::new(
            "mainland_coast",
            TerrainClass::Coastal,
            Position::new(25.0, 118.3),
            120.0,
        ),
        TerrainFeature::new(
            "strait_narrows",
            TerrainClass::Chokepoint,
            Position::new(24.45, 119.2),
            70.0,
        ),
        TerrainFeature::new(
            "taiwan_west_plain",
            TerrainClass::CoastalUrban,
            Position::new(24.2, 120.6),
            60.0,
        ),
        TerrainFeature::new(
            "central_mountains",
            TerrainClass::Mountain,
            Position::new(23.8, 121.2),
            90.0,
        ),
        TerrainFeature::new(
            "east_coast",
            TerrainClass::Coastal,
            Position::new(23.9, 121.6),
            40.0,
        ),
    ];

    Scenario {
        id: SCENARIO_ID.to_string(),
        name: "Taiwan Strait Crisis".to_string(),
        description: "Multi-domain conflict scenario in the Taiwan Strait region. \
                      Blue Force defends island positions while Red Force seeks to \
                      establish sea and air control."
            .to_string(),
        units,
        objectives,
        terrain_features,
        bounds: MapBounds {
            north: 26.0,
            south: 22.0,
            east: 122.5,
            west: 117.0,
        },
        default_turns: 5,
        default_terrain: TerrainClass::OpenWater,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_counts() {
        let scenario = build();
        assert_eq!(scenario.units_of(Side::Blue).count(), 8);
        assert_eq!(scenario.units_of(Side::Red).count(), 9);
        assert_eq!(scenario.objectives.len(), 5);
    }

    #[test]
    fn test_each_side_has_exactly_one_headquarters() {
        let scenario = build();
        for side in [Side::Blue, Side::Red] {
            let hq_count = scenario
                .units_of(side)
                .filter(|u| u.is_headquarters())
                .count();
            assert_eq!(hq_count, 1, "side {side} should have one HQ");
        }
    }

    #[test]
    fn test_all_positions_within_bounds() {
        let scenario = build();
        for u in &scenario.units {
            assert!(u.position.lat <= scenario.bounds.north + 0.5);
            assert!(u.position.lat >= scenario.bounds.south - 0.5);
            assert!(u.position.lon <= scenario.bounds.east + 0.5);
            assert!(u.position.lon >= scenario.bounds.west - 0.5);
        }
    }

    #[test]
    fn test_all_units_start_ready() {
        let scenario = build();
        for u in &scenario.units {
            assert_eq!(u.strength, 100.0, "unit {} should start at full strength", u.id);
        }
    }

    #[test]
    fn test_unit_ids_are_unique() {
        let scenario = build();
        let mut ids: Vec<&str> = scenario.units.iter().map(|u| u.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), scenario.units.len());
    }
}
