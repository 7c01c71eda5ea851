//! Terrain classification against scenario-defined features.
//!
//! A scenario carries a list of [`TerrainFeature`]s, each a named region
//! anchored at a position with an inclusion radius. Classification is
//! nearest-feature-wins: the closest feature whose radius contains the query
//! position decides the class; outside every radius the theater default
//! applies (`OpenWater` for maritime theaters, `OpenLand` otherwise).

use serde::{Deserialize, Serialize};

use crate::{distance, Position, Result};

/// Terrain classes recognised by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainClass {
    OpenWater,
    Coastal,
    CoastalUrban,
    Mountain,
    Chokepoint,
    OpenLand,
}

impl TerrainClass {
    /// Static tactical profile for this class.
    pub fn profile(&self) -> TerrainProfile {
        match self {
            TerrainClass::OpenWater => TerrainProfile {
                defensibility: 2,
                cover: 1,
                mobility: 8,
                description: "Open water, limited concealment for surface forces",
            },
            TerrainClass::Coastal => TerrainProfile {
                defensibility: 7,
                cover: 6,
                mobility: 7,
                description: "Coastal terrain with port and basing infrastructure",
            },
            TerrainClass::CoastalUrban => TerrainProfile {
                defensibility: 8,
                cover: 7,
                mobility: 6,
                description: "Narrow coastal plain with urban density",
            },
            TerrainClass::Mountain => TerrainProfile {
                defensibility: 9,
                cover: 8,
                mobility: 3,
                description: "High terrain, heavily forested, restricted movement",
            },
            TerrainClass::Chokepoint => TerrainProfile {
                defensibility: 4,
                cover: 2,
                mobility: 5,
                description: "Constrained transit corridor, heavy traffic",
            },
            TerrainClass::OpenLand => TerrainProfile {
                defensibility: 5,
                cover: 4,
                mobility: 8,
                description: "Open terrain, standard considerations apply",
            },
        }
    }
}

impl std::fmt::Display for TerrainClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TerrainClass::OpenWater => "open_water",
            TerrainClass::Coastal => "coastal",
            TerrainClass::CoastalUrban => "coastal_urban",
            TerrainClass::Mountain => "mountain",
            TerrainClass::Chokepoint => "chokepoint",
            TerrainClass::OpenLand => "open_land",
        };
        write!(f, "{s}")
    }
}

/// Tactical characteristics of a terrain class (1-10 scales).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainProfile {
    pub defensibility: u8,
    pub cover: u8,
    pub mobility: u8,
    pub description: &'static str,
}

/// A named terrain region in a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainFeature {
    pub name: String,
    pub class: TerrainClass,
    pub center: Position,
    /// Maximum inclusion radius in kilometers.
    pub radius_km: f64,
}

impl TerrainFeature {
    pub fn new(name: &str, class: TerrainClass, center: Position, radius_km: f64) -> Self {
        Self {
            name: name.to_string(),
            class,
            center,
            radius_km,
        }
    }
}

/// Classify the terrain at `position` against `features`.
///
/// Nearest-feature-wins among features whose inclusion radius contains the
/// position; ties on distance keep the earlier feature in the list. Outside
/// every radius, `default` applies.
pub fn classify_terrain(
    position: &Position,
    features: &[TerrainFeature],
    default: TerrainClass,
) -> Result<TerrainClass> {
    position.validate()?;

    let mut best: Option<(f64, TerrainClass)> = None;
    for feature in features {
        let d = distance(position, &feature.center)?;
        if d > feature.radius_km {
            continue;
        }
        match best {
            Some((best_d, _)) if best_d <= d => {}
            _ => best = Some((d, feature.class)),
        }
    }

    Ok(best.map(|(_, class)| class).unwrap_or(default))
}
