//! Sandtable Geospatial Toolkit
//!
//! Pure great-circle math and terrain classification for wargaming
//! simulations. Every function here is deterministic and total over valid
//! coordinates: given identical inputs the bit pattern of the output is
//! identical, which lets the evaluation engine recompute "ground truth"
//! distances through the same code path the agents' tools used.

pub mod error;
pub mod terrain;

pub use error::{GeoError, Result};
pub use terrain::{classify_terrain, TerrainClass, TerrainFeature, TerrainProfile};

use serde::{Deserialize, Serialize};

/// Earth's mean radius in kilometers (WGS84-approximated sphere).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Geographic position with an optional military-style grid reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
    /// Grid reference like `TW-1001`; empty when unassigned.
    #[serde(default)]
    pub grid_ref: String,
}

impl Position {
    /// Construct a position without a grid reference.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            grid_ref: String::new(),
        }
    }

    /// Construct a position with a grid reference.
    pub fn with_grid(lat: f64, lon: f64, grid_ref: &str) -> Self {
        Self {
            lat,
            lon,
            grid_ref: grid_ref.to_string(),
        }
    }

    /// Validate that the coordinates lie within the WGS84 domain.
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lon) {
            return Err(GeoError::InvalidCoordinate {
                lat: self.lat,
                lon: self.lon,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.grid_ref.is_empty() {
            write!(f, "({:.4}, {:.4})", self.lat, self.lon)
        } else {
            write!(f, "{} ({:.4}, {:.4})", self.grid_ref, self.lat, self.lon)
        }
    }
}

/// Great-circle distance between two positions in kilometers.
///
/// Uses the haversine formula on a spherical Earth of radius
/// [`EARTH_RADIUS_KM`]. Symmetric: `distance(a, b) == distance(b, a)`, and
/// `distance(a, a) == 0.0`.
pub fn distance(from: &Position, to: &Position) -> Result<f64> {
    from.validate()?;
    to.validate()?;

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlat = (to.lat - from.lat).to_radians();
    let dlon = (to.lon - from.lon).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    Ok(EARTH_RADIUS_KM * c)
}

/// Initial bearing from one position to another, in degrees `[0, 360)`.
///
/// 0 = North, 90 = East.
pub fn bearing(from: &Position, to: &Position) -> Result<f64> {
    from.validate()?;
    to.validate()?;

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlon = (to.lon - from.lon).to_radians();

    let x = dlon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    let deg = x.atan2(y).to_degrees();
    Ok((deg + 360.0) % 360.0)
}

/// Midpoint of the great-circle segment between two positions.
pub fn midpoint(from: &Position, to: &Position) -> Result<Position> {
    from.validate()?;
    to.validate()?;

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlon = (to.lon - from.lon).to_radians();

    let bx = lat2.cos() * dlon.cos();
    let by = lat2.cos() * dlon.sin();

    let lat_mid = (lat1.sin() + lat2.sin()).atan2(((lat1.cos() + bx).powi(2) + by.powi(2)).sqrt());
    let lon_mid = from.lon.to_radians() + by.atan2(lat1.cos() + bx);

    Ok(Position::new(lat_mid.to_degrees(), lon_mid.to_degrees()))
}

/// Transit time in hours for a given distance and speed.
///
/// Total over all numeric input: a non-positive speed yields `+inf` rather
/// than an error, so callers never have to handle a failure path.
pub fn transit_time(distance_km: f64, speed_kmh: f64) -> f64 {
    if speed_kmh <= 0.0 {
        return f64::INFINITY;
    }
    distance_km / speed_kmh
}

/// Whether `target` lies within `range_km` of `unit`.
pub fn within_range(unit: &Position, target: &Position, range_km: f64) -> Result<bool> {
    Ok(distance(unit, target)? <= range_km)
}

/// Convert a bearing in degrees to an eight-point cardinal direction.
pub fn cardinal_direction(bearing_deg: f64) -> &'static str {
    const DIRECTIONS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let normalized = ((bearing_deg % 360.0) + 360.0) % 360.0;
    let index = ((normalized / 45.0).round() as usize) % 8;
    DIRECTIONS[index]
}
