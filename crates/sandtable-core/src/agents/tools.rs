//! Bounded geospatial tool registry for agent adapters.
//!
//! Agents request calculations via fenced ` ```tool ` blocks; the adapter
//! executes each request here and records a [`ToolCallRecord`] on the
//! resulting message. The evaluation engine later replays the same toolkit
//! functions to verify claimed figures against actual tool output.

use serde::Deserialize;
use serde_json::Value;

use sandtable_geo::{
    bearing, cardinal_direction, classify_terrain, distance, transit_time, Position, TerrainClass,
    TerrainFeature,
};

use crate::scenario::Scenario;
use crate::world::ToolCallRecord;

/// A parsed tool request from agent output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolRequest {
    pub tool: String,
    #[serde(default)]
    pub args: Value,
}

/// Extract every fenced ` ```tool ` block from agent output.
///
/// Returns `Err` when a block exists but does not parse as a tool request
/// object; that is a malformed response under the adapter's retry policy.
pub fn tool_requests(content: &str) -> Result<Vec<ToolRequest>, String> {
    let mut requests = Vec::new();
    let mut rest = content;
    while let Some(start) = rest.find("```tool") {
        let body = &rest[start + "```tool".len()..];
        let Some(end) = body.find("```") else {
            return Err("unterminated tool block".to_string());
        };
        let block = body[..end].trim();
        let request: ToolRequest =
            serde_json::from_str(block).map_err(|e| format!("invalid tool block: {e}"))?;
        requests.push(request);
        rest = &body[end + 3..];
    }
    Ok(requests)
}

#[derive(Deserialize)]
struct PairArgs {
    from: Position,
    to: Position,
}

#[derive(Deserialize)]
struct TransitArgs {
    distance_km: f64,
    speed_kmh: f64,
}

#[derive(Deserialize)]
struct PointArgs {
    lat: f64,
    lon: f64,
}

/// The bounded set of geospatial tools available to one adapter.
///
/// Terrain lookups resolve against the owning scenario's feature list.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    features: Vec<TerrainFeature>,
    default_terrain: TerrainClass,
}

impl ToolRegistry {
    /// Build the registry for a scenario.
    pub fn for_scenario(scenario: &Scenario) -> Self {
        Self {
            features: scenario.terrain_features.clone(),
            default_terrain: scenario.default_terrain,
        }
    }

    /// Names of the callable tools.
    pub fn tool_names() -> &'static [&'static str] {
        &["distance", "bearing", "transit_time", "terrain"]
    }

    /// Execute one tool request, returning the audit record.
    ///
    /// Any failure (unknown tool, bad arguments, invalid coordinates) is
    /// reported as `Err` and counts as a tool failure for the adapter.
    pub fn execute(&self, request: &ToolRequest) -> Result<ToolCallRecord, String> {
        let result = match request.tool.as_str() {
            "distance" => {
                let args: PairArgs = parse_args(&request.args)?;
                let km = distance(&args.from, &args.to).map_err(|e| e.to_string())?;
                let brg = bearing(&args.from, &args.to).map_err(|e| e.to_string())?;
                format!(
                    "Distance: {km:.1} km\nBearing: {brg:.1} deg ({})\nAir transit (800 km/h): {:.1} h\nNaval transit (50 km/h): {:.1} h",
                    cardinal_direction(brg),
                    transit_time(km, 800.0),
                    transit_time(km, 50.0),
                )
            }
            "bearing" => {
                let args: PairArgs = parse_args(&request.args)?;
                let brg = bearing(&args.from, &args.to).map_err(|e| e.to_string())?;
                format!("Bearing: {brg:.1} deg ({})", cardinal_direction(brg))
            }
            "transit_time" => {
                let args: TransitArgs = parse_args(&request.args)?;
                let hours = transit_time(args.distance_km, args.speed_kmh);
                if hours.is_infinite() {
                    "Transit time: unreachable (non-positive speed)".to_string()
                } else {
                    format!("Transit time: {hours:.2} h")
                }
            }
            "terrain" => {
                let args: PointArgs = parse_args(&request.args)?;
                let position = Position::new(args.lat, args.lon);
                let class = classify_terrain(&position, &self.features, self.default_terrain)
                    .map_err(|e| e.to_string())?;
                let profile = class.profile();
                format!(
                    "Terrain: {class}\nDefensibility: {}/10, Cover: {}/10, Mobility: {}/10\n{}",
                    profile.defensibility, profile.cover, profile.mobility, profile.description,
                )
            }
            other => return Err(format!("unknown tool: {other}")),
        };

        Ok(ToolCallRecord {
            tool_name: request.tool.clone(),
            arguments: request.args.clone(),
            result,
        })
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(args: &Value) -> Result<T, String> {
    serde_json::from_value(args.clone()).map_err(|e| format!("bad tool arguments: {e}"))
}
