//! Domain-level error taxonomy for Sandtable.

use crate::world::Role;

/// Errors produced by a single agent-adapter invocation.
///
/// Any of these triggers the orchestrator's retry-once policy; a second
/// failure finalizes the run as `failed` with the partial transcript kept.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("completion call for {role} timed out after {seconds}s")]
    Timeout { role: Role, seconds: u64 },

    #[error("completion call for {role} failed: {detail}")]
    Completion { role: Role, detail: String },

    #[error("malformed response from {role}: {detail}")]
    MalformedResponse { role: Role, detail: String },

    #[error("tool call '{tool}' failed for {role}: {detail}")]
    Tool {
        role: Role,
        tool: String,
        detail: String,
    },
}

/// Sandtable domain errors.
#[derive(Debug, thiserror::Error)]
pub enum SandtableError {
    #[error("scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("unknown benchmark: {0}")]
    UnknownBenchmark(String),

    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("geospatial error: {0}")]
    Geo(#[from] sandtable_geo::GeoError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Sandtable domain operations.
pub type Result<T> = std::result::Result<T, SandtableError>;
