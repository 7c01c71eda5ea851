//! Error taxonomy for geospatial operations.

/// Errors produced by the geospatial toolkit.
///
/// These are caller errors: the toolkit is total over valid numeric input,
/// so the only failure path is a coordinate outside the WGS84 domain.
/// Never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoError {
    #[error("invalid coordinate: lat {lat} lon {lon} (lat must be in [-90, 90], lon in [-180, 180])")]
    InvalidCoordinate { lat: f64, lon: f64 },
}

/// Result type for geospatial operations.
pub type Result<T> = std::result::Result<T, GeoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_coordinate_display_carries_both_values() {
        let err = GeoError::InvalidCoordinate {
            lat: 91.0,
            lon: 200.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("91"));
        assert!(msg.contains("200"));
    }
}
