//! Wire-format decoding for authored geometry.
//!
//! Authored paths arrive as GeoJSON-shaped `LineString` objects. Anything
//! malformed or of another geometry kind is rejected and treated as "no
//! path" (a zero-length route), never as a hard failure.

use crate::foundation::core::{GeoPoint, RoutePath};

/// Decode a `{"type": "LineString", "coordinates": [[lng, lat], ...]}`
/// value into a [`RoutePath`].
///
/// Returns an empty path for malformed input or non-`LineString`
/// geometries; the rejection is surfaced only as a debug log.
pub fn route_path_from_line_string(value: &serde_json::Value) -> RoutePath {
    let geometry: geojson::Geometry = match serde_json::from_value(value.clone()) {
        Ok(geometry) => geometry,
        Err(err) => {
            tracing::debug!(error = %err, "rejecting malformed path geometry");
            return RoutePath::empty();
        }
    };

    match geometry.value {
        geojson::Value::LineString(coordinates) => {
            let points = coordinates
                .iter()
                .filter_map(|position| match position.as_slice() {
                    [lng, lat, ..] => Some(GeoPoint {
                        lng: *lng,
                        lat: *lat,
                    }),
                    _ => None,
                })
                .collect();
            RoutePath::new(points)
        }
        _ => {
            tracing::debug!("rejecting non-LineString path geometry");
            RoutePath::empty()
        }
    }
}

/// Encode a [`RoutePath`] back into its `LineString` wire shape.
pub fn route_path_to_line_string(path: &RoutePath) -> serde_json::Value {
    let coordinates: Vec<Vec<f64>> = path
        .points()
        .iter()
        .map(|point| vec![point.lng, point.lat])
        .collect();
    serde_json::json!({
        "type": "LineString",
        "coordinates": coordinates,
    })
}
