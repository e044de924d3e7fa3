//! Pure great-circle math over ordered polylines.
//!
//! All functions skip points with non-finite or out-of-range coordinates
//! during their scan; upstream documents may carry malformed data and a
//! single bad vertex must not take down a whole route.

use crate::foundation::core::{GeoPoint, RoutePath};
use crate::foundation::error::{StorypathError, StorypathResult};

/// Haversine great-circle distance between two points, in kilometers.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let ap = haversine_rs::point::Point {
        latitude: a.lat,
        longitude: a.lng,
    };
    let bp = haversine_rs::point::Point {
        latitude: b.lat,
        longitude: b.lng,
    };
    haversine_rs::distance(ap, bp, haversine_rs::units::Unit::Kilometers)
}

/// Total length of a path in kilometers; 0 for paths of one point or fewer.
pub fn path_length_km(path: &RoutePath) -> f64 {
    let pts = usable_points(path);
    pts.windows(2).map(|w| distance_km(w[0], w[1])).sum()
}

/// Point at `distance_km` along the path, linearly interpolated inside the
/// bracketing segment.
///
/// `d <= 0` returns the first point, `d >= path_length_km` the last. If the
/// path holds no usable point at all the scan has nothing to anchor on and
/// [`StorypathError::NoValidPoint`] is returned.
pub fn position_at_distance(path: &RoutePath, distance: f64) -> StorypathResult<GeoPoint> {
    let pts = usable_points(path);
    let first = *pts.first().ok_or(StorypathError::NoValidPoint)?;
    if distance <= 0.0 {
        return Ok(first);
    }

    let mut walked = 0.0;
    for w in pts.windows(2) {
        let seg = distance_km(w[0], w[1]);
        if walked + seg >= distance {
            if seg <= 0.0 {
                return Ok(w[1]);
            }
            let t = (distance - walked) / seg;
            return Ok(lerp(w[0], w[1], t));
        }
        walked += seg;
    }

    // d is at or past the end of the path.
    Ok(*pts.last().unwrap_or(&first))
}

/// Initial bearing of the segment bracketing `distance_km`, in degrees
/// [0, 360).
///
/// `None` when `distance` exceeds the path length: there is no bracketing
/// segment and the icon is stationary at the destination, so no further
/// rotation is implied.
pub fn bearing_at_distance(path: &RoutePath, distance: f64) -> Option<f64> {
    let pts = usable_points(path);
    if pts.len() < 2 {
        return None;
    }

    let total: f64 = pts.windows(2).map(|w| distance_km(w[0], w[1])).sum();
    if distance > total {
        return None;
    }

    let d = distance.max(0.0);
    let mut walked = 0.0;
    let mut last_bearing = None;
    for w in pts.windows(2) {
        let seg = distance_km(w[0], w[1]);
        if seg > 0.0 {
            last_bearing = Some(initial_bearing_deg(w[0], w[1]));
            if walked + seg >= d {
                return last_bearing;
            }
        }
        walked += seg;
    }
    last_bearing
}

/// The prefix of `path` covered by `progress * path_length_km(path)`, plus
/// one interpolated point at the cut.
///
/// Monotonic in `progress`: for p1 < p2 the p1 sub-path is a prefix of the
/// p2 sub-path up to the interpolated tail point. At `progress = 1` the
/// sub-path covers the full length.
pub fn visited_sub_path(path: &RoutePath, progress: f64) -> RoutePath {
    let pts = usable_points(path);
    let Some(&first) = pts.first() else {
        return RoutePath::empty();
    };

    let progress = progress.clamp(0.0, 1.0);
    let total: f64 = pts.windows(2).map(|w| distance_km(w[0], w[1])).sum();
    let target = progress * total;
    if target >= total {
        return RoutePath::new(pts);
    }

    let mut out = vec![first];
    let mut walked = 0.0;
    for w in pts.windows(2) {
        let seg = distance_km(w[0], w[1]);
        if walked + seg < target {
            out.push(w[1]);
            walked += seg;
            continue;
        }
        if seg > 0.0 {
            let t = (target - walked) / seg;
            out.push(lerp(w[0], w[1], t));
        }
        break;
    }
    RoutePath::new(out)
}

fn usable_points(path: &RoutePath) -> Vec<GeoPoint> {
    path.points()
        .iter()
        .copied()
        .filter(GeoPoint::is_usable)
        .collect()
}

fn lerp(a: GeoPoint, b: GeoPoint, t: f64) -> GeoPoint {
    GeoPoint {
        lng: a.lng + (b.lng - a.lng) * t,
        lat: a.lat + (b.lat - a.lat) * t,
    }
}

fn initial_bearing_deg(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();
    let y = delta_lng.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lng.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}
