use crate::foundation::core::{CameraState, GeoPoint, RoutePath};
use crate::foundation::error::{StorypathError, StorypathResult};
use crate::geo::path;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A complete storymap document.
///
/// A storymap is a pure data model: built by an authoring tool, serialized
/// via Serde (JSON), and played back by [`crate::PlaybackSession`]. Nothing
/// here is mutated during playback; segments and routes are replaced
/// wholesale when re-authored.
pub struct Storymap {
    /// Document title for authoring/debugging.
    pub title: String,
    /// Ordered presentation segments.
    pub segments: Vec<Segment>,
}

impl Storymap {
    pub fn validate(&self) -> StorypathResult<()> {
        for segment in &self.segments {
            segment.validate()?;
        }
        Ok(())
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One authored unit of a storymap: a camera view plus animated routes.
pub struct Segment {
    /// Segment identifier (stable within a document).
    pub id: String,
    /// Segment name for authoring/debugging.
    #[serde(default)]
    pub name: String,
    /// Captured camera state applied when the segment starts playing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraState>,
    /// Animated routes belonging to this segment.
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

impl Segment {
    pub fn validate(&self) -> StorypathResult<()> {
        if self.id.is_empty() {
            return Err(StorypathError::validation("Segment id must not be empty"));
        }
        if let Some(camera) = &self.camera {
            camera.validate()?;
        }
        let mut seen = std::collections::BTreeSet::new();
        for route in &self.routes {
            route.validate()?;
            if !seen.insert(route.id.as_str()) {
                return Err(StorypathError::validation(format!(
                    "duplicate route id `{}` in segment `{}`",
                    route.id, self.id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Immutable per-route configuration.
///
/// Owned by the segment that declares it; never mutated after creation,
/// only replaced.
pub struct RouteSpec {
    /// Route identifier (stable within a segment).
    pub id: String,
    /// Traversal polyline.
    pub path: RoutePath,
    /// Start endpoint; may differ slightly from the first path vertex.
    pub from: GeoPoint,
    /// End endpoint; may differ slightly from the last path vertex.
    pub to: GeoPoint,
    /// Animation duration in milliseconds; must be > 0.
    pub duration_ms: f64,
    /// Visual style for the unvisited/visited polylines.
    #[serde(default)]
    pub style: RouteStyle,
    /// Icon drawn at the moving position.
    #[serde(default)]
    pub icon: IconSpec,
    /// Optional camera-follow override for this route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow: Option<FollowSpec>,
    /// When this route starts relative to segment playback.
    #[serde(default)]
    pub start: StartPolicy,
}

impl RouteSpec {
    pub fn validate(&self) -> StorypathResult<()> {
        if self.id.is_empty() {
            return Err(StorypathError::validation("RouteSpec id must not be empty"));
        }
        if !self.duration_ms.is_finite() || self.duration_ms <= 0.0 {
            return Err(StorypathError::validation(
                "RouteSpec duration_ms must be > 0",
            ));
        }
        self.from.validate()?;
        self.to.validate()?;
        if let StartPolicy::AfterDelay { offset_ms } = self.start
            && (!offset_ms.is_finite() || offset_ms < 0.0)
        {
            return Err(StorypathError::validation(
                "StartPolicy offset_ms must be >= 0",
            ));
        }
        Ok(())
    }

    /// Total length of the route polyline in kilometers.
    pub fn length_km(&self) -> f64 {
        path::path_length_km(&self.path)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Polyline colors and widths for the traveled and untraveled portions.
pub struct RouteStyle {
    /// Color of the not-yet-traveled line (CSS color string).
    pub unvisited_color: String,
    /// Width of the not-yet-traveled line in pixels.
    pub unvisited_width_px: f64,
    /// Color of the traveled trail.
    pub visited_color: String,
    /// Width of the traveled trail in pixels.
    pub visited_width_px: f64,
}

impl Default for RouteStyle {
    fn default() -> Self {
        Self {
            unvisited_color: "#9aa7b1".to_owned(),
            unvisited_width_px: 2.0,
            visited_color: "#1f6feb".to_owned(),
            visited_width_px: 3.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Icon drawn at the route's moving position.
pub struct IconSpec {
    /// Symbol identifier understood by the host surface.
    pub symbol: String,
    /// Icon size in pixels.
    pub size_px: f64,
    /// Whether the icon rotates to the current bearing.
    #[serde(default)]
    pub rotate_with_bearing: bool,
}

impl Default for IconSpec {
    fn default() -> Self {
        Self {
            symbol: "arrow".to_owned(),
            size_px: 24.0,
            rotate_with_bearing: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Per-route camera-follow override.
pub struct FollowSpec {
    /// Whether the camera re-centers on the moving icon.
    pub enabled: bool,
    /// Optional explicit zoom applied once when following starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "policy", rename_all = "camelCase")]
/// When a route begins playing relative to its segment.
pub enum StartPolicy {
    /// Play as soon as the segment plays.
    #[default]
    Immediate,
    /// Play once the segment has been playing for `offset_ms`.
    #[serde(rename_all = "camelCase")]
    AfterDelay {
        /// Delay from segment start, milliseconds.
        offset_ms: f64,
    },
    /// Play once the preceding route in the segment completes.
    AfterPrevious,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lng: f64, lat: f64) -> GeoPoint {
        GeoPoint { lng, lat }
    }

    fn route(id: &str) -> RouteSpec {
        RouteSpec {
            id: id.to_owned(),
            path: RoutePath::new(vec![p(0.0, 0.0), p(0.0, 1.0)]),
            from: p(0.0, 0.0),
            to: p(0.0, 1.0),
            duration_ms: 1000.0,
            style: RouteStyle::default(),
            icon: IconSpec::default(),
            follow: None,
            start: StartPolicy::Immediate,
        }
    }

    #[test]
    fn validate_rejects_bad_duration() {
        let mut r = route("a");
        r.duration_ms = 0.0;
        assert!(r.validate().is_err());
        r.duration_ms = f64::NAN;
        assert!(r.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_route_ids() {
        let segment = Segment {
            id: "s1".to_owned(),
            name: String::new(),
            camera: None,
            routes: vec![route("a"), route("a")],
        };
        assert!(segment.validate().is_err());
    }

    #[test]
    fn start_policy_serde_round_trip() {
        let spec = StartPolicy::AfterDelay { offset_ms: 250.0 };
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("afterDelay"));
        assert!(json.contains("offsetMs"));
        let back: StartPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn storymap_round_trips_through_json() {
        let map = Storymap {
            title: "demo".to_owned(),
            segments: vec![Segment {
                id: "s1".to_owned(),
                name: "intro".to_owned(),
                camera: Some(CameraState {
                    center: [0.0, 0.5],
                    zoom: 6.0,
                    bearing: None,
                    pitch: None,
                }),
                routes: vec![route("a")],
            }],
        };
        map.validate().unwrap();
        let json = serde_json::to_string_pretty(&map).unwrap();
        let back: Storymap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
