use crate::foundation::error::{StorypathError, StorypathResult};

/// A geographic position as longitude/latitude in degrees.
///
/// Construction through [`GeoPoint::new`] validates ranges; serde
/// deserialization is unchecked (wire data is validated separately via
/// [`GeoPoint::validate`] when a document is loaded).
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    /// Longitude in degrees, [-180, 180].
    pub lng: f64,
    /// Latitude in degrees, [-90, 90].
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lng: f64, lat: f64) -> StorypathResult<Self> {
        let p = Self { lng, lat };
        p.validate()?;
        Ok(p)
    }

    /// Out-of-range coordinates are an error, never clamped.
    pub fn validate(&self) -> StorypathResult<()> {
        if !self.lng.is_finite() || !self.lat.is_finite() {
            return Err(StorypathError::validation(
                "GeoPoint coordinates must be finite",
            ));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(StorypathError::validation(
                "GeoPoint lng must be within [-180, 180]",
            ));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(StorypathError::validation(
                "GeoPoint lat must be within [-90, 90]",
            ));
        }
        Ok(())
    }

    /// Whether this point can participate in geometry scans.
    ///
    /// Upstream documents may carry malformed points; those are skipped
    /// rather than aborting the whole path.
    pub fn is_usable(&self) -> bool {
        self.validate().is_ok()
    }
}

/// An ordered polyline; insertion order is traversal order.
///
/// A path with fewer than two points has zero length.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RoutePath(pub Vec<GeoPoint>);

impl RoutePath {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self(points)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<GeoPoint> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<GeoPoint> {
        self.0.last().copied()
    }
}

impl From<Vec<GeoPoint>> for RoutePath {
    fn from(points: Vec<GeoPoint>) -> Self {
        Self(points)
    }
}

/// A captured viewport state in the camera wire format:
/// `{ center: [lng, lat], zoom, bearing?, pitch? }`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraState {
    /// Viewport center as `[lng, lat]`.
    pub center: [f64; 2],
    /// Viewport zoom level.
    pub zoom: f64,
    /// Viewport bearing in degrees, if captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,
    /// Viewport pitch in degrees, if captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
}

impl CameraState {
    pub fn center_point(&self) -> GeoPoint {
        GeoPoint {
            lng: self.center[0],
            lat: self.center[1],
        }
    }

    pub fn validate(&self) -> StorypathResult<()> {
        self.center_point().validate()?;
        if !self.zoom.is_finite() || self.zoom < 0.0 {
            return Err(StorypathError::validation(
                "CameraState zoom must be finite and >= 0",
            ));
        }
        Ok(())
    }
}
