//! Host rendering-surface contract.
//!
//! The engine never draws pixels. It requires only a viewport it can move,
//! plus two polylines and one marker per route; anything providing this
//! contract (a map widget, a canvas renderer, a game-engine viewport) can
//! host the core unmodified. [`HeadlessSurface`] is the always-available
//! in-memory implementation used by simulations and tests.

mod headless;

pub use headless::{HeadlessSurface, OverlaySnapshot};

use crate::foundation::core::{CameraState, GeoPoint, RoutePath};
use crate::foundation::error::StorypathResult;
use crate::storymap::model::{IconSpec, RouteStyle};

/// Viewport get/set with optional eased transitions.
///
/// Easing itself is owned by the host; durations are hints in milliseconds.
pub trait Viewport {
    fn center(&self) -> GeoPoint;
    fn zoom(&self) -> f64;
    /// Hard cut to a captured camera state.
    fn jump_to(&mut self, camera: &CameraState);
    /// Eased transition to a captured camera state.
    fn ease_to(&mut self, camera: &CameraState, duration_ms: f64);
    /// Eased pan; never changes zoom.
    fn ease_center_to(&mut self, center: GeoPoint, duration_ms: f64);
    /// Eased zoom change; never changes center.
    fn ease_zoom_to(&mut self, zoom: f64, duration_ms: f64);
}

/// Drawing operations the engine needs from a host map surface.
///
/// Each route owns distinct overlay objects keyed by its route id; the
/// engine never makes two routes share one overlay.
pub trait MapSurface {
    fn viewport(&mut self) -> &mut dyn Viewport;

    /// Create the overlay objects (two polylines, one marker) for a route.
    ///
    /// May fail with [`crate::StorypathError::SurfaceNotReady`] when the
    /// host surface is not mounted yet; the engine retries once on a later
    /// tick before giving up on the route.
    fn create_route_overlay(&mut self, route_id: &str) -> StorypathResult<()>;

    /// Release the overlay objects for a route.
    fn remove_route_overlay(&mut self, route_id: &str);

    /// Redraw the full (unvisited) route polyline.
    fn set_full_path(&mut self, route_id: &str, path: &RoutePath, style: &RouteStyle);

    /// Redraw the traveled trail.
    fn set_visited_path(&mut self, route_id: &str, path: &RoutePath, style: &RouteStyle);

    /// Move the route marker.
    fn set_marker(
        &mut self,
        route_id: &str,
        position: GeoPoint,
        bearing_deg: Option<f64>,
        icon: &IconSpec,
    );
}
