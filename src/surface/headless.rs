use std::collections::BTreeMap;

use crate::foundation::core::{CameraState, GeoPoint, RoutePath};
use crate::foundation::error::{StorypathError, StorypathResult};
use crate::storymap::model::{IconSpec, RouteStyle};
use crate::surface::{MapSurface, Viewport};

/// Latest drawn state of one route overlay.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlaySnapshot {
    pub full_path: RoutePath,
    pub visited_path: RoutePath,
    pub marker: Option<GeoPoint>,
    pub marker_bearing_deg: Option<f64>,
}

/// In-memory [`MapSurface`] with no rendering backend.
///
/// Records the last state of every overlay and viewport command so
/// simulations and tests can observe what a real host would have drawn.
/// Transitions are applied instantly; eased durations are recorded only.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    ready: bool,
    center: GeoPoint,
    zoom: f64,
    overlays: BTreeMap<String, OverlaySnapshot>,
    ease_commands: usize,
    last_ease_duration_ms: Option<f64>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            ready: true,
            center: GeoPoint { lng: 0.0, lat: 0.0 },
            zoom: 1.0,
            ..Self::default()
        }
    }

    /// A surface that reports [`StorypathError::SurfaceNotReady`] until
    /// [`HeadlessSurface::set_ready`] is called.
    pub fn unmounted() -> Self {
        Self {
            ready: false,
            center: GeoPoint { lng: 0.0, lat: 0.0 },
            zoom: 1.0,
            ..Self::default()
        }
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn overlay(&self, route_id: &str) -> Option<&OverlaySnapshot> {
        self.overlays.get(route_id)
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    /// Number of eased viewport commands issued so far.
    pub fn ease_commands(&self) -> usize {
        self.ease_commands
    }

    pub fn last_ease_duration_ms(&self) -> Option<f64> {
        self.last_ease_duration_ms
    }
}

impl Viewport for HeadlessSurface {
    fn center(&self) -> GeoPoint {
        self.center
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn jump_to(&mut self, camera: &CameraState) {
        self.center = camera.center_point();
        self.zoom = camera.zoom;
    }

    fn ease_to(&mut self, camera: &CameraState, duration_ms: f64) {
        self.center = camera.center_point();
        self.zoom = camera.zoom;
        self.ease_commands += 1;
        self.last_ease_duration_ms = Some(duration_ms);
    }

    fn ease_center_to(&mut self, center: GeoPoint, duration_ms: f64) {
        self.center = center;
        self.ease_commands += 1;
        self.last_ease_duration_ms = Some(duration_ms);
    }

    fn ease_zoom_to(&mut self, zoom: f64, duration_ms: f64) {
        self.zoom = zoom;
        self.ease_commands += 1;
        self.last_ease_duration_ms = Some(duration_ms);
    }
}

impl MapSurface for HeadlessSurface {
    fn viewport(&mut self) -> &mut dyn Viewport {
        self
    }

    fn create_route_overlay(&mut self, route_id: &str) -> StorypathResult<()> {
        if !self.ready {
            return Err(StorypathError::SurfaceNotReady);
        }
        self.overlays
            .insert(route_id.to_owned(), OverlaySnapshot::default());
        Ok(())
    }

    fn remove_route_overlay(&mut self, route_id: &str) {
        self.overlays.remove(route_id);
    }

    fn set_full_path(&mut self, route_id: &str, path: &RoutePath, _style: &RouteStyle) {
        if let Some(overlay) = self.overlays.get_mut(route_id) {
            overlay.full_path = path.clone();
        }
    }

    fn set_visited_path(&mut self, route_id: &str, path: &RoutePath, _style: &RouteStyle) {
        if let Some(overlay) = self.overlays.get_mut(route_id) {
            overlay.visited_path = path.clone();
        }
    }

    fn set_marker(
        &mut self,
        route_id: &str,
        position: GeoPoint,
        bearing_deg: Option<f64>,
        _icon: &IconSpec,
    ) {
        if let Some(overlay) = self.overlays.get_mut(route_id) {
            overlay.marker = Some(position);
            overlay.marker_bearing_deg = bearing_deg;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmounted_surface_rejects_overlay_creation() {
        let mut surface = HeadlessSurface::unmounted();
        assert!(matches!(
            surface.create_route_overlay("r1"),
            Err(StorypathError::SurfaceNotReady)
        ));
        surface.set_ready(true);
        assert!(surface.create_route_overlay("r1").is_ok());
    }

    #[test]
    fn overlays_are_keyed_by_route_id() {
        let mut surface = HeadlessSurface::new();
        surface.create_route_overlay("a").unwrap();
        surface.create_route_overlay("b").unwrap();
        surface.set_marker(
            "a",
            GeoPoint { lng: 1.0, lat: 1.0 },
            Some(90.0),
            &IconSpec::default(),
        );
        assert_eq!(
            surface.overlay("a").unwrap().marker,
            Some(GeoPoint { lng: 1.0, lat: 1.0 })
        );
        assert_eq!(surface.overlay("b").unwrap().marker, None);
        surface.remove_route_overlay("a");
        assert_eq!(surface.overlay_count(), 1);
    }
}
