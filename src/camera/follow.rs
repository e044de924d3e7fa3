//! Camera reconciliation between a captured per-segment view and a moving
//! icon.
//!
//! The segment camera is mandatory and applied once; following the icon is
//! optional and only ever pans. Zoom belongs to the initial camera state or
//! an explicit override, never to the per-tick follow updates.

use crate::foundation::core::{CameraState, GeoPoint};
use crate::storymap::model::FollowSpec;
use crate::surface::Viewport;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Tuning knobs for camera behavior; host config can override any of them.
pub struct FollowTuning {
    /// Duration of the one-shot segment camera transition.
    pub initial_transition_ms: f64,
    /// Guard window after the initial transition during which follow pans
    /// are suppressed, so follow cannot fight the segment camera.
    pub initial_guard_ms: f64,
    /// Duration of each follow pan; short and heavily damped.
    pub follow_ease_ms: f64,
    /// Minimum interval between follow pans (rate limit).
    pub min_update_interval_ms: f64,
    /// Zoom override below this delta is ignored.
    pub zoom_epsilon: f64,
}

impl Default for FollowTuning {
    fn default() -> Self {
        Self {
            initial_transition_ms: 800.0,
            initial_guard_ms: 800.0,
            follow_ease_ms: 120.0,
            min_update_interval_ms: 1000.0 / 60.0,
            zoom_epsilon: 0.1,
        }
    }
}

#[derive(Debug)]
pub struct CameraFollowController {
    tuning: FollowTuning,
    follow: Option<FollowSpec>,
    guard_until_ms: Option<f64>,
    last_pan_ms: Option<f64>,
    zoom_override_pending: bool,
}

impl CameraFollowController {
    pub fn new(tuning: FollowTuning) -> Self {
        Self {
            tuning,
            follow: None,
            guard_until_ms: None,
            last_pan_ms: None,
            zoom_override_pending: false,
        }
    }

    /// Start a new segment: apply its captured camera once.
    ///
    /// The very first application is a hard cut (there is no previous view
    /// worth easing from); crossing from another segment eases. Route
    /// animation does not wait for the transition; the guard window only
    /// suppresses follow pans while the host is still easing.
    pub fn begin_segment(
        &mut self,
        viewport: &mut dyn Viewport,
        camera: Option<&CameraState>,
        now_ms: f64,
        hard_cut: bool,
    ) {
        self.guard_until_ms = None;
        self.last_pan_ms = None;
        self.zoom_override_pending = true;
        if let Some(camera) = camera {
            if hard_cut {
                viewport.jump_to(camera);
            } else {
                viewport.ease_to(camera, self.tuning.initial_transition_ms);
                self.guard_until_ms = Some(now_ms + self.tuning.initial_guard_ms);
            }
        }
    }

    /// Select the follow override of the route currently driving the camera.
    pub fn set_follow(&mut self, follow: Option<FollowSpec>) {
        self.follow = follow;
    }

    pub fn follow_enabled(&self) -> bool {
        self.follow.is_some_and(|f| f.enabled)
    }

    /// Re-center on the icon position ("gimbal lock" pan).
    ///
    /// Suppressed during the initial-transition guard window and rate
    /// limited to one pan per `min_update_interval_ms`.
    pub fn on_progress(&mut self, viewport: &mut dyn Viewport, position: GeoPoint, now_ms: f64) {
        let Some(follow) = self.follow else {
            return;
        };
        if !follow.enabled {
            return;
        }
        if let Some(guard) = self.guard_until_ms {
            if now_ms < guard {
                return;
            }
            self.guard_until_ms = None;
        }

        if self.zoom_override_pending {
            self.zoom_override_pending = false;
            if let Some(zoom) = follow.zoom
                && (zoom - viewport.zoom()).abs() > self.tuning.zoom_epsilon
            {
                viewport.ease_zoom_to(zoom, self.tuning.initial_transition_ms);
            }
        }

        if let Some(last) = self.last_pan_ms
            && now_ms - last < self.tuning.min_update_interval_ms
        {
            return;
        }
        viewport.ease_center_to(position, self.tuning.follow_ease_ms);
        self.last_pan_ms = Some(now_ms);
    }
}
