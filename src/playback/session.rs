//! Session orchestration: one tick drives the whole pipeline.
//!
//! Inside each tick the order is fixed: reconciler first, then the
//! coordinator and animators, then overlays and camera. Geometry is
//! consistent before camera and draw consumers read it.

use crate::animation::animator::TickOutcome;
use crate::camera::follow::{CameraFollowController, FollowTuning};
use crate::foundation::core::RoutePath;
use crate::foundation::error::{StorypathError, StorypathResult};
use crate::playback::coordinator::SequentialPlaybackCoordinator;
use crate::runtime::scheduler::{TickHandle, TickScheduler};
use crate::storymap::model::{RouteSpec, Storymap};
use crate::surface::MapSurface;
use crate::sync::events::SyncEvent;
use crate::sync::reconciler::{SyncReconciler, SyncTuning, ViewMode};

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Combined engine tuning; every knob has a sensible default.
pub struct SessionTuning {
    pub sync: SyncTuning,
    pub follow: FollowTuning,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum OverlayState {
    /// Creation not attempted or deferred; one retry is allowed.
    Pending { retried: bool },
    Ready,
    /// Both attempts failed; the route stays invisible until the next
    /// segment change.
    Failed,
}

/// Exclusive ownership of one route's overlay objects on the host surface.
///
/// Exactly one handle exists per mounted route; release is guaranteed on
/// segment change, shutdown, or drop of the session.
#[derive(Debug)]
struct RouteOverlayHandle {
    route_id: String,
    state: OverlayState,
    was_active: bool,
}

/// Owns the full playback pipeline for one participant client.
pub struct PlaybackSession<S: MapSurface> {
    storymap: Storymap,
    surface: S,
    reconciler: SyncReconciler,
    coordinator: SequentialPlaybackCoordinator,
    camera: CameraFollowController,
    overlays: Vec<RouteOverlayHandle>,
    mounted_routes: Vec<RouteSpec>,
    mounted_segment: Option<usize>,
    mounted_at_ms: f64,
    tick_handle: Option<TickHandle>,
    needs_frame: bool,
}

impl<S: MapSurface> PlaybackSession<S> {
    pub fn new(storymap: Storymap, surface: S) -> StorypathResult<Self> {
        Self::with_tuning(storymap, surface, SessionTuning::default())
    }

    pub fn with_tuning(
        storymap: Storymap,
        surface: S,
        tuning: SessionTuning,
    ) -> StorypathResult<Self> {
        storymap.validate()?;
        Ok(Self {
            storymap,
            surface,
            reconciler: SyncReconciler::new(tuning.sync),
            coordinator: SequentialPlaybackCoordinator::new(),
            camera: CameraFollowController::new(tuning.follow),
            overlays: Vec::new(),
            mounted_routes: Vec::new(),
            mounted_segment: None,
            mounted_at_ms: 0.0,
            tick_handle: None,
            needs_frame: false,
        })
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn view(&self) -> ViewMode {
        self.reconciler.view()
    }

    pub fn mounted_segment(&self) -> Option<usize> {
        self.mounted_segment
    }

    pub fn begin_join(&mut self) {
        self.reconciler.begin_join();
        self.needs_frame = true;
    }

    /// Feed one inbound channel event; rendering catches up on the next
    /// tick.
    pub fn ingest(&mut self, event: SyncEvent, now_ms: f64) {
        self.reconciler.handle_event(event, now_ms);
        self.needs_frame = true;
    }

    /// Whether another frame callback is worth scheduling.
    pub fn wants_frame(&self) -> bool {
        self.needs_frame || self.reconciler.has_pending() || self.coordinator.any_active()
    }

    /// Drive the session from a host frame scheduler: consume a fired
    /// callback, run one tick, and re-request while work remains.
    pub fn pump(&mut self, scheduler: &mut dyn TickScheduler) {
        let fired = scheduler.poll_fired();
        if self.tick_handle.is_some_and(|handle| fired.contains(&handle)) {
            self.tick_handle = None;
            self.tick(scheduler.now_ms());
        }
        if self.tick_handle.is_none() && self.wants_frame() {
            self.tick_handle = Some(scheduler.request_tick());
        }
    }

    /// Leave the session: tear down overlays and cancel every scheduled
    /// callback so nothing fires into torn-down state.
    pub fn shutdown(&mut self, scheduler: &mut dyn TickScheduler) {
        if let Some(handle) = self.tick_handle.take() {
            scheduler.cancel_tick(handle);
        }
        self.reconciler.disconnect();
        self.unmount_segment();
        self.needs_frame = false;
    }

    /// Advance the whole pipeline by one frame.
    #[tracing::instrument(skip(self))]
    pub fn tick(&mut self, now_ms: f64) {
        self.needs_frame = false;
        self.reconciler.tick(now_ms);

        let view = self.reconciler.view();
        let ViewMode::Live(state) = view else {
            match view {
                ViewMode::Disconnected | ViewMode::Ended | ViewMode::WaitingForPresenter => {
                    // Nothing of the old segment may survive; a rejoin
                    // re-derives everything from a fresh live sync.
                    self.unmount_segment();
                }
                // Question overlay or session pause: freeze, keep overlays.
                ViewMode::Question { .. } | ViewMode::SessionPaused => {}
                ViewMode::Live(_) => unreachable!(),
            }
            return;
        };
        let Some(index) = state.active_segment else {
            return;
        };

        if self.mounted_segment != Some(index) {
            self.mount_segment(index, now_ms);
        }

        self.coordinator.set_playing(state.is_playing);
        let route_ticks = self.coordinator.tick(now_ms);

        let mut camera_driven = false;
        for route_tick in route_ticks {
            let Some(route) = self
                .mounted_routes
                .iter()
                .find(|route| route.id == route_tick.route_id)
            else {
                continue;
            };
            let Some(handle) = self
                .overlays
                .iter_mut()
                .find(|handle| handle.route_id == route_tick.route_id)
            else {
                continue;
            };
            // The retry after SurfaceNotReady is deferred to a later frame,
            // giving the host a chance to finish mounting.
            if matches!(handle.state, OverlayState::Pending { .. }) && now_ms > self.mounted_at_ms {
                Self::ensure_overlay(&mut self.surface, handle, route);
            }
            let ready = handle.state == OverlayState::Ready;

            match &route_tick.outcome {
                TickOutcome::Idle => {
                    if handle.was_active {
                        handle.was_active = false;
                        if ready {
                            Self::draw_rest_state(&mut self.surface, route);
                        }
                    }
                }
                TickOutcome::Running(progress) | TickOutcome::JustCompleted(progress) => {
                    handle.was_active = true;
                    if ready {
                        self.surface
                            .set_visited_path(&route.id, &progress.visited, &route.style);
                        let bearing = route
                            .icon
                            .rotate_with_bearing
                            .then_some(progress.bearing_deg)
                            .flatten();
                        self.surface
                            .set_marker(&route.id, progress.position, bearing, &route.icon);
                    }
                    if !camera_driven
                        && let Some(follow) = route.follow
                        && follow.enabled
                    {
                        self.camera.set_follow(Some(follow));
                        self.camera
                            .on_progress(self.surface.viewport(), progress.position, now_ms);
                        camera_driven = true;
                    }
                }
                // Final frame was drawn on the JustCompleted tick.
                TickOutcome::Completed => {}
            }
        }
    }

    fn mount_segment(&mut self, index: usize, now_ms: f64) {
        // The very first camera application has no previous view to ease
        // from; later segment changes ease.
        let hard_cut = self.mounted_segment.is_none();
        self.unmount_segment();
        let Some(segment) = self.storymap.segment(index) else {
            tracing::warn!(index, "segment sync referenced an unknown segment");
            return;
        };
        let segment = segment.clone();

        self.coordinator.set_segment(Some(index));
        self.coordinator.sync_routes(&segment.routes);
        self.camera.begin_segment(
            self.surface.viewport(),
            segment.camera.as_ref(),
            now_ms,
            hard_cut,
        );
        self.camera.set_follow(None);

        for route in &segment.routes {
            let mut handle = RouteOverlayHandle {
                route_id: route.id.clone(),
                state: OverlayState::Pending { retried: false },
                was_active: false,
            };
            Self::ensure_overlay(&mut self.surface, &mut handle, route);
            self.overlays.push(handle);
        }
        self.mounted_routes = segment.routes;
        self.mounted_segment = Some(index);
        self.mounted_at_ms = now_ms;
    }

    fn unmount_segment(&mut self) {
        for handle in self.overlays.drain(..) {
            if handle.state == OverlayState::Ready {
                self.surface.remove_route_overlay(&handle.route_id);
            }
        }
        self.mounted_routes.clear();
        self.mounted_segment = None;
        self.coordinator.set_segment(None);
    }

    fn ensure_overlay(surface: &mut S, handle: &mut RouteOverlayHandle, route: &RouteSpec) {
        let OverlayState::Pending { retried } = handle.state else {
            return;
        };
        match surface.create_route_overlay(&route.id) {
            Ok(()) => {
                handle.state = OverlayState::Ready;
                surface.set_full_path(&route.id, &route.path, &route.style);
                Self::draw_rest_state(surface, route);
            }
            Err(StorypathError::SurfaceNotReady) if !retried => {
                handle.state = OverlayState::Pending { retried: true };
            }
            Err(err) => {
                tracing::warn!(route_id = %route.id, error = %err, "route overlay unavailable");
                handle.state = OverlayState::Failed;
            }
        }
    }

    fn draw_rest_state(surface: &mut S, route: &RouteSpec) {
        surface.set_visited_path(&route.id, &RoutePath::empty(), &route.style);
        surface.set_marker(&route.id, route.from, None, &route.icon);
    }
}

impl<S: MapSurface> Drop for PlaybackSession<S> {
    fn drop(&mut self) {
        self.unmount_segment();
    }
}
