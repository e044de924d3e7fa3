//! Storypath is a playback and live-synchronization engine for animated
//! map storymaps.
//!
//! A storymap is an ordered list of segments, each with a captured camera
//! view and a set of animated routes. Storypath turns a segment plus a
//! stream of presenter sync events into per-frame drawing and viewport
//! commands against a host-provided map surface.
//!
//! # Pipeline overview
//!
//! 1. **Reconcile**: inbound [`SyncEvent`]s -> authoritative
//!    [`SegmentPlaybackState`] (duplicates, flicker, and out-of-order
//!    delivery absorbed by [`SyncReconciler`])
//! 2. **Coordinate**: segment play flag -> per-route play flags
//!    ([`SequentialPlaybackCoordinator`]: concurrent by default, chained or
//!    delayed on request)
//! 3. **Animate**: per-route [`RouteAnimator`] advances along the polyline
//!    every frame ([`PlaybackProgress`]: position, bearing, visited trail)
//! 4. **Present**: overlays are redrawn and [`CameraFollowController`]
//!    moves the viewport, through the [`MapSurface`] contract
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Host-agnostic**: no render loop and no pixels; the engine only needs
//!   the [`MapSurface`] and [`TickScheduler`] capabilities.
//! - **Single-threaded**: all animation state advances inside the host's
//!   frame callback; there are no background timers.
//! - **Wall-clock driven**: a stalled frame loop delays nothing but the
//!   redraw; elapsed time catches up on the next frame.
#![forbid(unsafe_code)]

mod animation;
mod camera;
mod foundation;
mod geo;
mod playback;
mod runtime;
mod storymap;
mod surface;
mod sync;

pub use animation::animator::{PlaybackProgress, RouteAnimator, TickOutcome};
pub use camera::follow::{CameraFollowController, FollowTuning};
pub use foundation::core::{CameraState, GeoPoint, RoutePath};
pub use foundation::error::{StorypathError, StorypathResult};
pub use geo::path::{
    bearing_at_distance, distance_km, path_length_km, position_at_distance, visited_sub_path,
};
pub use playback::coordinator::{RouteTick, SequentialPlaybackCoordinator};
pub use playback::session::{PlaybackSession, SessionTuning};
pub use runtime::scheduler::{ManualScheduler, TickHandle, TickScheduler};
pub use storymap::model::{
    FollowSpec, IconSpec, RouteSpec, RouteStyle, Segment, StartPolicy, Storymap,
};
pub use storymap::wire::{route_path_from_line_string, route_path_to_line_string};
pub use surface::{HeadlessSurface, MapSurface, OverlaySnapshot, Viewport};
pub use sync::events::{SessionStatus, SyncEvent};
pub use sync::reconciler::{
    ConnectionState, QuestionPhase, SegmentPlaybackState, SyncReconciler, SyncTuning, ViewMode,
};
