//! Per-route animation state machine.
//!
//! One [`RouteAnimator`] owns the playback state of a single route:
//! Idle → Running → Completed, with a reset back to Idle whenever the route
//! identity changes or play stops before completion. All time comes from the
//! host's frame clock; the animator never schedules anything itself.

use crate::foundation::core::{GeoPoint, RoutePath};
use crate::geo::path;
use crate::storymap::model::RouteSpec;

#[derive(Clone, Debug, PartialEq)]
/// Transient per-route derived state, recomputed every tick.
pub struct PlaybackProgress {
    /// Wall-clock milliseconds since the start timestamp.
    pub elapsed_ms: f64,
    /// Normalized progress in `[0, 1]`.
    pub progress: f64,
    /// Current icon position.
    pub position: GeoPoint,
    /// Bearing of the bracketing segment; `None` past the destination.
    pub bearing_deg: Option<f64>,
    /// The traveled prefix of the route polyline.
    pub visited: RoutePath,
}

impl PlaybackProgress {
    fn at_rest(spec: &RouteSpec) -> Self {
        Self {
            elapsed_ms: 0.0,
            progress: 0.0,
            position: spec.from,
            bearing_deg: None,
            visited: RoutePath::empty(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum AnimatorState {
    Idle { play_requested: bool },
    Running { started_at_ms: f64 },
    Completed,
}

#[derive(Clone, Debug, PartialEq)]
/// What one tick produced.
///
/// `JustCompleted` is reported exactly once per run; subsequent ticks keep
/// answering `Completed` without re-firing, which guards against a host
/// re-asserting `playing = true` after the route finished.
pub enum TickOutcome {
    /// No active animation this tick.
    Idle,
    /// Animation advanced.
    Running(PlaybackProgress),
    /// The route reached its destination on this tick.
    JustCompleted(PlaybackProgress),
    /// Completed on an earlier tick.
    Completed,
}

#[derive(Clone, Debug)]
pub struct RouteAnimator {
    spec: RouteSpec,
    length_km: f64,
    state: AnimatorState,
    current: PlaybackProgress,
}

impl RouteAnimator {
    pub fn new(spec: RouteSpec) -> Self {
        let length_km = path::path_length_km(&spec.path);
        let current = PlaybackProgress::at_rest(&spec);
        Self {
            spec,
            length_km,
            state: AnimatorState::Idle {
                play_requested: false,
            },
            current,
        }
    }

    pub fn spec(&self) -> &RouteSpec {
        &self.spec
    }

    /// Latest computed progress; the rest state while Idle.
    pub fn current(&self) -> &PlaybackProgress {
        &self.current
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.state,
            AnimatorState::Running { .. } | AnimatorState::Idle { play_requested: true }
        )
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, AnimatorState::Completed)
    }

    /// Replace the owning route. A genuine identity change resets to Idle;
    /// an equal spec is a no-op so Running state survives re-syncs.
    pub fn set_route(&mut self, spec: RouteSpec) {
        if spec == self.spec {
            return;
        }
        self.length_km = path::path_length_km(&spec.path);
        self.spec = spec;
        self.reset();
    }

    /// Apply the externally-derived play flag.
    ///
    /// Stopping mid-flight is a hard reset: the position snaps back to
    /// `from` and the visited trail is cleared. Stopping after completion
    /// leaves the animator Completed.
    pub fn set_playing(&mut self, playing: bool) {
        match (self.state, playing) {
            (AnimatorState::Idle { .. }, _) => {
                self.state = AnimatorState::Idle {
                    play_requested: playing,
                };
            }
            (AnimatorState::Running { .. }, false) => self.reset(),
            (AnimatorState::Running { .. }, true) | (AnimatorState::Completed, _) => {}
        }
    }

    /// Snap back to the rest state.
    pub fn reset(&mut self) {
        self.state = AnimatorState::Idle {
            play_requested: false,
        };
        self.current = PlaybackProgress::at_rest(&self.spec);
    }

    /// Advance by one frame of the host render loop.
    ///
    /// The start timestamp is captured here rather than in
    /// [`RouteAnimator::set_playing`], so elapsed time is aligned with the
    /// host's frame clock.
    pub fn tick(&mut self, now_ms: f64) -> TickOutcome {
        match self.state {
            AnimatorState::Idle {
                play_requested: false,
            } => TickOutcome::Idle,
            AnimatorState::Idle {
                play_requested: true,
            } => {
                if self.length_km <= 0.0 {
                    // Zero-length no-op animation: complete on the first tick.
                    self.current = self.sample(0.0, 1.0);
                    self.state = AnimatorState::Completed;
                    return TickOutcome::JustCompleted(self.current.clone());
                }
                self.state = AnimatorState::Running {
                    started_at_ms: now_ms,
                };
                self.current = self.sample(0.0, 0.0);
                TickOutcome::Running(self.current.clone())
            }
            AnimatorState::Running { started_at_ms } => {
                let elapsed_ms = (now_ms - started_at_ms).max(0.0);
                let progress = (elapsed_ms / self.spec.duration_ms).clamp(0.0, 1.0);
                self.current = self.sample(elapsed_ms, progress);
                if progress >= 1.0 {
                    self.state = AnimatorState::Completed;
                    TickOutcome::JustCompleted(self.current.clone())
                } else {
                    TickOutcome::Running(self.current.clone())
                }
            }
            AnimatorState::Completed => TickOutcome::Completed,
        }
    }

    fn sample(&self, elapsed_ms: f64, progress: f64) -> PlaybackProgress {
        let distance = progress * self.length_km;
        let position = match path::position_at_distance(&self.spec.path, distance) {
            Ok(position) => position,
            // No usable geometry at all: hold the declared endpoints.
            Err(_) => {
                if progress >= 1.0 {
                    self.spec.to
                } else {
                    self.spec.from
                }
            }
        };
        PlaybackProgress {
            elapsed_ms,
            progress,
            position,
            bearing_deg: path::bearing_at_distance(&self.spec.path, distance),
            visited: path::visited_sub_path(&self.spec.path, progress),
        }
    }
}
