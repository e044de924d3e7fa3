//! Maps one segment-level play flag onto per-route animator state.
//!
//! Routes default to playing concurrently the moment the segment plays;
//! `StartPolicy::AfterDelay` holds a route back until the segment has been
//! playing long enough, and `StartPolicy::AfterPrevious` chains a route
//! behind its predecessor's completion.

use crate::animation::animator::{RouteAnimator, TickOutcome};
use crate::storymap::model::{RouteSpec, StartPolicy};

/// One route's tick result, labeled with its id.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteTick {
    pub route_id: String,
    pub outcome: TickOutcome,
}

struct RouteSlot {
    animator: RouteAnimator,
    completed: bool,
}

#[derive(Default)]
pub struct SequentialPlaybackCoordinator {
    segment_index: Option<usize>,
    segment_playing: bool,
    segment_started_at_ms: Option<f64>,
    slots: Vec<RouteSlot>,
}

impl SequentialPlaybackCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segment_index(&self) -> Option<usize> {
        self.segment_index
    }

    pub fn route_count(&self) -> usize {
        self.slots.len()
    }

    /// Whether any route still has work pending for future ticks.
    pub fn any_active(&self) -> bool {
        self.segment_playing && self.slots.iter().any(|slot| !slot.completed)
    }

    /// Progress snapshot for a route, if it is currently tracked.
    pub fn animator(&self, route_id: &str) -> Option<&RouteAnimator> {
        self.slots
            .iter()
            .map(|slot| &slot.animator)
            .find(|animator| animator.spec().id == route_id)
    }

    /// Switch to a different segment, resetting every route to Idle first
    /// so no stale animated state bleeds across the boundary.
    pub fn set_segment(&mut self, index: Option<usize>) {
        if self.segment_index == index {
            return;
        }
        self.segment_index = index;
        self.segment_started_at_ms = None;
        self.slots.clear();
    }

    /// Adopt the active segment's route list.
    ///
    /// Routes are matched by their stable id, not array position: an equal
    /// re-sync keeps existing animators (and their Running state) alive,
    /// while a changed spec resets just that route.
    pub fn sync_routes(&mut self, routes: &[RouteSpec]) {
        let mut old: Vec<RouteSlot> = std::mem::take(&mut self.slots);
        for spec in routes {
            let existing = old
                .iter()
                .position(|slot| slot.animator.spec().id == spec.id);
            let slot = match existing {
                Some(i) => {
                    let mut slot = old.swap_remove(i);
                    let was_completed = slot.completed;
                    slot.animator.set_route(spec.clone());
                    slot.completed = was_completed && slot.animator.is_completed();
                    slot
                }
                None => RouteSlot {
                    animator: RouteAnimator::new(spec.clone()),
                    completed: false,
                },
            };
            self.slots.push(slot);
        }
        // Anything left in `old` was removed from the segment; dropping the
        // slot drops its animator.
    }

    /// Apply the segment-level play flag.
    pub fn set_playing(&mut self, playing: bool) {
        if self.segment_playing == playing {
            return;
        }
        self.segment_playing = playing;
        if !playing {
            self.segment_started_at_ms = None;
            for slot in &mut self.slots {
                slot.animator.set_playing(false);
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.segment_playing
    }

    /// Advance every route by one frame, in authored order.
    ///
    /// Chained routes observe their predecessor's completion within the
    /// same tick, so a chain starts without a one-frame gap.
    pub fn tick(&mut self, now_ms: f64) -> Vec<RouteTick> {
        if self.segment_playing && self.segment_started_at_ms.is_none() {
            self.segment_started_at_ms = Some(now_ms);
        }

        let segment_elapsed = self
            .segment_started_at_ms
            .map(|started| now_ms - started)
            .unwrap_or(0.0);

        let mut ticks = Vec::with_capacity(self.slots.len());
        let mut previous_completed = true;
        for slot in &mut self.slots {
            let due = match slot.animator.spec().start {
                StartPolicy::Immediate => true,
                StartPolicy::AfterDelay { offset_ms } => segment_elapsed >= offset_ms,
                StartPolicy::AfterPrevious => previous_completed,
            };
            slot.animator.set_playing(self.segment_playing && due);

            let outcome = slot.animator.tick(now_ms);
            if matches!(outcome, TickOutcome::JustCompleted(_)) {
                slot.completed = true;
            }
            previous_completed = slot.completed;

            ticks.push(RouteTick {
                route_id: slot.animator.spec().id.clone(),
                outcome,
            });
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::{GeoPoint, RoutePath};
    use crate::storymap::model::{IconSpec, RouteStyle};

    fn p(lng: f64, lat: f64) -> GeoPoint {
        GeoPoint { lng, lat }
    }

    fn route(id: &str, duration_ms: f64, start: StartPolicy) -> RouteSpec {
        RouteSpec {
            id: id.to_owned(),
            path: RoutePath::new(vec![p(0.0, 0.0), p(0.0, 1.0)]),
            from: p(0.0, 0.0),
            to: p(0.0, 1.0),
            duration_ms,
            style: RouteStyle::default(),
            icon: IconSpec::default(),
            follow: None,
            start,
        }
    }

    fn outcome_of<'t>(ticks: &'t [RouteTick], id: &str) -> &'t TickOutcome {
        &ticks.iter().find(|t| t.route_id == id).unwrap().outcome
    }

    #[test]
    fn independent_routes_play_concurrently() {
        let mut coordinator = SequentialPlaybackCoordinator::new();
        coordinator.set_segment(Some(0));
        coordinator.sync_routes(&[
            route("a", 1000.0, StartPolicy::Immediate),
            route("b", 1000.0, StartPolicy::Immediate),
        ]);
        coordinator.set_playing(true);

        let ticks = coordinator.tick(0.0);
        assert!(matches!(outcome_of(&ticks, "a"), TickOutcome::Running(_)));
        assert!(matches!(outcome_of(&ticks, "b"), TickOutcome::Running(_)));
    }

    #[test]
    fn chained_route_waits_for_predecessor() {
        let mut coordinator = SequentialPlaybackCoordinator::new();
        coordinator.set_segment(Some(0));
        coordinator.sync_routes(&[
            route("a", 1000.0, StartPolicy::Immediate),
            route("b", 1000.0, StartPolicy::AfterPrevious),
        ]);
        coordinator.set_playing(true);

        let ticks = coordinator.tick(0.0);
        assert!(matches!(outcome_of(&ticks, "b"), TickOutcome::Idle));

        // Predecessor completes; the chained route starts within this tick.
        let ticks = coordinator.tick(1000.0);
        assert!(matches!(
            outcome_of(&ticks, "a"),
            TickOutcome::JustCompleted(_)
        ));
        assert!(matches!(outcome_of(&ticks, "b"), TickOutcome::Running(_)));

        let ticks = coordinator.tick(2000.0);
        assert!(matches!(
            outcome_of(&ticks, "b"),
            TickOutcome::JustCompleted(_)
        ));
    }

    #[test]
    fn delayed_route_starts_after_offset() {
        let mut coordinator = SequentialPlaybackCoordinator::new();
        coordinator.set_segment(Some(0));
        coordinator.sync_routes(&[route(
            "late",
            1000.0,
            StartPolicy::AfterDelay { offset_ms: 500.0 },
        )]);
        coordinator.set_playing(true);

        let ticks = coordinator.tick(0.0);
        assert!(matches!(outcome_of(&ticks, "late"), TickOutcome::Idle));
        let ticks = coordinator.tick(400.0);
        assert!(matches!(outcome_of(&ticks, "late"), TickOutcome::Idle));
        let ticks = coordinator.tick(500.0);
        assert!(matches!(outcome_of(&ticks, "late"), TickOutcome::Running(_)));
    }

    #[test]
    fn equal_resync_preserves_running_state() {
        let routes = vec![route("a", 1000.0, StartPolicy::Immediate)];
        let mut coordinator = SequentialPlaybackCoordinator::new();
        coordinator.set_segment(Some(0));
        coordinator.sync_routes(&routes);
        coordinator.set_playing(true);
        coordinator.tick(0.0);

        // A fresh-but-equal list (new reference, same contents) re-syncs.
        coordinator.sync_routes(&routes.clone());
        let ticks = coordinator.tick(500.0);
        let TickOutcome::Running(progress) = outcome_of(&ticks, "a") else {
            panic!("running state was discarded by an equal re-sync");
        };
        assert!((progress.progress - 0.5).abs() < 1e-9);
    }

    #[test]
    fn segment_change_resets_all_routes() {
        let mut coordinator = SequentialPlaybackCoordinator::new();
        coordinator.set_segment(Some(0));
        coordinator.sync_routes(&[route("a", 1000.0, StartPolicy::Immediate)]);
        coordinator.set_playing(true);
        coordinator.tick(0.0);

        // Index change while still "playing": nothing survives the boundary.
        coordinator.set_segment(Some(1));
        assert_eq!(coordinator.route_count(), 0);
        coordinator.sync_routes(&[route("z", 1000.0, StartPolicy::Immediate)]);
        let ticks = coordinator.tick(100.0);
        let TickOutcome::Running(progress) = outcome_of(&ticks, "z") else {
            panic!("expected the new segment's route to start fresh");
        };
        assert_eq!(progress.progress, 0.0);
    }

    #[test]
    fn pause_resets_running_routes_but_not_completed_ones() {
        let mut coordinator = SequentialPlaybackCoordinator::new();
        coordinator.set_segment(Some(0));
        coordinator.sync_routes(&[
            route("fast", 100.0, StartPolicy::Immediate),
            route("slow", 10_000.0, StartPolicy::Immediate),
        ]);
        coordinator.set_playing(true);
        coordinator.tick(0.0);
        coordinator.tick(200.0);

        coordinator.set_playing(false);
        let ticks = coordinator.tick(300.0);
        assert!(matches!(
            outcome_of(&ticks, "fast"),
            TickOutcome::Completed
        ));
        assert!(matches!(outcome_of(&ticks, "slow"), TickOutcome::Idle));
        assert!(!coordinator.any_active());
    }
}
