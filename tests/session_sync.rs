use storypath::{
    CameraState, FollowSpec, GeoPoint, HeadlessSurface, IconSpec, PlaybackSession, RoutePath,
    RouteSpec, RouteStyle, SessionStatus, StartPolicy, Segment, SegmentPlaybackState, Storymap,
    SyncEvent, ViewMode, Viewport,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn p(lng: f64, lat: f64) -> GeoPoint {
    GeoPoint { lng, lat }
}

fn route(id: &str, duration_ms: f64) -> RouteSpec {
    RouteSpec {
        id: id.to_owned(),
        path: RoutePath::new(vec![p(0.0, 0.0), p(0.0, 1.0), p(0.0, 2.0)]),
        from: p(0.0, 0.0),
        to: p(0.0, 2.0),
        duration_ms,
        style: RouteStyle::default(),
        icon: IconSpec::default(),
        follow: Some(FollowSpec {
            enabled: true,
            zoom: None,
        }),
        start: StartPolicy::Immediate,
    }
}

fn demo_storymap() -> Storymap {
    Storymap {
        title: "demo".to_owned(),
        segments: vec![
            Segment {
                id: "s0".to_owned(),
                name: "first".to_owned(),
                camera: Some(CameraState {
                    center: [0.0, 1.0],
                    zoom: 6.0,
                    bearing: None,
                    pitch: None,
                }),
                routes: vec![route("a", 10_000.0)],
            },
            Segment {
                id: "s1".to_owned(),
                name: "second".to_owned(),
                camera: None,
                routes: vec![route("b", 5000.0)],
            },
        ],
    }
}

fn joined() -> SyncEvent {
    SyncEvent::Joined {
        status: SessionStatus::Running,
        cached_state: None,
    }
}

fn sync(segment_index: i64, is_playing: bool) -> SyncEvent {
    SyncEvent::SegmentSync {
        segment_index,
        is_playing,
        server_timestamp: 0.0,
    }
}

fn live(active_segment: usize, is_playing: bool) -> ViewMode {
    ViewMode::Live(SegmentPlaybackState {
        active_segment: Some(active_segment),
        is_playing,
    })
}

#[test]
fn renders_nothing_until_the_first_live_sync() {
    init_tracing();
    let mut session = PlaybackSession::new(demo_storymap(), HeadlessSurface::new()).unwrap();
    session.begin_join();
    session.ingest(joined(), 0.0);
    session.tick(0.0);

    assert_eq!(session.view(), ViewMode::WaitingForPresenter);
    assert_eq!(session.surface().overlay_count(), 0);
    assert_eq!(session.mounted_segment(), None);
}

#[test]
fn live_sync_mounts_the_segment_and_starts_after_the_delay() {
    init_tracing();
    let mut session = PlaybackSession::new(demo_storymap(), HeadlessSurface::new()).unwrap();
    session.begin_join();
    session.ingest(joined(), 0.0);
    session.ingest(sync(0, true), 0.0);

    session.tick(0.0);
    assert_eq!(session.view(), live(0, false), "mount precedes playback");
    assert_eq!(session.mounted_segment(), Some(0));
    let overlay = session.surface().overlay("a").expect("overlay mounted");
    assert_eq!(overlay.marker, Some(p(0.0, 0.0)));
    assert_eq!(overlay.full_path.len(), 3);
    assert!(overlay.visited_path.is_empty());

    // The segment camera was applied as one eased transition.
    assert_eq!(session.surface().zoom(), 6.0);

    session.tick(400.0);
    assert_eq!(session.view(), live(0, false), "start delay still running");

    session.tick(500.0);
    assert_eq!(session.view(), live(0, true));

    session.tick(3000.0);
    let overlay = session.surface().overlay("a").unwrap();
    let marker = overlay.marker.unwrap();
    assert!(marker.lat > 0.0, "marker should have advanced north");
    assert!(!overlay.visited_path.is_empty());
}

#[test]
fn spurious_stop_does_not_interrupt_playback() {
    let mut session = PlaybackSession::new(demo_storymap(), HeadlessSurface::new()).unwrap();
    session.begin_join();
    session.ingest(joined(), 0.0);
    session.ingest(sync(0, true), 0.0);
    session.tick(0.0);
    session.tick(500.0);
    assert_eq!(session.view(), live(0, true));

    session.ingest(sync(0, false), 600.0);
    session.tick(600.0);
    assert_eq!(session.view(), live(0, true), "flicker must be absorbed");

    // A stop after the guard window is genuine and resets the route.
    session.ingest(sync(0, false), 2000.0);
    session.tick(2000.0);
    assert_eq!(session.view(), live(0, false));
    let overlay = session.surface().overlay("a").unwrap();
    assert_eq!(overlay.marker, Some(p(0.0, 0.0)));
    assert!(overlay.visited_path.is_empty());
}

#[test]
fn segment_change_swaps_overlays_and_restarts_clean() {
    let mut session = PlaybackSession::new(demo_storymap(), HeadlessSurface::new()).unwrap();
    session.begin_join();
    session.ingest(joined(), 0.0);
    session.ingest(sync(0, true), 0.0);
    session.tick(0.0);
    session.tick(500.0);
    session.tick(3000.0);
    assert!(session.surface().overlay("a").is_some());

    session.ingest(sync(1, true), 4000.0);
    session.tick(4000.0);
    assert_eq!(session.view(), live(1, false), "stop precedes the new start");
    assert_eq!(session.mounted_segment(), Some(1));
    assert!(session.surface().overlay("a").is_none(), "old overlay removed");
    let overlay = session.surface().overlay("b").expect("new overlay mounted");
    assert!(overlay.visited_path.is_empty());

    session.tick(4500.0);
    assert_eq!(session.view(), live(1, true));
}

#[test]
fn question_broadcast_freezes_rendering_until_the_next_segment() {
    let mut session = PlaybackSession::new(demo_storymap(), HeadlessSurface::new()).unwrap();
    session.begin_join();
    session.ingest(joined(), 0.0);
    session.ingest(sync(0, true), 0.0);
    session.tick(0.0);
    session.tick(500.0);
    session.tick(1000.0);
    let frozen_marker = session.surface().overlay("a").unwrap().marker;

    session.ingest(
        SyncEvent::QuestionBroadcast {
            question_id: "q1".to_owned(),
        },
        1100.0,
    );
    session.tick(1100.0);
    assert!(matches!(session.view(), ViewMode::Question { .. }));
    session.tick(2000.0);
    assert_eq!(
        session.surface().overlay("a").unwrap().marker,
        frozen_marker,
        "no redraw while a question is active"
    );

    // The presenter moves on; rendering resumes on the next segment.
    session.ingest(sync(1, true), 3000.0);
    session.tick(3000.0);
    assert_eq!(session.view(), live(1, false));
}

#[test]
fn ending_the_session_tears_everything_down() {
    let mut session = PlaybackSession::new(demo_storymap(), HeadlessSurface::new()).unwrap();
    session.begin_join();
    session.ingest(joined(), 0.0);
    session.ingest(sync(0, true), 0.0);
    session.tick(0.0);
    assert!(session.surface().overlay_count() > 0);

    session.ingest(
        SyncEvent::SessionStatus {
            status: SessionStatus::Ended,
        },
        1000.0,
    );
    session.tick(1000.0);
    assert_eq!(session.view(), ViewMode::Ended);
    assert_eq!(session.surface().overlay_count(), 0);
}

#[test]
fn overlay_creation_retries_once_when_the_surface_mounts_late() {
    let mut session = PlaybackSession::new(demo_storymap(), HeadlessSurface::unmounted()).unwrap();
    session.begin_join();
    session.ingest(joined(), 0.0);
    session.ingest(sync(0, true), 0.0);
    session.tick(0.0);
    assert_eq!(session.surface().overlay_count(), 0, "surface not ready yet");

    // Host finishes mounting between frames; the deferred retry succeeds.
    session.surface_mut().set_ready(true);
    session.tick(16.0);
    assert!(session.surface().overlay("a").is_some());
}

#[test]
fn rejoin_waits_for_a_fresh_live_sync() {
    let mut session = PlaybackSession::new(demo_storymap(), HeadlessSurface::new()).unwrap();
    session.begin_join();
    session.ingest(joined(), 0.0);
    session.ingest(sync(0, true), 0.0);
    session.tick(0.0);
    session.tick(500.0);

    // Transport drop; rejoin hands back a cached (stale) state.
    session.ingest(
        SyncEvent::Joined {
            status: SessionStatus::Running,
            cached_state: Some(serde_json::json!({"segmentIndex": 0, "isPlaying": true})),
        },
        5000.0,
    );
    session.tick(5000.0);
    assert_eq!(session.view(), ViewMode::WaitingForPresenter);
    assert_eq!(session.surface().overlay_count(), 0);

    session.ingest(sync(1, true), 6000.0);
    session.tick(6000.0);
    assert_eq!(session.mounted_segment(), Some(1));
}
