//! Client-side reconciliation of presenter sync events.
//!
//! The transport is at-least-once and unordered: events arrive duplicated,
//! late, or in the wrong order, and one known upstream quirk follows a
//! "start" signal with an immediate spurious "stop". This state machine
//! absorbs all of that and derives the single authoritative
//! [`SegmentPlaybackState`] the rest of the engine renders from.

use crate::sync::events::{SessionStatus, SyncEvent};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Tuning knobs for event absorption; host config can override them.
pub struct SyncTuning {
    /// Window after an accepted "start" during which a "stop" for the same
    /// segment is treated as spurious.
    pub flicker_guard_ms: f64,
    /// Delay between switching segments and starting playback, giving the
    /// new segment's resources time to mount before animating.
    pub start_delay_ms: f64,
}

impl Default for SyncTuning {
    fn default() -> Self {
        Self {
            flicker_guard_ms: 1000.0,
            start_delay_ms: 500.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Joining,
    Synced,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
/// The single source of truth a client renders from.
pub struct SegmentPlaybackState {
    /// Active segment, or `None` until a live sync arrives ("do not render
    /// yet"; the wire encodes this as index -1).
    pub active_segment: Option<usize>,
    pub is_playing: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionPhase {
    Asked,
    Results,
}

#[derive(Clone, Debug, PartialEq)]
/// What the presentation surface should currently show.
pub enum ViewMode {
    Disconnected,
    /// Connected but no live presenter position yet; the surface shows an
    /// explicit waiting state instead of a stale or empty map.
    WaitingForPresenter,
    Live(SegmentPlaybackState),
    /// A question is active; segment-driven rendering is suspended.
    Question {
        question_id: String,
        phase: QuestionPhase,
    },
    SessionPaused,
    Ended,
}

#[derive(Clone, Copy, Debug)]
struct PendingStart {
    segment_index: usize,
    due_at_ms: f64,
}

#[derive(Debug)]
pub struct SyncReconciler {
    tuning: SyncTuning,
    connection: ConnectionState,
    session_status: SessionStatus,
    playback: SegmentPlaybackState,
    has_live_sync: bool,
    /// The immediately preceding processed segment-sync event.
    last_event: Option<(i64, bool)>,
    /// Index and local receive time of the last accepted "start" event.
    last_play_event: Option<(i64, f64)>,
    pending_start: Option<PendingStart>,
    question: Option<(String, QuestionPhase)>,
    revision: u64,
}

impl Default for SyncReconciler {
    fn default() -> Self {
        Self::new(SyncTuning::default())
    }
}

impl SyncReconciler {
    pub fn new(tuning: SyncTuning) -> Self {
        Self {
            tuning,
            connection: ConnectionState::Disconnected,
            session_status: SessionStatus::NotStarted,
            playback: SegmentPlaybackState::default(),
            has_live_sync: false,
            last_event: None,
            last_play_event: None,
            pending_start: None,
            question: None,
            revision: 0,
        }
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn session_status(&self) -> SessionStatus {
        self.session_status
    }

    pub fn playback(&self) -> SegmentPlaybackState {
        self.playback
    }

    /// Monotonic counter, bumped once per applied state change. Absorbed
    /// events leave it untouched.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether a delayed start is still scheduled.
    pub fn has_pending(&self) -> bool {
        self.pending_start.is_some()
    }

    /// The join request went out; the answering `Joined` event completes it.
    pub fn begin_join(&mut self) {
        self.connection = ConnectionState::Joining;
        self.revision += 1;
    }

    /// Leaving the session cancels every scheduled transition; a canceled
    /// delayed start must never fire into torn-down state.
    pub fn disconnect(&mut self) {
        self.connection = ConnectionState::Disconnected;
        self.pending_start = None;
        self.revision += 1;
    }

    pub fn handle_event(&mut self, event: SyncEvent, now_ms: f64) {
        match event {
            SyncEvent::Joined {
                status,
                cached_state,
            } => {
                if cached_state.is_some() {
                    tracing::debug!("ignoring cached transport state on join");
                }
                self.connection = ConnectionState::Synced;
                self.session_status = status;
                // A rejoin starts from "no segment selected"; rendering
                // waits for the presenter's live position.
                self.playback = SegmentPlaybackState::default();
                self.has_live_sync = false;
                self.last_event = None;
                self.last_play_event = None;
                self.pending_start = None;
                self.question = None;
                self.revision += 1;
            }
            SyncEvent::SegmentSync {
                segment_index,
                is_playing,
                ..
            } => self.handle_segment_sync(segment_index, is_playing, now_ms),
            SyncEvent::SessionStatus { status } => {
                if self.session_status == status {
                    return;
                }
                self.session_status = status;
                if status == SessionStatus::Ended {
                    self.pending_start = None;
                    self.playback.is_playing = false;
                }
                self.revision += 1;
            }
            SyncEvent::QuestionBroadcast { question_id } => {
                let incoming = (question_id, QuestionPhase::Asked);
                if self.question.as_ref() == Some(&incoming) {
                    return;
                }
                self.question = Some(incoming);
                self.revision += 1;
            }
            SyncEvent::QuestionResults { question_id } => {
                let incoming = (question_id, QuestionPhase::Results);
                if self.question.as_ref() == Some(&incoming) {
                    return;
                }
                self.question = Some(incoming);
                self.revision += 1;
            }
        }
    }

    fn handle_segment_sync(&mut self, segment_index: i64, is_playing: bool, now_ms: f64) {
        if self.connection != ConnectionState::Synced {
            tracing::debug!(segment_index, "dropping segment sync before join completed");
            return;
        }
        if segment_index < 0 {
            tracing::debug!(segment_index, "dropping segment sync with negative index");
            return;
        }
        if self.last_event == Some((segment_index, is_playing)) {
            tracing::debug!(segment_index, is_playing, "dropping duplicate segment sync");
            return;
        }

        let index = segment_index as usize;
        if self.playback.active_segment == Some(index) {
            if !is_playing
                && let Some((guard_index, accepted_at)) = self.last_play_event
                && guard_index == segment_index
                && now_ms - accepted_at < self.tuning.flicker_guard_ms
            {
                tracing::debug!(segment_index, "absorbing spurious stop inside guard window");
                return;
            }

            self.last_event = Some((segment_index, is_playing));
            self.has_live_sync = true;
            if is_playing {
                self.last_play_event = Some((segment_index, now_ms));
                if !self.playback.is_playing && self.pending_start.is_none() {
                    self.playback.is_playing = true;
                    self.revision += 1;
                }
            } else {
                // A genuine stop also cancels a not-yet-fired delayed start.
                self.pending_start = None;
                if self.playback.is_playing {
                    self.playback.is_playing = false;
                    self.revision += 1;
                }
            }
        } else {
            // Genuine index change: stop first, so the outgoing segment is
            // reset before the incoming one animates.
            self.question = None;
            self.playback.active_segment = Some(index);
            self.playback.is_playing = false;
            self.has_live_sync = true;
            self.last_event = Some((segment_index, is_playing));
            self.pending_start = if is_playing {
                // Counted as an accepted start for the flicker guard even
                // though application is deferred.
                self.last_play_event = Some((segment_index, now_ms));
                Some(PendingStart {
                    segment_index: index,
                    due_at_ms: now_ms + self.tuning.start_delay_ms,
                })
            } else {
                self.last_play_event = None;
                None
            };
            self.revision += 1;
        }
    }

    /// Fire the delayed start once its time arrives. Returns whether state
    /// changed.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let Some(pending) = self.pending_start else {
            return false;
        };
        if now_ms < pending.due_at_ms {
            return false;
        }
        self.pending_start = None;
        if self.playback.active_segment == Some(pending.segment_index) {
            self.playback.is_playing = true;
            self.revision += 1;
            return true;
        }
        false
    }

    pub fn view(&self) -> ViewMode {
        match self.connection {
            ConnectionState::Disconnected => ViewMode::Disconnected,
            ConnectionState::Joining => ViewMode::WaitingForPresenter,
            ConnectionState::Synced => match self.session_status {
                SessionStatus::Ended => ViewMode::Ended,
                SessionStatus::Paused => ViewMode::SessionPaused,
                SessionStatus::NotStarted | SessionStatus::Running => {
                    if let Some((question_id, phase)) = &self.question {
                        ViewMode::Question {
                            question_id: question_id.clone(),
                            phase: *phase,
                        }
                    } else if !self.has_live_sync || self.playback.active_segment.is_none() {
                        ViewMode::WaitingForPresenter
                    } else {
                        ViewMode::Live(self.playback)
                    }
                }
            },
        }
    }
}
