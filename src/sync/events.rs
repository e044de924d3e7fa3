//! Inbound session events.
//!
//! Events arrive over an at-least-once channel with no ordering guarantee;
//! everything here is plain data, and all duplicate/flicker absorption
//! lives in [`crate::sync::reconciler`].

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
/// Tagged union of everything the presenter-side channel can deliver.
pub enum SyncEvent {
    /// Which segment is active and whether it is playing.
    #[serde(rename_all = "camelCase")]
    SegmentSync {
        segment_index: i64,
        is_playing: bool,
        /// Server-side send time, milliseconds since epoch.
        server_timestamp: f64,
    },
    /// The presenter pushed a question to all participants.
    #[serde(rename_all = "camelCase")]
    QuestionBroadcast { question_id: String },
    /// Aggregated results for a previously broadcast question.
    #[serde(rename_all = "camelCase")]
    QuestionResults { question_id: String },
    /// Coarse session lifecycle change.
    #[serde(rename_all = "camelCase")]
    SessionStatus { status: SessionStatus },
    /// Acknowledgment that this client joined the session.
    ///
    /// `cached_state` is whatever stale snapshot the transport retained;
    /// the reconciler deliberately ignores it (a rejoin waits for a live
    /// sync instead of rendering a stale frame).
    #[serde(rename_all = "camelCase")]
    Joined {
        status: SessionStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cached_state: Option<serde_json::Value>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    NotStarted,
    Running,
    Paused,
    Ended,
}
