//! Per-frame monitoring results

use serde::{Deserialize, Serialize};

use crate::eye::FrameVerdict;
use crate::scheduler::{Action, EventTimeline};
use crate::state::Status;

/// Outcome of processing one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameDecision {
    /// 1-based index of the frame within the session
    pub frame: u64,

    /// Whether a face was detected (frames without one are skipped)
    pub face_detected: bool,

    /// Verdict for the frame, if a face was detected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<FrameVerdict>,

    /// Status after this frame
    pub status: Status,

    /// Status committed on this frame
    pub status_changed: bool,

    /// Alert episode this frame belongs to (0 before the first episode)
    pub episode: u64,

    /// Timeline after this frame
    pub timeline: EventTimeline,

    /// Actions to carry out
    pub actions: Vec<Action>,
}

impl FrameDecision {
    /// Whether the safe-spot search should start on this frame
    pub fn wants_locate(&self) -> bool {
        self.actions.contains(&Action::LocateSafeSpots)
    }
}
