//! Driver state tracking

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::eye::{EyeCode, FrameVerdict};

/// Coarse driver status derived from debounced eye verdicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Initializing,
    Sleeping,
    Drowsy,
    Active,
}

impl Status {
    /// Sleeping or drowsy
    pub fn is_alert(self) -> bool {
        matches!(self, Status::Sleeping | Status::Drowsy)
    }

    /// Label shown on the driver display and written to the alert log
    pub fn label(self) -> &'static str {
        match self {
            Status::Initializing => "Initializing",
            Status::Sleeping => "SLEEPING !!!",
            Status::Drowsy => "Drowsy !",
            Status::Active => "Active :)",
        }
    }

    /// Inverse of [`Status::label`]
    pub fn from_label(label: &str) -> Option<Self> {
        [Status::Initializing, Status::Sleeping, Status::Drowsy, Status::Active]
            .into_iter()
            .find(|status| status.label() == label.trim())
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Consecutive-frame run lengths; at most one is nonzero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub sleep: u32,
    pub drowsy: u32,
    pub active: u32,
}

impl RunCounters {
    /// Extend the run matching `verdict` and clear the other two
    pub fn record(&mut self, verdict: FrameVerdict) {
        match verdict {
            EyeCode::Closed => {
                self.sleep = self.sleep.saturating_add(1);
                self.drowsy = 0;
                self.active = 0;
            }
            EyeCode::Half => {
                self.drowsy = self.drowsy.saturating_add(1);
                self.sleep = 0;
                self.active = 0;
            }
            EyeCode::Open => {
                self.active = self.active.saturating_add(1);
                self.sleep = 0;
                self.drowsy = 0;
            }
        }
    }

    /// Number of counters currently above zero
    pub fn nonzero(&self) -> usize {
        [self.sleep, self.drowsy, self.active]
            .iter()
            .filter(|&&run| run > 0)
            .count()
    }
}

/// Debounces frame verdicts into a [`Status`].
///
/// A new status only commits once its run exceeds `debounce_frames`;
/// shorter runs leave the previous status in place.
#[derive(Debug, Clone)]
pub struct HysteresisTracker {
    counters: RunCounters,
    status: Status,
    debounce_frames: u32,
}

impl HysteresisTracker {
    pub fn new(debounce_frames: u32) -> Self {
        Self {
            counters: RunCounters::default(),
            status: Status::Initializing,
            debounce_frames,
        }
    }

    /// Feed one frame verdict and return the (possibly unchanged) status
    pub fn observe(&mut self, verdict: FrameVerdict) -> Status {
        self.counters.record(verdict);

        let candidate = match verdict {
            EyeCode::Closed if self.counters.sleep > self.debounce_frames => Some(Status::Sleeping),
            EyeCode::Half if self.counters.drowsy > self.debounce_frames => Some(Status::Drowsy),
            EyeCode::Open if self.counters.active > self.debounce_frames => Some(Status::Active),
            _ => None,
        };

        if let Some(next) = candidate {
            if next != self.status {
                info!("Driver status {} -> {}", self.status, next);
                self.status = next;
            }
        }

        self.status
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }
}

impl Default for HysteresisTracker {
    fn default() -> Self {
        Self::new(6)
    }
}
