//! Alert action timeline
//!
//! Maps the number of frames spent sleeping or drowsy onto a fixed sequence
//! of actions, and maps recovery back onto the matching reset actions.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::state::Status;
use crate::DmsConfig;

/// Side effects requested by the scheduler for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    MotorStart,
    MotorStop,
    BuzzerOn,
    BuzzerOff,
    /// Start a search for nearby safe stopping places
    LocateSafeSpots,
}

/// Per-session episode progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTimeline {
    /// Frames spent sleeping or drowsy in the current episode
    pub alert_frame_count: u32,
    /// Motor stop issued and not yet reversed
    pub motor_stopped: bool,
}

/// Stateless rules; the timeline is threaded through by the caller
#[derive(Debug, Clone, Copy)]
pub struct ActionScheduler {
    alert_frame: u32,
    motor_stop_frame: u32,
}

impl ActionScheduler {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            alert_frame: config.alert_frame,
            motor_stop_frame: config.motor_stop_frame,
        }
    }

    /// Advance the timeline by one processed frame
    pub fn on_frame(&self, status: Status, timeline: EventTimeline) -> (EventTimeline, Vec<Action>) {
        let mut next = timeline;
        let mut actions = Vec::new();

        if status.is_alert() {
            next.alert_frame_count = next.alert_frame_count.saturating_add(1);

            // Exact match: the search fires once per episode
            if next.alert_frame_count == self.alert_frame {
                warn!("Driver {} for {} frames: buzzer on, locating safe spots", status, next.alert_frame_count);
                actions.push(Action::BuzzerOn);
                actions.push(Action::LocateSafeSpots);
            }

            if next.alert_frame_count >= self.motor_stop_frame && !next.motor_stopped {
                warn!("Driver {} for {} frames: stopping motor", status, next.alert_frame_count);
                actions.push(Action::MotorStop);
                next.motor_stopped = true;
            }
        } else {
            if next.motor_stopped {
                debug!("Driver recovered: restarting motor");
                actions.push(Action::MotorStart);
                next.motor_stopped = false;
            }
            if next.alert_frame_count > 0 {
                debug!("Alert episode ended after {} frames", next.alert_frame_count);
                actions.push(Action::BuzzerOff);
            }
            next.alert_frame_count = 0;
        }

        (next, actions)
    }
}

impl Default for ActionScheduler {
    fn default() -> Self {
        Self::new(&DmsConfig::default())
    }
}
