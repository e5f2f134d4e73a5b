//! DMS configuration

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// DMS configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// A run must exceed this many consecutive frames before a new status commits
    pub debounce_frames: u32,

    /// Alert frame on which the buzzer sounds and the safe-spot search starts
    pub alert_frame: u32,

    /// Alert frame from which the motor is stopped
    pub motor_stop_frame: u32,

    /// Eye aspect ratio above which an eye counts as open
    pub open_ratio: f32,

    /// Eye aspect ratio above which (up to `open_ratio`) an eye counts as half-open
    pub half_ratio: f32,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            debounce_frames: 6,
            alert_frame: 40,
            motor_stop_frame: 80,
            open_ratio: 0.25,
            half_ratio: 0.21,
        }
    }
}

impl DmsConfig {
    /// Create strict config (reacts sooner)
    pub fn strict() -> Self {
        Self {
            debounce_frames: 4,
            alert_frame: 30,
            motor_stop_frame: 60,
            ..Default::default()
        }
    }

    /// Create lenient config (reacts later)
    pub fn lenient() -> Self {
        Self {
            debounce_frames: 8,
            alert_frame: 60,
            motor_stop_frame: 120,
            ..Default::default()
        }
    }

    /// Reject configurations the action timeline cannot honour
    pub fn validate(&self) -> Result<(), DmsError> {
        if self.alert_frame == 0 {
            return Err(DmsError::Config("alert_frame must be at least 1".into()));
        }
        if self.motor_stop_frame < self.alert_frame {
            return Err(DmsError::Config(format!(
                "motor_stop_frame ({}) must not precede alert_frame ({})",
                self.motor_stop_frame, self.alert_frame
            )));
        }
        if !(self.half_ratio < self.open_ratio) {
            return Err(DmsError::Config(format!(
                "half_ratio ({}) must be below open_ratio ({})",
                self.half_ratio, self.open_ratio
            )));
        }
        Ok(())
    }
}
