//! Driver Monitoring System (DMS)
//!
//! Deterministic drowsiness decisions from per-frame eye classifications:
//! - Eye aspect ratio and tri-state eye openness
//! - Debounced driver status (sleeping, drowsy, active)
//! - Alert action timeline (buzzer, safe-spot search, motor stop)

pub mod analysis;
pub mod config;
pub mod eye;
pub mod scheduler;
pub mod state;

pub use analysis::FrameDecision;
pub use config::DmsConfig;
pub use eye::{BlinkClassifier, EyeCode, EyeLandmarks, FrameVerdict, RatioClassifier};
pub use scheduler::{Action, ActionScheduler, EventTimeline};
pub use state::{HysteresisTracker, RunCounters, Status};

use thiserror::Error;
use tracing::{debug, info};

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Drowsiness monitoring session.
///
/// Owns all per-session state; frames must be fed strictly in order.
pub struct DrowsinessMonitor {
    tracker: HysteresisTracker,
    scheduler: ActionScheduler,
    classifier: RatioClassifier,
    timeline: EventTimeline,
    frames: u64,
    episode: u64,
}

impl DrowsinessMonitor {
    /// Create a new monitoring session with configuration
    pub fn new(config: DmsConfig) -> Result<Self, DmsError> {
        config.validate()?;
        info!(
            "DMS session: debounce {} frames, alert at {}, motor stop at {}",
            config.debounce_frames, config.alert_frame, config.motor_stop_frame
        );
        Ok(Self {
            tracker: HysteresisTracker::new(config.debounce_frames),
            scheduler: ActionScheduler::new(&config),
            classifier: RatioClassifier::new(&config),
            timeline: EventTimeline::default(),
            frames: 0,
            episode: 0,
        })
    }

    /// Process one frame. `None` means no face was detected: the frame is
    /// counted but neither the run counters nor the timeline move.
    pub fn process(&mut self, verdict: Option<FrameVerdict>) -> FrameDecision {
        self.frames += 1;

        let Some(verdict) = verdict else {
            debug!("Frame {}: no face, state frozen", self.frames);
            return FrameDecision {
                frame: self.frames,
                face_detected: false,
                verdict: None,
                status: self.tracker.status(),
                status_changed: false,
                episode: self.episode,
                timeline: self.timeline,
                actions: Vec::new(),
            };
        };

        let previous = self.tracker.status();
        let status = self.tracker.observe(verdict);

        let (timeline, actions) = self.scheduler.on_frame(status, self.timeline);
        if self.timeline.alert_frame_count == 0 && timeline.alert_frame_count > 0 {
            self.episode += 1;
            info!("Alert episode {} started ({})", self.episode, status);
        }
        self.timeline = timeline;

        FrameDecision {
            frame: self.frames,
            face_detected: true,
            verdict: Some(verdict),
            status,
            status_changed: status != previous,
            episode: self.episode,
            timeline,
            actions,
        }
    }

    /// Classify both eyes and process the resulting frame verdict
    pub fn process_eyes(&mut self, left: &EyeLandmarks, right: &EyeLandmarks) -> FrameDecision {
        let verdict = EyeCode::verdict(self.classifier.classify(left), self.classifier.classify(right));
        self.process(Some(verdict))
    }

    pub fn status(&self) -> Status {
        self.tracker.status()
    }

    pub fn timeline(&self) -> EventTimeline {
        self.timeline
    }

    pub fn counters(&self) -> RunCounters {
        self.tracker.counters()
    }

    /// Current (or most recent) alert episode number
    pub fn episode(&self) -> u64 {
        self.episode
    }

    /// Whether the given episode is still running
    pub fn episode_active(&self, episode: u64) -> bool {
        episode == self.episode && self.timeline.alert_frame_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> DrowsinessMonitor {
        DrowsinessMonitor::new(DmsConfig::default()).unwrap()
    }

    fn feed(monitor: &mut DrowsinessMonitor, verdict: Option<EyeCode>, frames: usize) -> Vec<FrameDecision> {
        (0..frames).map(|_| monitor.process(verdict)).collect()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DmsConfig {
            alert_frame: 0,
            ..Default::default()
        };
        assert!(DrowsinessMonitor::new(config).is_err());
    }

    #[test]
    fn test_no_face_freezes_state() {
        let mut monitor = monitor();
        feed(&mut monitor, Some(EyeCode::Closed), 20);
        let before = (monitor.counters(), monitor.timeline(), monitor.status());

        let decisions = feed(&mut monitor, None, 100);
        assert!(decisions.iter().all(|d| !d.face_detected && d.actions.is_empty()));
        assert_eq!((monitor.counters(), monitor.timeline(), monitor.status()), before);
        assert_eq!(decisions.last().unwrap().frame, 120);
    }

    #[test]
    fn test_scenario_closed_open_closed() {
        let mut monitor = monitor();
        let closed = feed(&mut monitor, Some(EyeCode::Closed), 45);
        let open = feed(&mut monitor, Some(EyeCode::Open), 40);
        let trailing = feed(&mut monitor, Some(EyeCode::Closed), 10);

        // SLEEPING commits on the 7th closed frame
        assert_eq!(closed[5].status, Status::Initializing);
        assert!(closed[6].status_changed);
        assert_eq!(closed[6].status, Status::Sleeping);
        assert_eq!(closed[44].timeline.alert_frame_count, 39);
        assert!(closed.iter().all(|d| d.actions.is_empty()));

        // The 40th alert frame is the first open frame: status still SLEEPING
        assert_eq!(open[0].status, Status::Sleeping);
        assert_eq!(open[0].actions, vec![Action::BuzzerOn, Action::LocateSafeSpots]);
        assert!(open[1..6].iter().all(|d| d.actions.is_empty()));

        // ACTIVE commits on the 7th open frame; the motor never stopped
        assert_eq!(open[6].status, Status::Active);
        assert_eq!(open[6].actions, vec![Action::BuzzerOff]);
        assert_eq!(open[6].timeline.alert_frame_count, 0);
        assert!(open[7..].iter().all(|d| d.actions.is_empty()));

        // SLEEPING recommits on the 7th frame of the trailing run
        assert!(trailing[..6].iter().all(|d| d.status == Status::Active));
        assert_eq!(trailing[6].status, Status::Sleeping);
        assert_eq!(trailing[9].timeline.alert_frame_count, 4);
        assert_eq!(trailing[9].episode, 2);

        let locates = closed
            .iter()
            .chain(&open)
            .chain(&trailing)
            .filter(|d| d.wants_locate())
            .count();
        assert_eq!(locates, 1);
    }

    #[test]
    fn test_recovery_after_motor_stop() {
        let mut monitor = monitor();
        let decisions = feed(&mut monitor, Some(EyeCode::Half), 100);
        // Drowsy from frame 7, so the 80th alert frame is frame 86
        let stop_frames: Vec<u64> = decisions
            .iter()
            .filter(|d| d.actions.contains(&Action::MotorStop))
            .map(|d| d.frame)
            .collect();
        assert_eq!(stop_frames, vec![86]);

        let recovery = feed(&mut monitor, Some(EyeCode::Open), 7);
        assert!(recovery[..6].iter().all(|d| d.actions.is_empty()));
        assert_eq!(recovery[6].actions, vec![Action::MotorStart, Action::BuzzerOff]);
        assert!(!monitor.timeline().motor_stopped);
    }

    #[test]
    fn test_episode_tracking() {
        let mut monitor = monitor();
        feed(&mut monitor, Some(EyeCode::Closed), 10);
        let episode = monitor.episode();
        assert_eq!(episode, 1);
        assert!(monitor.episode_active(episode));

        feed(&mut monitor, Some(EyeCode::Open), 7);
        assert!(!monitor.episode_active(episode));

        feed(&mut monitor, Some(EyeCode::Closed), 7);
        assert_eq!(monitor.episode(), 2);
        assert!(!monitor.episode_active(episode));
    }

    #[test]
    fn test_process_eyes_uses_worse_eye() {
        let open = EyeLandmarks::new([(0.0, 0.0), (3.0, 2.0), (7.0, 2.0), (10.0, 0.0), (7.0, -2.0), (3.0, -2.0)]);
        let shut = EyeLandmarks::new([(0.0, 0.0), (3.0, 0.1), (7.0, 0.1), (10.0, 0.0), (7.0, -0.1), (3.0, -0.1)]);
        let mut monitor = monitor();
        let decision = monitor.process_eyes(&open, &shut);
        assert_eq!(decision.verdict, Some(EyeCode::Closed));
        assert_eq!(monitor.counters().sleep, 1);
    }
}
