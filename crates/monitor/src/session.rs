//! Monitoring session
//!
//! Drives the frame loop: telemetry poll, drowsiness decision, actuator
//! commands, safe-spot dispatch and the status log. The actuator gateway
//! sends its emergency stop when the session ends, on every exit path.

use crate::frame_source::FrameSource;
use actuator_link::{ActuatorCommand, ActuatorGateway, HardwareLink, Position};
use alerting::AlertLog;
use chrono::Local;
use dms::{Action, DrowsinessMonitor, FrameVerdict, Status};
use safe_spot::{LocateResult, LocateWorker};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// What happened on one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub status: Status,
    pub gps_fix: bool,
    pub commands: Vec<ActuatorCommand>,
    pub locate_requested: bool,
}

impl FrameReport {
    pub fn gps_label(&self) -> &'static str {
        if self.gps_fix {
            "YES"
        } else {
            "SEARCHING"
        }
    }
}

/// Totals for a finished session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub frames: u64,
    pub episodes: u64,
    pub locate_requests: u64,
    pub locate_results: u64,
    pub final_status: Status,
}

pub struct MonitorSession<L: HardwareLink> {
    monitor: DrowsinessMonitor,
    gateway: ActuatorGateway<L>,
    worker: Option<LocateWorker>,
    alert_log: Option<AlertLog>,
    summary: SessionSummary,
}

fn command_for(action: Action) -> Option<ActuatorCommand> {
    match action {
        Action::MotorStart => Some(ActuatorCommand::MotorStart),
        Action::MotorStop => Some(ActuatorCommand::MotorStop),
        Action::BuzzerOn => Some(ActuatorCommand::BuzzerOn),
        Action::BuzzerOff => Some(ActuatorCommand::BuzzerOff),
        Action::LocateSafeSpots => None,
    }
}

impl<L: HardwareLink> MonitorSession<L> {
    /// `worker` is optional so the loop can run without network access
    pub fn new(
        monitor: DrowsinessMonitor,
        gateway: ActuatorGateway<L>,
        worker: Option<LocateWorker>,
        alert_log: Option<AlertLog>,
    ) -> Self {
        Self {
            monitor,
            gateway,
            worker,
            alert_log,
            summary: SessionSummary::default(),
        }
    }

    /// Process one frame. Never waits on the network.
    pub fn step(&mut self, verdict: Option<FrameVerdict>) -> FrameReport {
        let position = self.gateway.poll_telemetry();
        let decision = self.monitor.process(verdict);
        metrics::counter!("dms_frames_total").increment(1);

        if decision.episode > self.summary.episodes {
            self.summary.episodes = decision.episode;
            metrics::counter!("dms_alert_episodes_total").increment(1);
        }

        let mut commands = Vec::new();
        let mut locate_requested = false;
        for &action in &decision.actions {
            match command_for(action) {
                Some(command) => {
                    self.gateway.send(command);
                    commands.push(command);
                }
                None => locate_requested = self.dispatch_locate(decision.episode, position),
            }
        }

        if let Some(worker) = &self.worker {
            if decision.timeline.alert_frame_count == 0 {
                worker.gate().close();
            }
        }
        self.drain_results();

        if decision.status_changed {
            if let Some(log) = self.alert_log.as_mut() {
                if let Err(e) = log.record(decision.status, Local::now()) {
                    warn!("Alert log write failed: {}", e);
                }
            }
        }

        self.summary.frames = decision.frame;
        self.summary.final_status = decision.status;

        let report = FrameReport {
            frame: decision.frame,
            status: decision.status,
            gps_fix: position.has_fix(),
            commands,
            locate_requested,
        };
        debug!(
            "Frame {}: {} | GPS {} | alert frames {}",
            report.frame,
            report.status,
            report.gps_label(),
            decision.timeline.alert_frame_count
        );
        report
    }

    fn dispatch_locate(&mut self, episode: u64, position: Position) -> bool {
        let Some(worker) = &self.worker else {
            debug!("No locator configured, skipping safe-spot search");
            return false;
        };
        match worker.request(episode, position) {
            Ok(()) => {
                info!(
                    "Safe-spot search queued for episode {} at {:.6},{:.6}",
                    episode, position.lat, position.lng
                );
                self.summary.locate_requests += 1;
                true
            }
            Err(e) => {
                warn!("Could not queue safe-spot search: {}", e);
                false
            }
        }
    }

    fn drain_results(&mut self) {
        let Some(worker) = self.worker.as_mut() else {
            return;
        };
        while let Some(result) = worker.try_recv() {
            self.summary.locate_results += 1;
            debug!(
                "Safe-spot search for episode {} finished: {}",
                result.episode,
                result.outcome.label()
            );
        }
    }

    /// Wait for the next safe-spot result
    pub async fn next_locate_result(&mut self) -> Option<LocateResult> {
        let result = self.worker.as_mut()?.recv().await;
        if result.is_some() {
            self.summary.locate_results += 1;
        }
        result
    }

    /// Run until the source is exhausted or Ctrl-C, pacing at `frame_rate`
    /// frames per second (0 = unpaced)
    pub async fn run<S: FrameSource>(self, source: &mut S, frame_rate: f64) -> SessionSummary {
        self.run_until(source, frame_rate, tokio::signal::ctrl_c()).await
    }

    /// Like [`MonitorSession::run`], stopping when `shutdown` completes
    pub async fn run_until<S, F>(mut self, source: &mut S, frame_rate: f64, shutdown: F) -> SessionSummary
    where
        S: FrameSource,
        F: Future,
    {
        let mut ticker = (frame_rate > 0.0).then(|| {
            let mut ticker = interval(Duration::from_secs_f64(1.0 / frame_rate));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        tokio::pin!(shutdown);

        loop {
            let pace = async {
                match ticker.as_mut() {
                    Some(ticker) => {
                        ticker.tick().await;
                    }
                    None => tokio::task::yield_now().await,
                }
            };
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Interrupted");
                    break;
                }
                _ = pace => {}
            }
            match source.next_frame() {
                Some(verdict) => {
                    self.step(verdict);
                }
                None => {
                    info!("Frame source exhausted");
                    break;
                }
            }
        }

        self.finish()
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// Stop the worker and release the controller
    pub fn finish(mut self) -> SessionSummary {
        self.drain_results();
        self.worker = None;
        let summary = self.summary.clone();
        info!(
            "Session ended after {} frames, {} episodes, final status {}",
            summary.frames, summary.episodes, summary.final_status
        );
        self.gateway.shutdown();
        summary
    }
}
