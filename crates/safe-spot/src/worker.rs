//! Background locate worker
//!
//! The frame loop hands off requests and polls for results; it never waits on
//! the network. Each request is tagged with its alert episode and only
//! surfaced to the driver if that episode is still running when the answer
//! arrives.

use crate::locator::{LocateOutcome, SafeSpotLocator};
use crate::LocateError;
use actuator_link::Position;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Pending requests beyond this are rejected
const REQUEST_QUEUE: usize = 4;

/// Episode currently in progress, shared between the frame loop and the
/// worker. 0 means no episode.
#[derive(Debug, Clone, Default)]
pub struct EpisodeGate {
    current: Arc<AtomicU64>,
}

impl EpisodeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `episode` as running
    pub fn open(&self, episode: u64) {
        self.current.store(episode, Ordering::SeqCst);
    }

    /// No episode running
    pub fn close(&self) {
        self.current.store(0, Ordering::SeqCst);
    }

    pub fn is_current(&self, episode: u64) -> bool {
        episode != 0 && self.current.load(Ordering::SeqCst) == episode
    }
}

/// Answer to one request
#[derive(Debug, Clone)]
pub struct LocateResult {
    pub episode: u64,
    pub position: Position,
    pub outcome: LocateOutcome,
    /// Shown to the driver (false when the episode had already ended)
    pub surfaced: bool,
}

pub struct LocateWorker {
    requests: mpsc::Sender<(u64, Position)>,
    results: mpsc::Receiver<LocateResult>,
    gate: EpisodeGate,
    task: JoinHandle<()>,
}

impl LocateWorker {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn(locator: SafeSpotLocator) -> Self {
        let (request_tx, mut request_rx) = mpsc::channel::<(u64, Position)>(REQUEST_QUEUE);
        let (result_tx, result_rx) = mpsc::channel::<LocateResult>(REQUEST_QUEUE * 2);
        let gate = EpisodeGate::new();
        let locator = Arc::new(locator);

        let task_gate = gate.clone();
        let task = tokio::spawn(async move {
            while let Some((episode, position)) = request_rx.recv().await {
                let locator = Arc::clone(&locator);
                let gate = task_gate.clone();
                let results = result_tx.clone();

                // One task per request so a hung query never delays the next episode
                tokio::spawn(async move {
                    let outcome = locator.locate(position).await;
                    let surfaced = gate.is_current(episode);
                    if surfaced {
                        locator.surface(&outcome);
                    } else {
                        info!(
                            "Episode {} ended before safe-spot search finished ({}), not shown",
                            episode,
                            outcome.label()
                        );
                    }
                    let result = LocateResult {
                        episode,
                        position,
                        outcome,
                        surfaced,
                    };
                    if results.send(result).await.is_err() {
                        debug!("Locate result receiver dropped");
                    }
                });
            }
            debug!("Locate worker stopped");
        });

        Self {
            requests: request_tx,
            results: result_rx,
            gate,
            task,
        }
    }

    /// Gate the frame loop uses to publish the running episode
    pub fn gate(&self) -> EpisodeGate {
        self.gate.clone()
    }

    /// Queue a search for `episode`; never waits
    pub fn request(&self, episode: u64, position: Position) -> Result<(), LocateError> {
        self.gate.open(episode);
        self.requests
            .try_send((episode, position))
            .map_err(|_| LocateError::WorkerStopped)
    }

    /// Next finished search, if any
    pub fn try_recv(&mut self) -> Option<LocateResult> {
        self.results.try_recv().ok()
    }

    /// Wait for the next finished search
    pub async fn recv(&mut self) -> Option<LocateResult> {
        self.results.recv().await
    }
}

impl Drop for LocateWorker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
