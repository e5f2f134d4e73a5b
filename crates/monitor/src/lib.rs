//! Drowsiness Guard Monitor
//!
//! Runs a monitoring session: frame verdicts in, actuator commands and
//! safe-spot alerts out.

pub mod config;
pub mod frame_source;
pub mod session;

pub use config::MonitorConfig;
pub use frame_source::{FrameSource, ReplayFrameSource};
pub use session::{FrameReport, MonitorSession, SessionSummary};

use std::net::SocketAddr;
use thiserror::Error;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Replay script error on line {line}: {reason}")]
    Script { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<::config::ConfigError> for MonitorError {
    fn from(e: ::config::ConfigError) -> Self {
        MonitorError::Config(e.to_string())
    }
}

/// Initialize logging
pub fn init_logging(level: &str, json: bool) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    if result.is_err() {
        warn!("Tracing subscriber already installed");
    }
}

/// Expose metrics for Prometheus scraping
pub fn install_metrics(listen: SocketAddr) -> Result<(), MonitorError> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(listen)
        .install()
        .map_err(|e| MonitorError::Config(format!("metrics exporter: {}", e)))?;
    info!("Metrics on http://{}/metrics", listen);
    Ok(())
}
