//! Drowsiness Guard - Main Entry Point

use actuator_link::{ActuatorGateway, HardwareLink, MockLink, SerialLink};
use alerting::AlertLog;
use anyhow::{Context, Result};
use clap::Parser;
use dms::DrowsinessMonitor;
use monitor::{init_logging, install_metrics, MonitorConfig, MonitorSession, ReplayFrameSource};
use safe_spot::{LocateWorker, SafeSpotLocator};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "drowsiness-guard")]
#[command(about = "Driver drowsiness monitor with actuator control and safe-spot alerts", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, default_value = "drowsiness-guard.toml")]
    config: PathBuf,

    /// Frame verdict script to replay
    #[arg(long, value_name = "FILE")]
    replay: PathBuf,

    /// Use an in-memory controller link instead of the serial port
    #[arg(long, default_value_t = false)]
    mock_link: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = MonitorConfig::load(Some(&cli.config))
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    init_logging(&config.log_level, config.log_json);
    info!("=== Drowsiness Guard v{} ===", env!("CARGO_PKG_VERSION"));

    if let Some(listen) = config.metrics_listen {
        if let Err(e) = install_metrics(listen) {
            warn!("Metrics disabled: {}", e);
        }
    }

    let mut source = ReplayFrameSource::from_path(&cli.replay)
        .with_context(|| format!("reading replay script {}", cli.replay.display()))?;

    if cli.mock_link {
        info!("Using in-memory controller link");
        run(MockLink::new(), &config, &mut source).await
    } else {
        let link = SerialLink::connect(&config.link)
            .await
            .context("opening controller link")?;
        run(link, &config, &mut source).await
    }
}

async fn run<L: HardwareLink>(link: L, config: &MonitorConfig, source: &mut ReplayFrameSource) -> Result<()> {
    let monitor = DrowsinessMonitor::new(config.dms.clone()).context("invalid DMS configuration")?;
    let gateway = ActuatorGateway::start(link);

    let worker = match SafeSpotLocator::from_config(&config.locator) {
        Ok(locator) => Some(LocateWorker::spawn(locator)),
        Err(e) => {
            warn!("Safe-spot search disabled: {}", e);
            None
        }
    };

    let alert_log = config.alert_log.as_ref().and_then(|path| match AlertLog::open(path) {
        Ok(log) => Some(log),
        Err(e) => {
            warn!("Alert log disabled: {}", e);
            None
        }
    });

    let session = MonitorSession::new(monitor, gateway, worker, alert_log);
    let summary = session.run(source, config.frame_rate).await;
    info!(
        "Processed {} frames; {} alert episodes; {} safe-spot searches",
        summary.frames, summary.episodes, summary.locate_requests
    );
    Ok(())
}
