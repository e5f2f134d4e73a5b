//! Layered configuration
//!
//! Defaults, then an optional TOML file, then `DGUARD_` environment
//! variables (`__` separates nested keys, e.g. `DGUARD_LINK__DEVICE`).

use crate::MonitorError;
use actuator_link::LinkConfig;
use dms::DmsConfig;
use safe_spot::LocatorConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::debug;

const ENV_PREFIX: &str = "DGUARD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub link: LinkConfig,
    pub dms: DmsConfig,
    pub locator: LocatorConfig,
    /// Status transition CSV; disabled when unset
    pub alert_log: Option<PathBuf>,
    /// Frame pacing for replayed input; 0 runs unpaced
    pub frame_rate: f64,
    pub log_level: String,
    pub log_json: bool,
    /// Prometheus listener, e.g. "127.0.0.1:9100"
    pub metrics_listen: Option<SocketAddr>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            dms: DmsConfig::default(),
            locator: LocatorConfig::default(),
            alert_log: None,
            frame_rate: 30.0,
            log_level: "info".to_string(),
            log_json: false,
            metrics_listen: None,
        }
    }
}

impl MonitorConfig {
    /// Load configuration. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            debug!("Reading configuration from {}", path.display());
            builder = builder.add_source(::config::File::from(path).required(false));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: MonitorConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        self.dms
            .validate()
            .map_err(|e| MonitorError::Config(e.to_string()))?;
        if !(self.frame_rate >= 0.0 && self.frame_rate.is_finite()) {
            return Err(MonitorError::Config(format!("invalid frame_rate {}", self.frame_rate)));
        }
        if self.locator.radius_km <= 0.0 {
            return Err(MonitorError::Config("locator radius must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safe_spot::{NotifierKind, ProviderKind};

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("dguard-{}-{}.toml", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = MonitorConfig::load(Some(Path::new("/nonexistent/drowsiness-guard.toml"))).unwrap();
        assert_eq!(config.link.device, "/dev/ttyACM0");
        assert_eq!(config.dms.alert_frame, 40);
        assert_eq!(config.locator.max_results, 4);
    }

    #[test]
    fn test_file_overrides_nested_sections() {
        let path = write_temp(
            "nested",
            r#"
log_level = "debug"
alert_log = "/tmp/alerts.csv"

[link]
device = "/dev/ttyUSB1"
settle_ms = 0

[dms]
debounce_frames = 8

[locator]
provider = "places"
api_key = "k"
notifier = "log"
"#,
        );
        let config = MonitorConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.alert_log, Some(PathBuf::from("/tmp/alerts.csv")));
        assert_eq!(config.link.device, "/dev/ttyUSB1");
        assert_eq!(config.link.baud_rate, 9600);
        assert_eq!(config.link.settle_ms, 0);
        assert_eq!(config.dms.debounce_frames, 8);
        assert_eq!(config.dms.motor_stop_frame, 80);
        assert_eq!(config.locator.provider, ProviderKind::Places);
        assert_eq!(config.locator.notifier, NotifierKind::Log);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let path = write_temp("invalid", "[dms]\nalert_frame = 100\nmotor_stop_frame = 50\n");
        let result = MonitorConfig::load(Some(&path));
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(MonitorError::Config(_))));

        let config = MonitorConfig {
            frame_rate: -1.0,
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
