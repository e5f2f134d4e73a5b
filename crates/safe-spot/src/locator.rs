//! Safe-spot locator

use crate::notify::{build_notifier, Notification, NotificationLevel, Notifier, NotifierKind};
use crate::provider::{
    OverpassProvider, PlacesProvider, SpotProvider, DEFAULT_OVERPASS_URL, DEFAULT_PLACES_URL,
};
use crate::spot::{render_alert, SafeSpot};
use crate::LocateError;
use actuator_link::Position;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Auto-dismiss for a list of spots
pub const FOUND_POPUP_TIMEOUT: Duration = Duration::from_secs(15);

/// Auto-dismiss for "nothing nearby"
pub const EMPTY_POPUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Which geospatial backend to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Overpass,
    Places,
}

/// Locator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    pub provider: ProviderKind,
    /// Search radius (km)
    pub radius_km: f64,
    /// Spots listed in the alert
    pub max_results: usize,
    /// Client timeout, also embedded in the Overpass query
    pub request_timeout_secs: u64,
    pub overpass_url: String,
    pub places_url: String,
    /// Required for the places provider
    pub api_key: Option<String>,
    pub notifier: NotifierKind,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Overpass,
            radius_km: 5.0,
            max_results: 4,
            request_timeout_secs: 25,
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            places_url: DEFAULT_PLACES_URL.to_string(),
            api_key: None,
            notifier: NotifierKind::Desktop,
        }
    }
}

impl LocatorConfig {
    pub fn radius_m(&self) -> u32 {
        (self.radius_km * 1000.0).round().max(0.0) as u32
    }
}

/// Result of one search
#[derive(Debug, Clone, PartialEq)]
pub enum LocateOutcome {
    /// No GPS fix; nothing was queried
    NoFix,
    /// Spots found
    Found {
        /// Results returned before truncation
        total: usize,
        /// Listed spots, in provider order
        spots: Vec<SafeSpot>,
        /// Rendered alert body
        message: String,
    },
    /// Query succeeded with zero results
    NoResults,
    /// Provider answered with a non-success HTTP status
    HttpStatus(u16),
    /// Transport, parse or provider failure
    Failed(String),
}

impl LocateOutcome {
    /// Short name for logs and metric labels
    pub fn label(&self) -> &'static str {
        match self {
            LocateOutcome::NoFix => "no_fix",
            LocateOutcome::Found { .. } => "found",
            LocateOutcome::NoResults => "no_results",
            LocateOutcome::HttpStatus(_) => "http_status",
            LocateOutcome::Failed(_) => "failed",
        }
    }
}

/// Queries a provider for safe spots and tells the driver about them
pub struct SafeSpotLocator {
    client: reqwest::Client,
    provider: Box<dyn SpotProvider>,
    notifier: Box<dyn Notifier>,
    radius_m: u32,
    radius_km: f64,
    max_results: usize,
    timeout: Duration,
}

impl SafeSpotLocator {
    /// Assemble a locator from explicit parts
    pub fn new(
        config: &LocatorConfig,
        provider: Box<dyn SpotProvider>,
        notifier: Box<dyn Notifier>,
    ) -> Result<Self, LocateError> {
        let timeout = Duration::from_secs(config.request_timeout_secs.max(1));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("drowsiness-guard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LocateError::Config(e.to_string()))?;

        Ok(Self {
            client,
            provider,
            notifier,
            radius_m: config.radius_m(),
            radius_km: config.radius_km,
            max_results: config.max_results.max(1),
            timeout,
        })
    }

    /// Build provider and notifier from configuration
    pub fn from_config(config: &LocatorConfig) -> Result<Self, LocateError> {
        let provider: Box<dyn SpotProvider> = match config.provider {
            ProviderKind::Overpass => Box::new(OverpassProvider::new(
                config.overpass_url.clone(),
                config.request_timeout_secs,
            )),
            ProviderKind::Places => {
                let key = config
                    .api_key
                    .as_deref()
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| LocateError::Config("places provider needs an api_key".into()))?;
                Box::new(PlacesProvider::new(config.places_url.clone(), key))
            }
        };
        info!(
            "Safe-spot locator: {} within {} km, top {}",
            provider.name(),
            config.radius_km,
            config.max_results
        );
        Self::new(config, provider, build_notifier(config.notifier))
    }

    /// Search around `position`. Never fails: every problem is logged and
    /// folded into the outcome.
    pub async fn locate(&self, position: Position) -> LocateOutcome {
        let outcome = self.query(position).await;
        metrics::counter!("safe_spot_lookups_total", "provider" => self.provider.name(), "outcome" => outcome.label())
            .increment(1);
        outcome
    }

    async fn query(&self, position: Position) -> LocateOutcome {
        if !position.has_fix() {
            warn!("GPS fix not yet acquired, cannot search for safe spots");
            return LocateOutcome::NoFix;
        }

        info!(
            "Scanning {} km for safe spots at {:.6},{:.6} via {}",
            self.radius_km,
            position.lat,
            position.lng,
            self.provider.name()
        );

        let response = match self
            .provider
            .request(&self.client, position, self.radius_m)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let err = if e.is_timeout() {
                    LocateError::Timeout(self.timeout.as_secs())
                } else {
                    LocateError::Network(e.to_string())
                };
                warn!("Safe-spot search failed: {}", err);
                return LocateOutcome::Failed(err.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Safe-spot provider returned HTTP {}", status.as_u16());
            return LocateOutcome::HttpStatus(status.as_u16());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                let err = LocateError::Network(e.to_string());
                warn!("Safe-spot search failed: {}", err);
                return LocateOutcome::Failed(err.to_string());
            }
        };

        let spots = match self.provider.parse(&body) {
            Ok(spots) => spots,
            Err(e) => {
                warn!("Safe-spot search failed: {}", e);
                return LocateOutcome::Failed(e.to_string());
            }
        };

        if spots.is_empty() {
            warn!("No safe spots within {} km", self.radius_km);
            return LocateOutcome::NoResults;
        }

        let total = spots.len();
        let spots: Vec<SafeSpot> = spots.into_iter().take(self.max_results).collect();
        let message = render_alert(total, &spots, &position);
        info!("Found {} safe spots, listing {}", total, spots.len());

        LocateOutcome::Found {
            total,
            spots,
            message,
        }
    }

    /// Popup for an outcome, if the driver should see one
    pub fn notification(&self, outcome: &LocateOutcome) -> Option<Notification> {
        match outcome {
            LocateOutcome::Found { message, .. } => Some(Notification {
                title: "SAFE SPOTS DETECTED".to_string(),
                body: message.clone(),
                timeout: FOUND_POPUP_TIMEOUT,
                level: NotificationLevel::Info,
            }),
            LocateOutcome::NoResults => Some(Notification {
                title: "No Spots".to_string(),
                body: format!("No safe spots found within {}km", self.radius_km),
                timeout: EMPTY_POPUP_TIMEOUT,
                level: NotificationLevel::Warning,
            }),
            _ => None,
        }
    }

    /// Show the popup for an outcome; failures stay silent
    pub fn surface(&self, outcome: &LocateOutcome) {
        if let Some(notification) = self.notification(outcome) {
            self.notifier.notify(&notification);
        }
    }

    /// Search and surface the result in one go
    pub async fn locate_and_notify(&self, position: Position) -> LocateOutcome {
        let outcome = self.locate(position).await;
        self.surface(&outcome);
        outcome
    }
}
