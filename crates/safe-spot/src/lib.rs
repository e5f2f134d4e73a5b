//! Safe-Spot Locator
//!
//! When the driver stays drowsy, look up nearby places to stop:
//! - Overpass (OpenStreetMap amenities) or a commercial places API
//! - Top results rendered into a markup-safe alert
//! - Desktop popup or log notification
//! - Background worker so the frame loop never waits on the network

mod locator;
mod notify;
mod provider;
mod spot;
mod worker;

pub use locator::{
    LocateOutcome, LocatorConfig, ProviderKind, SafeSpotLocator, EMPTY_POPUP_TIMEOUT,
    FOUND_POPUP_TIMEOUT,
};
pub use notify::{
    build_notifier, DesktopNotifier, LogNotifier, Notification, NotificationLevel, Notifier,
    NotifierKind,
};
pub use provider::{OverpassProvider, PlacesProvider, SpotProvider, OSM_AMENITIES, PLACES_TYPES};
pub use spot::{category_label, escape_markup, render_alert, SafeSpot};
pub use worker::{EpisodeGate, LocateResult, LocateWorker};

use thiserror::Error;

/// Locator error types
#[derive(Error, Debug)]
pub enum LocateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Locate worker stopped")]
    WorkerStopped,
}
