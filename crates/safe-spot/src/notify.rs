//! Driver-facing notifications

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Popup style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationLevel {
    Info,
    Warning,
}

/// A popup for the driver
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    /// Markup-escaped, possibly multi-line body
    pub body: String,
    /// Auto-dismiss after this long
    pub timeout: Duration,
    pub level: NotificationLevel,
}

/// Surfaces notifications without blocking the caller
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Which notifier to build from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Desktop,
    Log,
}

/// Desktop popup through `zenity`
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    program: String,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            program: "zenity".to_string(),
        }
    }

    /// Use a different zenity-compatible executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Command-line arguments for a notification
    pub fn args(notification: &Notification) -> Vec<String> {
        let kind = match notification.level {
            NotificationLevel::Info => "--info",
            NotificationLevel::Warning => "--warning",
        };
        vec![
            kind.to_string(),
            format!("--title={}", notification.title),
            format!("--text={}", notification.body),
            format!("--timeout={}", notification.timeout.as_secs().max(1)),
        ]
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, notification: &Notification) {
        // The child is not awaited; tokio reaps it after it exits
        match tokio::process::Command::new(&self.program)
            .args(Self::args(notification))
            .spawn()
        {
            Ok(_child) => debug!("Popup '{}' shown", notification.title),
            Err(e) => warn!("Failed to launch {}: {}", self.program, e),
        }
    }
}

/// Writes notifications to the log only
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Info => info!("[{}] {}", notification.title, notification.body),
            NotificationLevel::Warning => warn!("[{}] {}", notification.title, notification.body),
        }
    }
}

/// Build the configured notifier
pub fn build_notifier(kind: NotifierKind) -> Box<dyn Notifier> {
    match kind {
        NotifierKind::Desktop => Box::new(DesktopNotifier::new()),
        NotifierKind::Log => Box::new(LogNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zenity_args() {
        let notification = Notification {
            title: "SAFE SPOTS DETECTED".to_string(),
            body: "EMERGENCY: 1 spots found nearby:\n- FUEL: A &amp; B".to_string(),
            timeout: Duration::from_secs(15),
            level: NotificationLevel::Info,
        };
        let args = DesktopNotifier::args(&notification);
        assert_eq!(args[0], "--info");
        assert_eq!(args[1], "--title=SAFE SPOTS DETECTED");
        assert!(args[2].starts_with("--text=EMERGENCY"));
        assert_eq!(args[3], "--timeout=15");
    }

    #[tokio::test]
    async fn test_missing_program_does_not_panic() {
        let notifier = DesktopNotifier::with_program("/nonexistent/zenity");
        notifier.notify(&Notification {
            title: "No Spots".to_string(),
            body: "nothing".to_string(),
            timeout: Duration::from_secs(5),
            level: NotificationLevel::Warning,
        });
    }
}
