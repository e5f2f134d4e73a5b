//! Link Error Types

use thiserror::Error;

/// Errors that can occur on the controller link
#[derive(Debug, Error)]
pub enum LinkError {
    /// Serial port could not be opened
    #[error("Failed to open {device}: {reason}")]
    Open { device: String, reason: String },

    /// Write to the controller failed
    #[error("Write failed: {0}")]
    Write(String),

    /// Read from the controller failed
    #[error("Read failed: {0}")]
    Read(String),

    /// Link already closed
    #[error("Controller link is closed")]
    Closed,
}

impl From<std::io::Error> for LinkError {
    fn from(err: std::io::Error) -> Self {
        LinkError::Read(err.to_string())
    }
}
