//! Actuator Link
//!
//! Talks to the vehicle controller over a serial link: single ASCII byte
//! commands outbound, newline-delimited JSON position telemetry inbound.

mod command;
mod error;
mod gateway;
mod link;
mod telemetry;

pub use command::ActuatorCommand;
pub use error::LinkError;
pub use gateway::ActuatorGateway;
pub use link::{HardwareLink, LinkConfig, MockLink, SerialLink};
pub use telemetry::{Position, TelemetryDecoder};
