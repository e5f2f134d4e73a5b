//! Actuator gateway
//!
//! Owns the controller link for the whole session. Commands are
//! fire-and-forget; the motor is started when the gateway is created and an
//! emergency stop is always sent before the link is released, including when
//! the gateway is dropped during an error return or a panic.

use crate::command::ActuatorCommand;
use crate::error::LinkError;
use crate::link::HardwareLink;
use crate::telemetry::{Position, TelemetryDecoder};
use tracing::{debug, info, warn};

pub struct ActuatorGateway<L: HardwareLink> {
    link: L,
    decoder: TelemetryDecoder,
    position: Position,
    read_buf: Vec<u8>,
    shut_down: bool,
}

impl<L: HardwareLink> ActuatorGateway<L> {
    /// Take ownership of an open link and start the motor
    pub fn start(link: L) -> Self {
        let mut gateway = Self {
            link,
            decoder: TelemetryDecoder::new(),
            position: Position::default(),
            read_buf: Vec::with_capacity(256),
            shut_down: false,
        };
        info!("Actuator gateway online, starting motor");
        gateway.send(ActuatorCommand::MotorStart);
        gateway
    }

    /// Send a command, best effort. Failures are logged, never returned.
    pub fn send(&mut self, command: ActuatorCommand) {
        match self.link.send(command.to_byte()) {
            Ok(()) => {
                debug!("Sent {} ({:?})", command.name(), command.to_byte() as char);
                metrics::counter!("actuator_commands_total", "command" => command.name()).increment(1);
            }
            Err(e) => {
                warn!("Failed to send {}: {}", command.name(), e);
                metrics::counter!("actuator_command_failures_total", "command" => command.name()).increment(1);
            }
        }
    }

    /// Drain any telemetry already received and return the current position.
    /// Never waits for data; read errors are logged and ignored.
    pub fn poll_telemetry(&mut self) -> Position {
        self.read_buf.clear();
        match self.link.poll(&mut self.read_buf) {
            Ok(0) => {}
            Ok(_) => {
                if let Some(position) = self.decoder.push(&self.read_buf) {
                    if !self.position.has_fix() && position.has_fix() {
                        info!("GPS fix acquired: {:.6},{:.6}", position.lat, position.lng);
                    }
                    self.position = position;
                }
            }
            Err(LinkError::Closed) => {}
            Err(e) => debug!("Telemetry poll failed: {}", e),
        }
        self.position
    }

    /// Last known position
    pub fn position(&self) -> Position {
        self.position
    }

    /// Telemetry decoder statistics
    pub fn telemetry(&self) -> &TelemetryDecoder {
        &self.decoder
    }

    /// Send the emergency stop and release the link
    pub fn shutdown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        info!("Shutting down actuator gateway: emergency stop");
        self.send(ActuatorCommand::EmergencyStop);
        self.link.close();
    }
}

impl<L: HardwareLink> Drop for ActuatorGateway<L> {
    fn drop(&mut self) {
        self.release();
    }
}
