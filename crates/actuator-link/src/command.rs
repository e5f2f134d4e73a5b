//! Actuator Command Definitions

use serde::{Deserialize, Serialize};

/// Commands understood by the vehicle controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActuatorCommand {
    MotorStart,
    MotorStop,
    BuzzerOn,
    BuzzerOff,
    /// Stop everything; sent on shutdown
    EmergencyStop,
}

impl ActuatorCommand {
    /// Wire byte for this command
    pub fn to_byte(self) -> u8 {
        match self {
            ActuatorCommand::MotorStart => b'M',
            ActuatorCommand::MotorStop => b'S',
            ActuatorCommand::BuzzerOn => b'B',
            ActuatorCommand::BuzzerOff => b'b',
            ActuatorCommand::EmergencyStop => b'O',
        }
    }

    /// Decode a wire byte (used by link mocks and controller simulators)
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'M' => Some(ActuatorCommand::MotorStart),
            b'S' => Some(ActuatorCommand::MotorStop),
            b'B' => Some(ActuatorCommand::BuzzerOn),
            b'b' => Some(ActuatorCommand::BuzzerOff),
            b'O' => Some(ActuatorCommand::EmergencyStop),
            _ => None,
        }
    }

    /// Short name for logs and metric labels
    pub fn name(self) -> &'static str {
        match self {
            ActuatorCommand::MotorStart => "motor_start",
            ActuatorCommand::MotorStop => "motor_stop",
            ActuatorCommand::BuzzerOn => "buzzer_on",
            ActuatorCommand::BuzzerOff => "buzzer_off",
            ActuatorCommand::EmergencyStop => "emergency_stop",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_bytes() {
        assert_eq!(ActuatorCommand::MotorStart.to_byte(), b'M');
        assert_eq!(ActuatorCommand::MotorStop.to_byte(), b'S');
        assert_eq!(ActuatorCommand::BuzzerOn.to_byte(), b'B');
        assert_eq!(ActuatorCommand::BuzzerOff.to_byte(), b'b');
        assert_eq!(ActuatorCommand::EmergencyStop.to_byte(), b'O');
    }

    #[test]
    fn test_unknown_byte() {
        assert_eq!(ActuatorCommand::from_byte(b'x'), None);
        assert_eq!(ActuatorCommand::from_byte(b'b'), Some(ActuatorCommand::BuzzerOff));
    }
}
