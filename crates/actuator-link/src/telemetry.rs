//! Position telemetry decoding
//!
//! The controller interleaves GPS fixes (`{"lat": .., "lng": ..}`) with
//! free-form debug output. Only complete lines that parse as a fix are kept.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Mean Earth radius in kilometres
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Partial lines longer than this are dropped
const MAX_LINE_BYTES: usize = 1024;

/// GPS position; (0, 0) means no fix yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether a GPS fix has been received
    pub fn has_fix(&self) -> bool {
        !(self.lat == 0.0 && self.lng == 0.0)
    }

    /// Great-circle distance (haversine)
    pub fn distance_km(&self, other: &Position) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }

    /// Parse one telemetry line. Anything that is not a JSON object with
    /// numeric `lat` and `lng` yields `None`.
    pub fn parse_line(line: &str) -> Option<Position> {
        let line = line.trim();
        if !line.starts_with('{') {
            return None;
        }
        serde_json::from_str::<Position>(line).ok()
    }
}

/// Reassembles newline-delimited telemetry from arbitrary byte chunks
#[derive(Debug, Default)]
pub struct TelemetryDecoder {
    buffer: Vec<u8>,
    /// Inside an oversized line; bytes are ignored until its newline
    skipping: bool,
    accepted: u64,
    discarded: u64,
}

impl TelemetryDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed received bytes; returns the newest fix among completed lines
    pub fn push(&mut self, bytes: &[u8]) -> Option<Position> {
        let mut latest = None;

        for &byte in bytes {
            if self.skipping {
                if byte == b'\n' {
                    self.skipping = false;
                }
            } else if byte == b'\n' {
                let line = String::from_utf8_lossy(&self.buffer).into_owned();
                self.buffer.clear();
                if let Some(position) = self.accept(&line) {
                    latest = Some(position);
                }
            } else if self.buffer.len() < MAX_LINE_BYTES {
                self.buffer.push(byte);
            } else {
                debug!("Telemetry line exceeded {} bytes, dropping", MAX_LINE_BYTES);
                self.buffer.clear();
                self.skipping = true;
                self.discarded += 1;
            }
        }

        latest
    }

    fn accept(&mut self, line: &str) -> Option<Position> {
        if line.trim().is_empty() {
            return None;
        }
        match Position::parse_line(line) {
            Some(position) => {
                self.accepted += 1;
                trace!("GPS fix {:.6},{:.6}", position.lat, position.lng);
                Some(position)
            }
            None => {
                self.discarded += 1;
                trace!("Discarding telemetry line: {:?}", line.trim());
                None
            }
        }
    }

    /// Lines accepted as position fixes
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Non-empty lines discarded as malformed
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_valid_line() {
        let position = Position::parse_line(r#"{"lat": 12.9716, "lng": 77.5946}"#).unwrap();
        assert_eq!(position, Position::new(12.9716, 77.5946));
    }

    #[test]
    fn test_parse_ignores_extra_fields_and_whitespace() {
        let position = Position::parse_line("  {\"lat\": 1, \"lng\": 2, \"sats\": 7}\r").unwrap();
        assert_eq!(position, Position::new(1.0, 2.0));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Position::parse_line("GPS: waiting").is_none());
        assert!(Position::parse_line(r#"{"lat": 12.9"#).is_none());
        assert!(Position::parse_line(r#"{"lat": "12.9", "lng": 77.5}"#).is_none());
        assert!(Position::parse_line(r#"{"lat": 12.9}"#).is_none());
        assert!(Position::parse_line("").is_none());
    }

    #[test]
    fn test_decoder_reassembles_chunks() {
        let mut decoder = TelemetryDecoder::new();
        assert!(decoder.push(br#"{"lat": 10.5, "#).is_none());
        let position = decoder.push(b"\"lng\": 20.25}\n").unwrap();
        assert_eq!(position, Position::new(10.5, 20.25));
        assert_eq!(decoder.accepted(), 1);
    }

    #[test]
    fn test_decoder_keeps_newest_fix() {
        let mut decoder = TelemetryDecoder::new();
        let bytes = b"{\"lat\": 1, \"lng\": 1}\nboot ok\n{\"lat\": 2, \"lng\": 3}\n{\"lat\": 9";
        assert_eq!(decoder.push(bytes), Some(Position::new(2.0, 3.0)));
        assert_eq!(decoder.discarded(), 1);
    }

    #[test]
    fn test_decoder_drops_runaway_line() {
        let mut decoder = TelemetryDecoder::new();
        let noise = vec![b'x'; MAX_LINE_BYTES + 10];
        assert!(decoder.push(&noise).is_none());
        assert_eq!(decoder.push(b"{\"lat\": 4, \"lng\": 5}\n"), None);
        assert_eq!(decoder.discarded(), 1);
    }

    #[test]
    fn test_decoder_discards_tail_of_oversized_line() {
        let mut decoder = TelemetryDecoder::new();
        let mut line = vec![b'x'; MAX_LINE_BYTES + 1];
        line.extend_from_slice(b"{\"lat\": 4, \"lng\": 5}\n");
        assert_eq!(decoder.push(&line), None);
        assert_eq!(decoder.accepted(), 0);
        assert_eq!(decoder.discarded(), 1);

        // Next line decodes normally
        assert_eq!(decoder.push(b"{\"lat\": 6, \"lng\": 7}\n"), Some(Position::new(6.0, 7.0)));
    }

    #[test]
    fn test_fix_detection() {
        assert!(!Position::default().has_fix());
        assert!(Position::new(0.0, 77.5).has_fix());
    }

    #[test]
    fn test_haversine() {
        // One degree of latitude is ~111.19 km
        let a = Position::new(0.0, 10.0);
        let b = Position::new(1.0, 10.0);
        assert!((a.distance_km(&b) - 111.19).abs() < 0.1);
        assert_eq!(a.distance_km(&a), 0.0);
    }

    proptest! {
        #[test]
        fn decoder_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let mut decoder = TelemetryDecoder::new();
            let _ = decoder.push(&bytes);
        }
    }
}
