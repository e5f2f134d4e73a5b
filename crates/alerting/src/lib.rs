//! Alerting
//!
//! Records driver status transitions with timestamps so drowsiness can be
//! analysed by time of day.

mod log;

pub use log::{hourly_histogram, AlertEntry, AlertLog, AlertLogError};
