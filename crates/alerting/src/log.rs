//! Status transition log
//!
//! CSV with a `Timestamp,Status` header; one row per committed status
//! change. Status values use the driver display labels.

use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use dms::Status;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const HEADER: &str = "Timestamp,Status";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Alert log errors
#[derive(Debug, Error)]
pub enum AlertLogError {
    #[error("Alert log I/O error on {path}: {reason}")]
    Io { path: String, reason: String },
}

/// One logged transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEntry {
    pub timestamp: NaiveDateTime,
    pub status: Status,
}

/// Append-only status log
pub struct AlertLog {
    path: PathBuf,
    writer: BufWriter<File>,
    last: Option<Status>,
}

impl AlertLog {
    /// Open (or create) the log, writing the header to a new file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AlertLogError> {
        let path = path.as_ref().to_path_buf();
        let io_err = |e: std::io::Error| AlertLogError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        let is_new = file.metadata().map_err(io_err)?.len() == 0;

        let mut writer = BufWriter::new(file);
        if is_new {
            writeln!(writer, "{}", HEADER).map_err(io_err)?;
            writer.flush().map_err(io_err)?;
        }

        info!("Alert log at {}", path.display());
        Ok(Self {
            path,
            writer,
            last: None,
        })
    }

    /// Record `status` if it differs from the previously recorded one
    pub fn record(&mut self, status: Status, at: DateTime<Local>) -> Result<bool, AlertLogError> {
        if self.last == Some(status) {
            return Ok(false);
        }
        writeln!(self.writer, "{},{}", at.format(TIMESTAMP_FORMAT), status.label())
            .and_then(|_| self.writer.flush())
            .map_err(|e| AlertLogError::Io {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        self.last = Some(status);
        debug!("Logged status {}", status);
        Ok(true)
    }

    /// Read every well-formed row back; malformed rows are skipped
    pub fn read_entries(path: impl AsRef<Path>) -> Result<Vec<AlertEntry>, AlertLogError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| AlertLogError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut entries = Vec::new();
        for line in BufReader::new(file).lines().skip(1) {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("Stopping alert log read: {}", e);
                    break;
                }
            };
            match parse_row(&line) {
                Some(entry) => entries.push(entry),
                None => debug!("Skipping malformed alert log row: {:?}", line),
            }
        }
        Ok(entries)
    }
}

fn parse_row(line: &str) -> Option<AlertEntry> {
    let (timestamp, status) = line.split_once(',')?;
    Some(AlertEntry {
        timestamp: NaiveDateTime::parse_from_str(timestamp.trim(), TIMESTAMP_FORMAT).ok()?,
        status: Status::from_label(status)?,
    })
}

/// Drowsy/sleeping transitions per hour of day
pub fn hourly_histogram(entries: &[AlertEntry]) -> [u32; 24] {
    let mut hours = [0u32; 24];
    for entry in entries.iter().filter(|e| e.status.is_alert()) {
        hours[entry.timestamp.hour() as usize] += 1;
    }
    hours
}
