//! Controller link transports
//!
//! [`SerialLink`] drives the real controller; [`MockLink`] records traffic
//! in memory for tests and dry runs.

use crate::error::LinkError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_serial::SerialPort;
use tracing::{debug, info};

/// Read timeout for the serial port; polling never waits longer than this
const READ_TIMEOUT_MS: u64 = 100;

/// Serial link configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Serial port device path (e.g., "/dev/ttyACM0" or "COM3")
    pub device: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Time the controller needs after the port opens (it resets on open)
    pub settle_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyACM0".to_string(),
            baud_rate: 9600,
            settle_ms: 2000,
        }
    }
}

/// Byte transport to the vehicle controller
pub trait HardwareLink: Send {
    /// Write a single command byte
    fn send(&mut self, byte: u8) -> Result<(), LinkError>;

    /// Read whatever bytes are already available, without waiting for more
    fn poll(&mut self, buf: &mut Vec<u8>) -> Result<usize, LinkError>;

    /// Release the link
    fn close(&mut self);
}

/// Serial port link to the controller
pub struct SerialLink {
    device: String,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialLink {
    /// Open the serial port and wait for the controller to settle.
    /// The wait yields to the runtime instead of blocking its thread.
    pub async fn connect(config: &LinkConfig) -> Result<Self, LinkError> {
        let link = Self::open(config)?;
        settle(config.settle_ms).await;
        info!("Controller link online");
        Ok(link)
    }

    /// Open the serial port without waiting for the controller
    pub fn open(config: &LinkConfig) -> Result<Self, LinkError> {
        info!("Opening controller link on {} @ {} baud", config.device, config.baud_rate);

        let port = tokio_serial::new(&config.device, config.baud_rate)
            .timeout(Duration::from_millis(READ_TIMEOUT_MS))
            .open()
            .map_err(|e| LinkError::Open {
                device: config.device.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            device: config.device.clone(),
            port: Some(port),
        })
    }
}

/// Controller resets when the port opens
async fn settle(settle_ms: u64) {
    if settle_ms > 0 {
        debug!("Waiting {}ms for controller reset", settle_ms);
        tokio::time::sleep(Duration::from_millis(settle_ms)).await;
    }
}

impl HardwareLink for SerialLink {
    fn send(&mut self, byte: u8) -> Result<(), LinkError> {
        let port = self.port.as_mut().ok_or(LinkError::Closed)?;
        port.write_all(&[byte])
            .and_then(|_| port.flush())
            .map_err(|e| LinkError::Write(e.to_string()))
    }

    fn poll(&mut self, buf: &mut Vec<u8>) -> Result<usize, LinkError> {
        let port = self.port.as_mut().ok_or(LinkError::Closed)?;
        let available = port
            .bytes_to_read()
            .map_err(|e| LinkError::Read(e.to_string()))? as usize;
        if available == 0 {
            return Ok(0);
        }

        let start = buf.len();
        buf.resize(start + available, 0);
        let read = port.read(&mut buf[start..])?;
        buf.truncate(start + read);
        Ok(read)
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!("Closed controller link on {}", self.device);
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    sent: Vec<u8>,
    inbound: VecDeque<u8>,
    closed: bool,
    fail_writes: bool,
}

/// In-memory link; clones share the same state
#[derive(Debug, Clone, Default)]
pub struct MockLink {
    state: Arc<Mutex<MockState>>,
}

impl MockLink {
    pub fn new() -> Self {
        info!("Creating mock controller link");
        Self::default()
    }

    /// Queue bytes as if the controller had sent them
    pub fn inject(&self, bytes: &[u8]) {
        if let Ok(mut state) = self.state.lock() {
            state.inbound.extend(bytes);
        }
    }

    /// Every byte written so far
    pub fn sent(&self) -> Vec<u8> {
        self.state.lock().map(|s| s.sent.clone()).unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().map(|s| s.closed).unwrap_or(true)
    }

    /// Make subsequent writes fail (to exercise fire-and-forget handling)
    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_writes = fail;
        }
    }
}

impl HardwareLink for MockLink {
    fn send(&mut self, byte: u8) -> Result<(), LinkError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| LinkError::Write(e.to_string()))?;
        if state.closed {
            return Err(LinkError::Closed);
        }
        if state.fail_writes {
            return Err(LinkError::Write("injected failure".to_string()));
        }
        state.sent.push(byte);
        Ok(())
    }

    fn poll(&mut self, buf: &mut Vec<u8>) -> Result<usize, LinkError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| LinkError::Read(e.to_string()))?;
        if state.closed {
            return Err(LinkError::Closed);
        }
        let count = state.inbound.len();
        buf.extend(state.inbound.drain(..));
        Ok(count)
    }

    fn close(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
        }
    }
}
