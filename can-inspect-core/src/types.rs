//! Core types for the CAN live-inspection library
//!
//! This module defines the fundamental types that flow through the ingestion
//! pipeline: raw frames as they arrive from a device transport, and decoded
//! signal values as they are handed to consumers. The pipeline is push-based
//! and emits decoded values per frame - it does not retain any global mutable
//! view beyond the explicit snapshot accessors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used throughout the library
pub type Timestamp = DateTime<Utc>;

/// Result type for catalog and pipeline operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Raw CAN frame as received from a device transport or simulator
///
/// This represents a single CAN frame event, before any signal decoding,
/// change tracking, or transport-layer interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    /// Timestamp in nanoseconds since epoch
    pub timestamp_ns: u64,
    /// CAN channel number (e.g., 0, 1, 2...)
    pub channel: u8,
    /// CAN arbitration ID (11-bit or 29-bit)
    pub can_id: u32,
    /// Frame data bytes (0-8 bytes for classic CAN)
    pub data: Vec<u8>,
    /// True if this is an extended (29-bit) CAN ID
    pub is_extended: bool,
    /// True if this is a remote frame
    pub is_remote: bool,
    /// Direction of the frame relative to this node
    pub direction: Direction,
}

impl RawFrame {
    /// Build a received data frame with a standard (11-bit) ID
    pub fn new(timestamp_ns: u64, can_id: u32, data: Vec<u8>) -> Self {
        Self {
            timestamp_ns,
            channel: 0,
            can_id,
            data,
            is_extended: false,
            is_remote: false,
            direction: Direction::Rx,
        }
    }

    /// Convert timestamp from nanoseconds to DateTime<Utc>
    pub fn timestamp(&self) -> Timestamp {
        let secs = (self.timestamp_ns / 1_000_000_000) as i64;
        let nsecs = (self.timestamp_ns % 1_000_000_000) as u32;
        DateTime::from_timestamp(secs, nsecs).unwrap_or_else(Utc::now)
    }

    /// Get the data length code (DLC) - number of data bytes
    pub fn dlc(&self) -> usize {
        self.data.len()
    }
}

/// Frame direction relative to this node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Received from the bus
    Rx,
    /// Transmitted by this node
    Tx,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Rx => write!(f, "Rx"),
            Direction::Tx => write!(f, "Tx"),
        }
    }
}

/// Errors raised by catalog edits and definition validation
///
/// Frame-level degenerate input (short frames, out-of-range bit positions,
/// orphan transport frames) never raises an error - those cases resolve to
/// documented defaults inside the codec and reassembler.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Message not found: CAN ID 0x{0:X}")]
    MessageNotFound(u32),

    #[error("Message not found: {0}")]
    MessageNameNotFound(String),

    #[error("Signal not found: {0}")]
    SignalNotFound(String),

    #[error("Duplicate message: CAN ID 0x{0:X}")]
    DuplicateMessage(u32),

    #[error("Duplicate signal: {0}")]
    DuplicateSignal(String),

    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),
}

/// A decoded signal value - the per-frame output of the ingestion pipeline
///
/// Recomputed on every matching frame; the latest value for a given
/// (message, signal) pair supersedes the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSignalValue {
    /// CAN ID of the message this signal belongs to
    pub can_id: u32,
    /// Message name from the catalog
    pub message_name: String,
    /// Signal name from the catalog
    pub signal_name: String,
    /// Physical value after factor/offset scaling
    pub value: f64,
    /// Raw value before scaling (sign-extended, useful for debugging)
    pub raw_value: i64,
    /// Engineering unit (e.g., "km/h", "degC", "V")
    pub unit: Option<String>,
    /// Label from the signal's value-description table, if one matches
    pub value_description: Option<String>,
    /// Timestamp of the frame this value was decoded from (nanoseconds)
    pub timestamp_ns: u64,
    /// Advisory minimum from the signal definition (not enforced)
    pub min: f64,
    /// Advisory maximum from the signal definition (not enforced)
    pub max: f64,
}

impl DecodedSignalValue {
    /// History-buffer key for this value: `"{canId}_{signalName}"`
    pub fn sample_key(&self) -> String {
        sample_key(self.can_id, &self.signal_name)
    }

    /// Frame timestamp as DateTime<Utc>
    pub fn timestamp(&self) -> Timestamp {
        let secs = (self.timestamp_ns / 1_000_000_000) as i64;
        let nsecs = (self.timestamp_ns % 1_000_000_000) as u32;
        DateTime::from_timestamp(secs, nsecs).unwrap_or_else(Utc::now)
    }
}

/// Build the history-buffer key for a (message, signal) pair
pub fn sample_key(can_id: u32, signal_name: &str) -> String {
    format!("{}_{}", can_id, signal_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timestamp_conversion() {
        let frame = RawFrame::new(1_700_000_000_123_456_789, 0x123, vec![0xAB]);
        let ts = frame.timestamp();
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert_eq!(ts.timestamp_subsec_nanos(), 123_456_789);
        assert_eq!(frame.dlc(), 1);
    }

    #[test]
    fn test_sample_key_format() {
        assert_eq!(sample_key(0x123, "EngineSpeed"), "291_EngineSpeed");
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(format!("{}", Direction::Rx), "Rx");
        assert_eq!(format!("{}", Direction::Tx), "Tx");
    }
}
