//! Pipeline configuration
//!
//! The minimal knobs the ingestion pipeline needs. Anything beyond this
//! (device setup, catalog storage, UI preferences) lives in the application
//! layer.

use serde::{Deserialize, Serialize};

/// Configuration for the ingestion pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Whether to decode signals (false = raw tracking only)
    #[serde(default = "default_true")]
    pub decode_signals: bool,

    /// Per-signal history buffer capacity
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Bound on distinct arbitration IDs tracked by the sniffer
    #[serde(default = "default_max_tracked_ids")]
    pub max_tracked_ids: usize,

    /// Optional: only process frames from these CAN channels
    #[serde(default)]
    pub channel_filter: Option<Vec<u8>>,

    /// Optional: only process these specific CAN IDs
    #[serde(default)]
    pub message_filter: Option<Vec<u32>>,
}

fn default_true() -> bool {
    true
}

fn default_history_capacity() -> usize {
    crate::history::SignalHistory::DEFAULT_CAPACITY
}

fn default_max_tracked_ids() -> usize {
    crate::sniffer::ChangeTracker::DEFAULT_MAX_TRACKED_IDS
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            decode_signals: true,
            history_capacity: default_history_capacity(),
            max_tracked_ids: default_max_tracked_ids(),
            channel_filter: None,
            message_filter: None,
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: enable or disable signal decoding
    pub fn with_signal_decoding(mut self, enabled: bool) -> Self {
        self.decode_signals = enabled;
        self
    }

    /// Builder method: set the per-signal history capacity
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Builder method: set the sniffer retention bound
    pub fn with_max_tracked_ids(mut self, max: usize) -> Self {
        self.max_tracked_ids = max;
        self
    }

    /// Builder method: set channel filter
    pub fn with_channel_filter(mut self, channels: Vec<u8>) -> Self {
        self.channel_filter = Some(channels);
        self
    }

    /// Builder method: set message filter
    pub fn with_message_filter(mut self, messages: Vec<u32>) -> Self {
        self.message_filter = Some(messages);
        self
    }

    /// Check if a channel should be processed
    pub fn should_process_channel(&self, channel: u8) -> bool {
        match &self.channel_filter {
            Some(channels) => channels.contains(&channel),
            None => true,
        }
    }

    /// Check if a CAN ID should be processed
    pub fn should_process_message(&self, can_id: u32) -> bool {
        match &self.message_filter {
            Some(messages) => messages.contains(&can_id),
            None => true,
        }
    }

    /// Check if a frame passes both filters
    pub fn should_process_frame(&self, channel: u8, can_id: u32) -> bool {
        self.should_process_channel(channel) && self.should_process_message(can_id)
    }
}
