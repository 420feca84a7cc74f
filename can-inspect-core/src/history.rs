//! Signal history buffer
//!
//! Bounded per-key time series feeding live signal graphs. Keys are
//! `"{canId}_{signalName}"` strings (see [`crate::types::sample_key`]).
//!
//! This is the one piece of the core shared between the ingestion thread
//! (writer) and a UI/consumer thread (reader). One mutex guards the whole
//! keyed collection for every operation, so a reader can never observe a
//! buffer mid-resize. All operations are short and bounded.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

/// One time-series point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    /// Sample timestamp in nanoseconds since epoch
    pub timestamp_ns: u64,
    /// Physical signal value
    pub value: f64,
}

/// Keyed FIFO history of signal samples, bounded per key
pub struct SignalHistory {
    buffers: Mutex<HashMap<String, VecDeque<HistorySample>>>,
    capacity: usize,
}

impl SignalHistory {
    /// Default per-key sample capacity
    pub const DEFAULT_CAPACITY: usize = 2000;

    /// Create a history buffer with the default per-key capacity
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a history buffer holding at most `capacity` samples per key
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffers: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Per-key sample capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a sample, evicting the oldest if the key is at capacity
    pub fn add_sample(&self, key: &str, timestamp_ns: u64, value: f64) {
        let mut buffers = self.lock();
        let buffer = buffers
            .entry(key.to_string())
            .or_insert_with(|| VecDeque::with_capacity(16));
        buffer.push_back(HistorySample { timestamp_ns, value });
        while buffer.len() > self.capacity {
            buffer.pop_front();
        }
    }

    /// Snapshot copy of one key's samples in temporal order (not a live view)
    pub fn get_samples(&self, key: &str) -> Vec<HistorySample> {
        self.lock()
            .get(key)
            .map(|buffer| buffer.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of samples currently buffered for a key
    pub fn len(&self, key: &str) -> usize {
        self.lock().get(key).map(VecDeque::len).unwrap_or(0)
    }

    /// True if no key holds any samples
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// All keys with at least one sample, sorted for stable output
    pub fn available_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Remove every buffered sample
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Remove one key's buffer
    pub fn clear_signal(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Lock the buffer collection, recovering from poisoning
    ///
    /// Every critical section is a short bounded container operation, so a
    /// poisoned map is still structurally valid.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, VecDeque<HistorySample>>> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SignalHistory {
    fn default() -> Self {
        Self::new()
    }
}
