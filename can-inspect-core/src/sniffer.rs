//! Change-tracking ("sniffer") engine
//!
//! Diffs successive frames per arbitration ID for live bus inspection: which
//! bytes changed, when, and in which numeric direction. A persistent per-bit
//! "notch" bitmap lets a consumer acknowledge the differences currently on
//! screen and mute them until they change again.
//!
//! Not internally synchronized - updates must come from the single ingestion
//! context. Consumers take cloned snapshots.

use crate::types::RawFrame;
use std::collections::HashMap;

/// Per-ID change-tracking state
///
/// Byte snapshots are fixed 8-slot arrays, zero-padded past the frame's DLC.
/// Notch indices use MSB-first numbering within each byte: bit 0 of the
/// bitmap is the most significant bit of byte 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    /// Arbitration ID this record tracks
    pub can_id: u32,
    /// Most recent data snapshot
    pub current: [u8; 8],
    /// Snapshot before the most recent update
    pub previous: [u8; 8],
    /// DLC of the most recent frame
    pub dlc: usize,
    /// Per-byte timestamp of the last observed change (nanoseconds)
    pub last_change_ns: [u64; 8],
    /// Per-byte direction of the last change: +1 grew, -1 shrank, 0 never
    pub direction: [i8; 8],
    /// Per-bit acknowledged-change flags, MSB-first within each byte
    pub notched: [bool; 64],
    /// Number of updates applied; cheap change-detection proxy for consumers
    pub update_count: u64,
}

impl ChangeRecord {
    fn new(can_id: u32) -> Self {
        Self {
            can_id,
            current: [0; 8],
            previous: [0; 8],
            dlc: 0,
            last_change_ns: [0; 8],
            direction: [0; 8],
            notched: [false; 64],
            update_count: 0,
        }
    }

    /// True if the bit at (byte_index, MSB-first bit offset) is notched
    pub fn is_notched(&self, byte_index: usize, msb_offset: usize) -> bool {
        self.notched[byte_index * 8 + msb_offset]
    }
}

/// Change-tracking engine over all observed arbitration IDs
///
/// Retention is bounded: when more than `max_tracked_ids` distinct IDs have
/// been seen, the least recently updated record is evicted.
pub struct ChangeTracker {
    records: HashMap<u32, ChangeRecord>,
    /// Eviction ordering: id -> tick of its last update
    last_touched: HashMap<u32, u64>,
    tick: u64,
    max_tracked_ids: usize,
}

impl ChangeTracker {
    /// Default bound on the number of tracked arbitration IDs
    pub const DEFAULT_MAX_TRACKED_IDS: usize = 1024;

    /// Create a tracker with the default retention bound
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_MAX_TRACKED_IDS)
    }

    /// Create a tracker bounded to `max_tracked_ids` distinct IDs
    pub fn with_capacity(max_tracked_ids: usize) -> Self {
        Self {
            records: HashMap::new(),
            last_touched: HashMap::new(),
            tick: 0,
            max_tracked_ids: max_tracked_ids.max(1),
        }
    }

    /// Apply one frame to the record for its arbitration ID
    pub fn update(&mut self, frame: &RawFrame) {
        self.tick += 1;
        if !self.records.contains_key(&frame.can_id) && self.records.len() >= self.max_tracked_ids {
            self.evict_stalest();
        }

        let record = self
            .records
            .entry(frame.can_id)
            .or_insert_with(|| ChangeRecord::new(frame.can_id));
        self.last_touched.insert(frame.can_id, self.tick);

        let mut incoming = [0u8; 8];
        let dlc = frame.data.len().min(8);
        incoming[..dlc].copy_from_slice(&frame.data[..dlc]);

        record.previous = record.current;
        for i in 0..8 {
            let old = record.previous[i];
            let new = incoming[i];
            if new != old {
                record.last_change_ns[i] = frame.timestamp_ns;
                record.direction[i] = if new > old { 1 } else { -1 };
            }
            // Equal bytes keep their prior timestamp and direction
        }
        record.current = incoming;
        record.dlc = dlc;
        record.update_count += 1;
    }

    /// Freeze the currently differing bits of every record as acknowledged
    ///
    /// XORs each record's previous and current snapshots and sets the notch
    /// flag for every differing bit. Idempotent until the next update.
    pub fn notch(&mut self) {
        for record in self.records.values_mut() {
            for byte_idx in 0..8 {
                let diff = record.previous[byte_idx] ^ record.current[byte_idx];
                if diff == 0 {
                    continue;
                }
                for bit in 0..8u8 {
                    if diff & (1 << bit) != 0 {
                        record.notched[byte_idx * 8 + (7 - bit as usize)] = true;
                    }
                }
            }
        }
    }

    /// Clear every notch flag on every record
    pub fn un_notch(&mut self) {
        for record in self.records.values_mut() {
            record.notched = [false; 64];
        }
    }

    /// The record for one arbitration ID, if it has been observed
    pub fn record(&self, can_id: u32) -> Option<&ChangeRecord> {
        self.records.get(&can_id)
    }

    /// All tracked records
    pub fn records(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.values()
    }

    /// Number of tracked arbitration IDs
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no frames have been tracked yet
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Cloned snapshot of all records for cross-thread consumers
    pub fn snapshot(&self) -> HashMap<u32, ChangeRecord> {
        self.records.clone()
    }

    /// Drop all tracked state
    pub fn clear(&mut self) {
        self.records.clear();
        self.last_touched.clear();
    }

    fn evict_stalest(&mut self) {
        let stalest = self
            .last_touched
            .iter()
            .min_by_key(|(_, &tick)| tick)
            .map(|(&id, _)| id);
        if let Some(id) = stalest {
            log::trace!("Evicting change-tracking record for 0x{:X}", id);
            self.records.remove(&id);
            self.last_touched.remove(&id);
        }
    }
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(timestamp_ns: u64, can_id: u32, data: &[u8]) -> RawFrame {
        RawFrame::new(timestamp_ns, can_id, data.to_vec())
    }

    #[test]
    fn test_first_update_diffs_against_zeros() {
        let mut tracker = ChangeTracker::new();
        tracker.update(&frame(100, 0x123, &[0x01, 0x00, 0xFF]));

        let record = tracker.record(0x123).unwrap();
        assert_eq!(record.update_count, 1);
        assert_eq!(record.dlc, 3);
        assert_eq!(record.current[..3], [0x01, 0x00, 0xFF]);
        // Bytes 0 and 2 changed from the zero baseline
        assert_eq!(record.direction[0], 1);
        assert_eq!(record.last_change_ns[0], 100);
        assert_eq!(record.direction[1], 0);
        assert_eq!(record.last_change_ns[1], 0);
        assert_eq!(record.direction[2], 1);
    }

    #[test]
    fn test_direction_and_timestamp_per_byte() {
        let mut tracker = ChangeTracker::new();
        tracker.update(&frame(100, 0x123, &[0x10, 0x20, 0x30]));
        tracker.update(&frame(200, 0x123, &[0x05, 0x20, 0x40]));

        let record = tracker.record(0x123).unwrap();
        assert_eq!(record.update_count, 2);
        // Byte 0 shrank, byte 1 untouched (keeps first-update state), byte 2 grew
        assert_eq!(record.direction[0], -1);
        assert_eq!(record.last_change_ns[0], 200);
        assert_eq!(record.direction[1], 1);
        assert_eq!(record.last_change_ns[1], 100);
        assert_eq!(record.direction[2], 1);
        assert_eq!(record.last_change_ns[2], 200);
        assert_eq!(record.previous[..3], [0x10, 0x20, 0x30]);
    }

    #[test]
    fn test_notch_msb_first_numbering() {
        let mut tracker = ChangeTracker::new();
        tracker.update(&frame(100, 0x123, &[0x00]));
        tracker.update(&frame(200, 0x123, &[0x81])); // MSB and LSB of byte 0 flipped
        tracker.notch();

        let record = tracker.record(0x123).unwrap();
        // MSB of byte 0 -> notch index 0; LSB -> notch index 7
        assert!(record.is_notched(0, 0));
        assert!(record.is_notched(0, 7));
        assert!(!record.is_notched(0, 1));
        assert!(!record.is_notched(1, 0));
    }

    #[test]
    fn test_notch_idempotent() {
        let mut tracker = ChangeTracker::new();
        tracker.update(&frame(100, 0x123, &[0x00, 0xFF]));
        tracker.update(&frame(200, 0x123, &[0x0F, 0xFF]));
        tracker.notch();
        let first = tracker.record(0x123).unwrap().notched;
        tracker.notch();
        assert_eq!(tracker.record(0x123).unwrap().notched, first);
    }

    #[test]
    fn test_notch_persists_across_updates() {
        let mut tracker = ChangeTracker::new();
        tracker.update(&frame(100, 0x123, &[0x00]));
        tracker.update(&frame(200, 0x123, &[0x01]));
        tracker.notch();
        // Further updates leave existing notches in place
        tracker.update(&frame(300, 0x123, &[0x01]));
        assert!(tracker.record(0x123).unwrap().is_notched(0, 7));

        tracker.un_notch();
        assert!(!tracker.record(0x123).unwrap().is_notched(0, 7));
    }

    #[test]
    fn test_retention_evicts_least_recently_updated() {
        let mut tracker = ChangeTracker::with_capacity(2);
        tracker.update(&frame(100, 0x100, &[1]));
        tracker.update(&frame(200, 0x200, &[2]));
        tracker.update(&frame(300, 0x100, &[3])); // refresh 0x100
        tracker.update(&frame(400, 0x300, &[4])); // evicts 0x200

        assert_eq!(tracker.len(), 2);
        assert!(tracker.record(0x100).is_some());
        assert!(tracker.record(0x200).is_none());
        assert!(tracker.record(0x300).is_some());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut tracker = ChangeTracker::new();
        tracker.update(&frame(100, 0x123, &[0x01]));
        let snapshot = tracker.snapshot();
        tracker.update(&frame(200, 0x123, &[0x02]));
        assert_eq!(snapshot[&0x123].update_count, 1);
        assert_eq!(tracker.record(0x123).unwrap().update_count, 2);
    }
}
