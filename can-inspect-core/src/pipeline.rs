//! Frame ingestion pipeline
//!
//! Ties the per-frame path together: catalog lookup, signal decoding,
//! history buffering, and change tracking. Frames arrive one at a time from
//! a single ingestion context; decoded values are returned per frame as an
//! explicit update batch, and consumers on other threads pull immutable
//! snapshots (history samples, sniffer records, latest values) instead of
//! sharing any mutable map.

use crate::catalog::MessageCatalog;
use crate::codec::SignalCodec;
use crate::config::PipelineConfig;
use crate::history::SignalHistory;
use crate::sniffer::ChangeTracker;
use crate::types::{DecodedSignalValue, RawFrame};
use std::collections::HashMap;
use std::sync::Arc;

/// The frame ingestion pipeline
pub struct FramePipeline {
    /// Current catalog snapshot; absent means "no signal decoding"
    catalog: Option<Arc<MessageCatalog>>,
    tracker: ChangeTracker,
    history: Arc<SignalHistory>,
    latest: HashMap<String, DecodedSignalValue>,
    config: PipelineConfig,
    frames_processed: u64,
}

impl FramePipeline {
    /// Create a pipeline with default configuration and no catalog
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    /// Create a pipeline from a configuration
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            catalog: None,
            tracker: ChangeTracker::with_capacity(config.max_tracked_ids),
            history: Arc::new(SignalHistory::with_capacity(config.history_capacity)),
            latest: HashMap::new(),
            config,
            frames_processed: 0,
        }
    }

    /// Replace the catalog snapshot (None disables signal decoding)
    ///
    /// Raw frames keep being tracked by ID either way.
    pub fn set_catalog(&mut self, catalog: Option<Arc<MessageCatalog>>) {
        match &catalog {
            Some(c) => log::info!(
                "Catalog snapshot installed: {} messages, {} signals",
                c.stats().num_messages,
                c.stats().num_signals
            ),
            None => log::info!("Catalog removed, signal decoding disabled"),
        }
        self.catalog = catalog;
    }

    /// The current catalog snapshot
    pub fn catalog(&self) -> Option<&Arc<MessageCatalog>> {
        self.catalog.as_ref()
    }

    /// Process one frame through tracking, decoding, and history
    ///
    /// Returns the decoded signal values for this frame (empty when the
    /// frame is filtered out, decoding is disabled, or no definition
    /// matches its ID).
    pub fn process_frame(&mut self, frame: &RawFrame) -> Vec<DecodedSignalValue> {
        if !self.config.should_process_frame(frame.channel, frame.can_id) {
            log::trace!("Frame 0x{:X} filtered out", frame.can_id);
            return Vec::new();
        }

        self.frames_processed += 1;
        self.tracker.update(frame);

        if !self.config.decode_signals {
            return Vec::new();
        }
        let Some(catalog) = &self.catalog else {
            return Vec::new();
        };
        let Some(message) = catalog.find_message_by_id(frame.can_id) else {
            log::trace!("No definition for CAN ID 0x{:X}", frame.can_id);
            return Vec::new();
        };

        log::debug!("Decoding message {} (ID 0x{:X})", message.name, frame.can_id);
        let decoded = SignalCodec::decode_frame(frame, message);

        for value in &decoded {
            let key = value.sample_key();
            self.history.add_sample(&key, value.timestamp_ns, value.value);
            self.latest.insert(key, value.clone());
        }

        decoded
    }

    /// Shared handle to the history buffer for consumer threads
    pub fn history(&self) -> Arc<SignalHistory> {
        Arc::clone(&self.history)
    }

    /// The change tracker (read access)
    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    /// The change tracker (for notch/un-notch/clear from the ingestion context)
    pub fn tracker_mut(&mut self) -> &mut ChangeTracker {
        &mut self.tracker
    }

    /// Cloned snapshot of the latest value per sample key
    pub fn latest_values(&self) -> HashMap<String, DecodedSignalValue> {
        self.latest.clone()
    }

    /// Number of frames that passed the filters
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }
}

impl Default for FramePipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ByteOrder, MessageDefinition, SignalDefinition};

    fn test_catalog() -> Arc<MessageCatalog> {
        let mut speed = SignalDefinition::new("Speed", 0, 16, ByteOrder::LittleEndian);
        speed.factor = 0.1;
        let message = MessageDefinition {
            id: 0x123,
            name: "Vehicle".to_string(),
            length: 8,
            is_extended: false,
            signals: vec![speed],
        };
        Arc::new(MessageCatalog::from_messages(vec![message]).unwrap())
    }

    #[test]
    fn test_no_catalog_still_tracks() {
        let mut pipeline = FramePipeline::new();
        let decoded = pipeline.process_frame(&RawFrame::new(100, 0x123, vec![0x10, 0x27]));
        assert!(decoded.is_empty());
        assert_eq!(pipeline.frames_processed(), 1);
        assert!(pipeline.tracker().record(0x123).is_some());
    }

    #[test]
    fn test_decode_and_history() {
        let mut pipeline = FramePipeline::new();
        pipeline.set_catalog(Some(test_catalog()));

        let decoded = pipeline.process_frame(&RawFrame::new(100, 0x123, vec![0x10, 0x27]));
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].value, 1000.0);

        let history = pipeline.history();
        let samples = history.get_samples("291_Speed");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 1000.0);

        let latest = pipeline.latest_values();
        assert_eq!(latest["291_Speed"].value, 1000.0);
    }

    #[test]
    fn test_latest_value_superseded() {
        let mut pipeline = FramePipeline::new();
        pipeline.set_catalog(Some(test_catalog()));
        pipeline.process_frame(&RawFrame::new(100, 0x123, vec![0x10, 0x27]));
        pipeline.process_frame(&RawFrame::new(200, 0x123, vec![0x20, 0x4E]));

        let latest = pipeline.latest_values();
        assert_eq!(latest["291_Speed"].value, 2000.0);
        assert_eq!(pipeline.history().len("291_Speed"), 2);
    }

    #[test]
    fn test_catalog_removal_disables_decoding() {
        let mut pipeline = FramePipeline::new();
        pipeline.set_catalog(Some(test_catalog()));
        assert_eq!(
            pipeline
                .process_frame(&RawFrame::new(100, 0x123, vec![0x01, 0x00]))
                .len(),
            1
        );

        pipeline.set_catalog(None);
        assert!(pipeline
            .process_frame(&RawFrame::new(200, 0x123, vec![0x02, 0x00]))
            .is_empty());
        // Raw tracking continues
        assert_eq!(pipeline.tracker().record(0x123).unwrap().update_count, 2);
    }

    #[test]
    fn test_filtered_frame_untouched() {
        let config = PipelineConfig::new().with_message_filter(vec![0x456]);
        let mut pipeline = FramePipeline::with_config(config);
        pipeline.set_catalog(Some(test_catalog()));

        let decoded = pipeline.process_frame(&RawFrame::new(100, 0x123, vec![0x01]));
        assert!(decoded.is_empty());
        assert_eq!(pipeline.frames_processed(), 0);
        assert!(pipeline.tracker().is_empty());
    }
}
