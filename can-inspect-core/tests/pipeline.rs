//! End-to-end tests: catalog -> pipeline -> history/sniffer, plus transport
//! reassembly over a captured batch.

use can_inspect_core::{
    ByteOrder, ChangeTracker, FrameKind, FramePipeline, MessageCatalog, MessageDefinition,
    PipelineConfig, RawFrame, Reassembler, SignalDefinition, ValueKind,
};
use std::sync::Arc;

fn demo_catalog() -> Arc<MessageCatalog> {
    let mut speed = SignalDefinition::new("VehicleSpeed", 0, 16, ByteOrder::LittleEndian);
    speed.factor = 0.1;
    speed.unit = Some("km/h".to_string());
    speed.max = 300.0;

    let mut temp = SignalDefinition::new("CoolantTemp", 23, 8, ByteOrder::BigEndian);
    temp.value_kind = ValueKind::Signed;
    temp.offset = 0.0;
    temp.unit = Some("degC".to_string());

    let vehicle = MessageDefinition {
        id: 0x100,
        name: "VehicleStatus".to_string(),
        length: 8,
        is_extended: false,
        signals: vec![speed, temp],
    };

    Arc::new(MessageCatalog::from_messages(vec![vehicle]).unwrap())
}

#[test]
fn full_ingestion_path() {
    let config = PipelineConfig::new().with_history_capacity(4);
    let mut pipeline = FramePipeline::with_config(config);
    pipeline.set_catalog(Some(demo_catalog()));

    // Speed 0x2710 * 0.1 = 1000.0, CoolantTemp byte 2 = 0xFF -> -1
    let decoded = pipeline.process_frame(&RawFrame::new(
        1_000,
        0x100,
        vec![0x10, 0x27, 0xFF, 0, 0, 0, 0, 0],
    ));
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[0].value, 1000.0);
    assert_eq!(decoded[1].value, -1.0);

    // Unknown ID: tracked but not decoded
    let decoded = pipeline.process_frame(&RawFrame::new(2_000, 0x7FF, vec![0xAA]));
    assert!(decoded.is_empty());
    assert!(pipeline.tracker().record(0x7FF).is_some());

    // History capacity of 4 evicts the oldest speed samples
    for i in 0..6u64 {
        pipeline.process_frame(&RawFrame::new(
            3_000 + i,
            0x100,
            vec![i as u8, 0, 0, 0, 0, 0, 0, 0],
        ));
    }
    let history = pipeline.history();
    let samples = history.get_samples("256_VehicleSpeed");
    assert_eq!(samples.len(), 4);
    assert_eq!(samples[0].timestamp_ns, 3_002);
    assert_eq!(samples[3].timestamp_ns, 3_005);

    // Latest-value snapshot reflects the final frame
    let latest = pipeline.latest_values();
    assert_eq!(latest["256_VehicleSpeed"].value, 0.5);
    assert_eq!(latest["256_VehicleSpeed"].unit.as_deref(), Some("km/h"));
}

#[test]
fn sniffer_notch_cycle_over_pipeline() {
    let mut pipeline = FramePipeline::new();
    pipeline.process_frame(&RawFrame::new(1, 0x200, vec![0x00, 0x00]));
    pipeline.process_frame(&RawFrame::new(2, 0x200, vec![0x80, 0x00]));

    pipeline.tracker_mut().notch();
    let record = pipeline.tracker().record(0x200).unwrap();
    assert!(record.is_notched(0, 0)); // MSB of byte 0
    assert_eq!(record.direction[0], 1);

    pipeline.tracker_mut().un_notch();
    assert!(!pipeline.tracker().record(0x200).unwrap().is_notched(0, 0));
}

#[test]
fn diagnostic_exchange_reassembly() {
    // A UDS-style response captured on one ID: FF declaring 20 bytes, two
    // CFs, then an unrelated single-frame exchange.
    let frames = vec![
        RawFrame::new(10, 0x7E8, vec![0x10, 0x14, 1, 2, 3, 4, 5, 6]),
        RawFrame::new(20, 0x7E8, vec![0x21, 7, 8, 9, 10, 11, 12, 13]),
        RawFrame::new(30, 0x7E8, vec![0x22, 14, 15, 16, 17, 18, 19, 20]),
        RawFrame::new(40, 0x7E8, vec![0x02, 0x50, 0x01, 0, 0, 0, 0, 0]),
    ];

    assert!(frames
        .iter()
        .all(|f| FrameKind::classify(&f.data) != FrameKind::Unknown));

    let assembled = Reassembler::reassemble(&frames);
    assert_eq!(assembled.len(), 2);

    let multi = &assembled[0];
    assert!(multi.is_complete);
    assert_eq!(multi.expected_length, 20);
    assert_eq!(multi.payload, (1..=20).collect::<Vec<u8>>());

    let single = &assembled[1];
    assert!(single.is_complete);
    assert_eq!(single.payload, vec![0x50, 0x01]);
}

#[test]
fn tracker_bounded_retention() {
    let mut tracker = ChangeTracker::with_capacity(8);
    for id in 0..32u32 {
        tracker.update(&RawFrame::new(id as u64, id, vec![id as u8]));
    }
    assert_eq!(tracker.len(), 8);
    // The most recently updated IDs survive
    assert!(tracker.record(31).is_some());
    assert!(tracker.record(0).is_none());
}
