//! Plain-text report rendering
//!
//! Formats the pipeline's snapshots for the terminal: latest decoded values,
//! the sniffer change table, and reassembled transport payloads.

use can_inspect_core::{AssembledMessage, ChangeRecord, DecodedSignalValue};
use std::collections::HashMap;

/// Render the latest decoded value per signal, sorted by message and name
pub fn render_latest_values(
    latest: &HashMap<String, DecodedSignalValue>,
    max_rows: usize,
) -> String {
    let mut values: Vec<&DecodedSignalValue> = latest.values().collect();
    values.sort_by(|a, b| {
        a.can_id
            .cmp(&b.can_id)
            .then_with(|| a.signal_name.cmp(&b.signal_name))
    });
    if max_rows > 0 {
        values.truncate(max_rows);
    }

    let mut out = String::new();
    out.push_str("Latest decoded values:\n");
    if values.is_empty() {
        out.push_str("  (none)\n");
        return out;
    }
    for v in values {
        let unit = v.unit.as_deref().unwrap_or("");
        let label = v
            .value_description
            .as_deref()
            .map(|d| format!(" [{}]", d))
            .unwrap_or_default();
        out.push_str(&format!(
            "  0x{:03X} {:>24}.{:<20} {:>12.3} {}{}\n",
            v.can_id, v.message_name, v.signal_name, v.value, unit, label
        ));
    }
    out
}

/// Render the sniffer change table: one row per tracked ID
pub fn render_sniffer_table(records: &HashMap<u32, ChangeRecord>) -> String {
    let mut ids: Vec<u32> = records.keys().copied().collect();
    ids.sort_unstable();

    let mut out = String::new();
    out.push_str("Sniffer change table:\n");
    out.push_str("  ID     updates  data (direction per byte)\n");
    for id in ids {
        let record = &records[&id];
        let bytes: Vec<String> = (0..record.dlc)
            .map(|i| {
                let arrow = match record.direction[i] {
                    1 => "+",
                    -1 => "-",
                    _ => " ",
                };
                format!("{:02X}{}", record.current[i], arrow)
            })
            .collect();
        out.push_str(&format!(
            "  0x{:03X} {:>8}  {}\n",
            record.can_id,
            record.update_count,
            bytes.join(" ")
        ));
    }
    out
}

/// Render reassembled transport payloads for one arbitration ID
pub fn render_assembled(can_id: u32, assembled: &[AssembledMessage]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Transport payloads on 0x{:03X}: {} message(s)\n",
        can_id,
        assembled.len()
    ));
    for (i, msg) in assembled.iter().enumerate() {
        let status = if msg.is_complete { "complete" } else { "INCOMPLETE" };
        let hex: Vec<String> = msg.payload.iter().map(|b| format!("{:02X}", b)).collect();
        out.push_str(&format!(
            "  #{} {} {}/{} bytes over {} frame(s): {}\n",
            i + 1,
            status,
            msg.actual_length,
            msg.expected_length,
            msg.frames.len(),
            hex.join(" ")
        ));
    }
    out
}
