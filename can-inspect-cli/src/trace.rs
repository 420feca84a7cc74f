//! Candump-style text trace parsing
//!
//! Reads the line format produced by `candump -L`:
//!
//! ```text
//! (1699999999.123456) can0 123#DEADBEEF
//! (1699999999.223456) can1 18FF0102#0102030405060708
//! (1699999999.323456) can0 456#R
//! ```
//!
//! Arbitration IDs with more than 3 hex digits are treated as extended
//! (29-bit). `R` in place of data marks a remote frame. Blank lines and
//! lines starting with `#` are skipped.

use anyhow::{bail, Context, Result};
use can_inspect_core::RawFrame;
use std::fs;
use std::path::Path;

/// Parse a trace file into frames
pub fn parse_trace_file(path: &Path) -> Result<Vec<RawFrame>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read trace file: {:?}", path))?;

    let mut frames = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let frame = parse_trace_line(line)
            .with_context(|| format!("{:?}:{}: bad trace line", path, line_no + 1))?;
        frames.push(frame);
    }

    log::info!("Parsed {} frames from {:?}", frames.len(), path);
    Ok(frames)
}

/// Parse one `(timestamp) iface id#data` line
pub fn parse_trace_line(line: &str) -> Result<RawFrame> {
    let mut parts = line.split_whitespace();

    let timestamp = parts.next().context("missing timestamp field")?;
    let timestamp = timestamp
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .context("timestamp must be parenthesized")?;
    let timestamp_ns = parse_timestamp_ns(timestamp)?;

    let iface = parts.next().context("missing interface field")?;
    let channel = iface
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse::<u8>()
        .unwrap_or(0);

    let id_and_data = parts.next().context("missing id#data field")?;
    let (id_part, data_part) = id_and_data
        .split_once('#')
        .context("id and data must be separated by '#'")?;

    let can_id = u32::from_str_radix(id_part, 16)
        .with_context(|| format!("bad CAN ID: {}", id_part))?;
    let is_extended = id_part.len() > 3 || can_id > 0x7FF;

    let is_remote = data_part.eq_ignore_ascii_case("R");
    let data = if is_remote {
        Vec::new()
    } else {
        parse_hex_bytes(data_part)?
    };
    if data.len() > 8 {
        bail!("frame data exceeds 8 bytes: {}", data_part);
    }

    Ok(RawFrame {
        timestamp_ns,
        channel,
        can_id,
        data,
        is_extended,
        is_remote,
        direction: can_inspect_core::Direction::Rx,
    })
}

/// Parse `seconds.micros` into nanoseconds
fn parse_timestamp_ns(text: &str) -> Result<u64> {
    let (secs, frac) = text.split_once('.').unwrap_or((text, "0"));
    let secs: u64 = secs.parse().with_context(|| format!("bad seconds: {}", secs))?;
    // Normalize the fractional part to 9 digits
    let frac = format!("{:0<9.9}", frac);
    let nanos: u64 = frac.parse().with_context(|| format!("bad fraction: {}", frac))?;
    Ok(secs * 1_000_000_000 + nanos)
}

/// Parse a contiguous hex string into bytes
fn parse_hex_bytes(text: &str) -> Result<Vec<u8>> {
    if text.len() % 2 != 0 {
        bail!("odd-length hex data: {}", text);
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&text[i..i + 2], 16)
                .with_context(|| format!("bad hex byte in: {}", text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_standard_frame() {
        let frame = parse_trace_line("(1699999999.123456) can0 123#DEADBEEF").unwrap();
        assert_eq!(frame.timestamp_ns, 1_699_999_999_123_456_000);
        assert_eq!(frame.channel, 0);
        assert_eq!(frame.can_id, 0x123);
        assert_eq!(frame.data, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(!frame.is_extended);
        assert!(!frame.is_remote);
    }

    #[test]
    fn test_parse_extended_and_remote() {
        let frame = parse_trace_line("(1.0) can1 18FF0102#0102030405060708").unwrap();
        assert!(frame.is_extended);
        assert_eq!(frame.channel, 1);
        assert_eq!(frame.data.len(), 8);

        let frame = parse_trace_line("(1.5) can0 456#R").unwrap();
        assert!(frame.is_remote);
        assert!(frame.data.is_empty());
        assert_eq!(frame.timestamp_ns, 1_500_000_000);
    }

    #[test]
    fn test_parse_empty_data() {
        let frame = parse_trace_line("(2.0) can0 123#").unwrap();
        assert!(frame.data.is_empty());
        assert!(!frame.is_remote);
    }

    #[test]
    fn test_reject_malformed_lines() {
        assert!(parse_trace_line("123#DEADBEEF").is_err());
        assert!(parse_trace_line("(1.0) can0 123DEADBEEF").is_err());
        assert!(parse_trace_line("(1.0) can0 123#DEADBEE").is_err()); // odd hex
        assert!(parse_trace_line("(1.0) can0 123#00112233445566778899").is_err()); // >8 bytes
        assert!(parse_trace_line("(1.0) can0 XYZ#00").is_err());
    }

    #[test]
    fn test_parse_trace_file_skips_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# candump log").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "(1.0) can0 123#01").unwrap();
        writeln!(file, "(2.0) can0 124#02").unwrap();

        let frames = parse_trace_file(file.path()).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].can_id, 0x124);
    }
}
