//! Multi-frame transport reconstruction (ISO-TP style)
//!
//! Classifies transport frames (single / first / consecutive / flow control)
//! from the top nibble of byte 0 and reassembles segmented payloads of up to
//! 4095 bytes with an explicit state machine. The reassembler works over an
//! already-collected batch of frames for one arbitration ID; pairing the
//! resulting payloads with requests, and timing out stalled exchanges, is the
//! caller's concern.
//!
//! Nothing here raises an error: orphan and out-of-sequence frames are
//! dropped, and interrupted assemblies are emitted with `is_complete = false`
//! so the caller still sees what arrived.

use crate::types::RawFrame;

/// Transport frame kind, from the top nibble of byte 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Single frame - complete payload in one frame (nibble 0)
    Single,
    /// First frame of a segmented payload (nibble 1)
    First,
    /// Consecutive frame carrying a payload segment (nibble 2)
    Consecutive,
    /// Flow control frame - pacing only, no payload (nibble 3)
    FlowControl,
    /// Not a recognized transport frame
    Unknown,
}

impl FrameKind {
    /// Classify a frame from its first byte
    pub fn classify(data: &[u8]) -> FrameKind {
        match data.first().map(|b| b >> 4) {
            Some(0x0) => FrameKind::Single,
            Some(0x1) => FrameKind::First,
            Some(0x2) => FrameKind::Consecutive,
            Some(0x3) => FrameKind::FlowControl,
            _ => FrameKind::Unknown,
        }
    }
}

/// Structural sanity check for a candidate transport frame
///
/// Used when scanning arbitrary bus traffic for transport exchanges, to cut
/// down false positives from ordinary frames whose first byte happens to
/// look like a transport header:
/// - Single: length nibble in 1..=7 and the frame holds more bytes than that
/// - First: 12-bit length field must exceed 7 (shorter payloads would have
///   been a single frame)
/// - Consecutive: at least one payload byte after the sequence byte
/// - Flow control: flow status nibble must be 0 (CTS), 1 (Wait), or 2
///   (Overflow)
pub fn is_plausible_frame(data: &[u8]) -> bool {
    match FrameKind::classify(data) {
        FrameKind::Single => {
            let length = (data[0] & 0x0F) as usize;
            (1..=7).contains(&length) && data.len() > length
        }
        FrameKind::First => {
            if data.len() < 2 {
                return false;
            }
            let length = ((data[0] as usize & 0x0F) << 8) | data[1] as usize;
            length > 7
        }
        FrameKind::Consecutive => data.len() >= 2,
        FrameKind::FlowControl => data[0] & 0x0F <= 2,
        FrameKind::Unknown => false,
    }
}

/// A reassembled transport payload, complete or aborted
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledMessage {
    /// Arbitration ID the payload was carried on
    pub can_id: u32,
    /// Timestamp of the frame that started the assembly (nanoseconds)
    pub start_timestamp_ns: u64,
    /// Reassembled payload, trimmed to the declared length
    pub payload: Vec<u8>,
    /// Every frame that contributed to this assembly, in order
    pub frames: Vec<RawFrame>,
    /// True if the declared length was fully accumulated
    pub is_complete: bool,
    /// Payload length declared by the single/first frame
    pub expected_length: usize,
    /// Bytes actually delivered: min(accumulated, expected)
    pub actual_length: usize,
}

/// In-progress assembly between a first frame and its completion or abort
struct PendingAssembly {
    can_id: u32,
    expected_length: usize,
    payload: Vec<u8>,
    next_sequence: u8,
    frames: Vec<RawFrame>,
    start_timestamp_ns: u64,
}

impl PendingAssembly {
    fn start(frame: &RawFrame, expected_length: usize) -> Self {
        Self {
            can_id: frame.can_id,
            expected_length,
            payload: frame.data.get(2..).unwrap_or_default().to_vec(),
            next_sequence: 1,
            frames: vec![frame.clone()],
            start_timestamp_ns: frame.timestamp_ns,
        }
    }

    fn finalize(mut self) -> AssembledMessage {
        let actual_length = self.payload.len().min(self.expected_length);
        let is_complete = self.payload.len() >= self.expected_length;
        self.payload.truncate(actual_length);
        AssembledMessage {
            can_id: self.can_id,
            start_timestamp_ns: self.start_timestamp_ns,
            payload: self.payload,
            frames: self.frames,
            is_complete,
            expected_length: self.expected_length,
            actual_length,
        }
    }
}

/// Transport reassembler - combines a batch of frames into payloads
///
/// Expects all frames to share one arbitration ID (the caller pre-filters);
/// ordering by timestamp is handled here.
pub struct Reassembler;

impl Reassembler {
    /// Reassemble transport payloads from a batch of same-ID frames
    pub fn reassemble(frames: &[RawFrame]) -> Vec<AssembledMessage> {
        let mut sorted: Vec<&RawFrame> = frames.iter().collect();
        sorted.sort_by_key(|f| f.timestamp_ns);

        let mut assembled = Vec::new();
        let mut pending: Option<PendingAssembly> = None;

        for frame in sorted {
            match FrameKind::classify(&frame.data) {
                FrameKind::Single => {
                    // A new exchange interrupts whatever was accumulating
                    if let Some(p) = pending.take() {
                        assembled.push(p.finalize());
                    }
                    assembled.push(Self::assemble_single(frame));
                }
                FrameKind::First => {
                    if let Some(p) = pending.take() {
                        assembled.push(p.finalize());
                    }
                    if frame.data.len() < 2 {
                        log::debug!("First frame on 0x{:X} too short, ignored", frame.can_id);
                        continue;
                    }
                    let expected =
                        ((frame.data[0] as usize & 0x0F) << 8) | frame.data[1] as usize;
                    pending = Some(PendingAssembly::start(frame, expected));
                }
                FrameKind::Consecutive => {
                    let Some(mut p) = pending.take() else {
                        log::debug!("Orphan consecutive frame on 0x{:X}, dropped", frame.can_id);
                        continue;
                    };
                    let sequence = frame.data[0] & 0x0F;
                    if sequence != p.next_sequence {
                        log::debug!(
                            "Sequence gap on 0x{:X}: expected {}, got {} - aborting assembly",
                            frame.can_id,
                            p.next_sequence,
                            sequence
                        );
                        assembled.push(p.finalize());
                        continue;
                    }
                    p.payload.extend_from_slice(frame.data.get(1..).unwrap_or_default());
                    p.next_sequence = (p.next_sequence + 1) % 16;
                    p.frames.push(frame.clone());
                    if p.payload.len() >= p.expected_length {
                        assembled.push(p.finalize());
                    } else {
                        pending = Some(p);
                    }
                }
                FrameKind::FlowControl => {
                    // Pacing only; kept on the frame list for audit
                    if let Some(p) = pending.as_mut() {
                        p.frames.push(frame.clone());
                    }
                }
                FrameKind::Unknown => {}
            }
        }

        // End of batch: whatever is still pending was never completed
        if let Some(p) = pending.take() {
            assembled.push(p.finalize());
        }

        assembled
    }

    /// Build the one-frame message for a single frame
    fn assemble_single(frame: &RawFrame) -> AssembledMessage {
        let length = frame.data.first().map(|b| (b & 0x0F) as usize).unwrap_or(0);
        let end = (1 + length).min(frame.data.len());
        let payload = frame.data.get(1..end).unwrap_or_default().to_vec();
        let actual_length = payload.len();

        AssembledMessage {
            can_id: frame.can_id,
            start_timestamp_ns: frame.timestamp_ns,
            payload,
            frames: vec![frame.clone()],
            is_complete: actual_length >= length,
            expected_length: length,
            actual_length,
        }
    }
}
