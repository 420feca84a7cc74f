//! Signal codec
//!
//! Extracts and re-encodes arbitrary-width, arbitrary-offset bit fields from
//! classic CAN frame payloads, under both the Intel (little-endian) and
//! Motorola (big-endian) bit-numbering conventions, and applies factor/offset
//! scaling to produce physical values.
//!
//! All functions are pure. Degenerate input resolves to documented defaults:
//! empty frame data decodes to 0.0, bit positions beyond the frame read as
//! zero bits, and raw values wider than the signal are silently masked on
//! encode.

use crate::catalog::{ByteOrder, MessageDefinition, SignalDefinition, ValueKind};
use crate::types::{DecodedSignalValue, RawFrame};

/// Cursor over frame bit positions for one signal field
///
/// Yields `(byte_index, bit_index)` pairs, where `bit_index` is the shift
/// amount within the byte (7 = most significant bit). Little-endian walks
/// bit positions upward across byte boundaries; big-endian walks downward
/// within each byte and wraps to bit 7 of the next byte. Both the decode
/// and encode paths drive this same cursor, so the two byte orders share
/// one traversal definition.
struct BitCursor {
    byte_idx: usize,
    bit_idx: i8,
    order: ByteOrder,
}

impl BitCursor {
    fn new(start_bit: u16, order: ByteOrder) -> Self {
        Self {
            byte_idx: (start_bit / 8) as usize,
            bit_idx: (start_bit % 8) as i8,
            order,
        }
    }
}

impl Iterator for BitCursor {
    type Item = (usize, u8);

    fn next(&mut self) -> Option<Self::Item> {
        let pos = (self.byte_idx, self.bit_idx as u8);
        match self.order {
            ByteOrder::LittleEndian => {
                self.bit_idx += 1;
                if self.bit_idx > 7 {
                    self.bit_idx = 0;
                    self.byte_idx += 1;
                }
            }
            ByteOrder::BigEndian => {
                self.bit_idx -= 1;
                if self.bit_idx < 0 {
                    self.bit_idx = 7;
                    self.byte_idx += 1;
                }
            }
        }
        Some(pos)
    }
}

/// Significance of the i-th bit visited by the cursor within the raw value
///
/// Little-endian reads LSB-first; big-endian reads MSB-first.
fn significance(order: ByteOrder, bit_length: usize, i: usize) -> usize {
    match order {
        ByteOrder::LittleEndian => i,
        ByteOrder::BigEndian => bit_length - 1 - i,
    }
}

/// Mask covering the low `bit_length` bits
fn field_mask(bit_length: usize) -> u64 {
    if bit_length >= 64 {
        u64::MAX
    } else {
        (1u64 << bit_length) - 1
    }
}

/// Signal codec - pure bit-field extraction, insertion, and scaling
pub struct SignalCodec;

impl SignalCodec {
    /// Decode a signal from frame data into its physical value
    ///
    /// Returns 0.0 for empty frame data ("no data yet" default). Bit
    /// positions referencing bytes beyond the frame length read as zero.
    pub fn decode(data: &[u8], signal: &SignalDefinition) -> f64 {
        if data.is_empty() {
            return 0.0;
        }
        let raw = Self::decode_raw(data, signal);
        raw as f64 * signal.factor + signal.offset
    }

    /// Extract the raw (pre-scaling) value of a signal, sign-extended
    pub fn decode_raw(data: &[u8], signal: &SignalDefinition) -> i64 {
        let bit_length = signal.bit_length as usize;
        let unsigned = Self::extract_bits(data, signal.start_bit, bit_length, signal.byte_order);

        match signal.value_kind {
            ValueKind::Unsigned => unsigned as i64,
            // Single-bit signals carry no sign bit
            ValueKind::Signed if bit_length > 1 => Self::sign_extend(unsigned, bit_length),
            ValueKind::Signed => unsigned as i64,
        }
    }

    /// Convert a physical value back to its raw field representation
    ///
    /// Inverse scaling with truncation toward zero; the result is silently
    /// masked to the signal's bit length (overflow is not an error).
    pub fn encode(physical: f64, signal: &SignalDefinition) -> u64 {
        let raw = ((physical - signal.offset) / signal.factor).trunc() as i64;
        raw as u64 & field_mask(signal.bit_length as usize)
    }

    /// Write a raw field value into frame data at the signal's position
    ///
    /// The value is masked to the signal's bit length first. Bits that would
    /// land beyond the buffer are dropped.
    pub fn insert(data: &mut [u8], signal: &SignalDefinition, raw: u64) {
        let bit_length = signal.bit_length as usize;
        let value = raw & field_mask(bit_length);
        let cursor = BitCursor::new(signal.start_bit, signal.byte_order);

        for (i, (byte_idx, bit_idx)) in cursor.take(bit_length).enumerate() {
            if byte_idx >= data.len() {
                continue;
            }
            let bit = (value >> significance(signal.byte_order, bit_length, i)) & 1;
            if bit == 1 {
                data[byte_idx] |= 1 << bit_idx;
            } else {
                data[byte_idx] &= !(1 << bit_idx);
            }
        }
    }

    /// Look up the value-description label for a raw value
    pub fn value_description<'a>(signal: &'a SignalDefinition, raw: i64) -> Option<&'a str> {
        signal.value_descriptions.get(&raw).map(String::as_str)
    }

    /// Decode all signals of a message definition from one frame
    ///
    /// Signals that decode to nothing meaningful are still emitted - the
    /// catalog's advisory ranges are not enforced here. An empty frame
    /// yields one zero-valued entry per signal (the documented default).
    pub fn decode_frame(frame: &RawFrame, message: &MessageDefinition) -> Vec<DecodedSignalValue> {
        message
            .signals
            .iter()
            .map(|signal| {
                let value = Self::decode(&frame.data, signal);
                let raw_value = if frame.data.is_empty() {
                    0
                } else {
                    Self::decode_raw(&frame.data, signal)
                };
                let value_description =
                    Self::value_description(signal, raw_value).map(str::to_string);

                DecodedSignalValue {
                    can_id: frame.can_id,
                    message_name: message.name.clone(),
                    signal_name: signal.name.clone(),
                    value,
                    raw_value,
                    unit: signal.unit.clone(),
                    value_description,
                    timestamp_ns: frame.timestamp_ns,
                    min: signal.min,
                    max: signal.max,
                }
            })
            .collect()
    }

    /// Extract `bit_length` bits starting at `start_bit` as an unsigned value
    fn extract_bits(data: &[u8], start_bit: u16, bit_length: usize, order: ByteOrder) -> u64 {
        let mut result: u64 = 0;
        let cursor = BitCursor::new(start_bit, order);

        for (i, (byte_idx, bit_idx)) in cursor.take(bit_length).enumerate() {
            // Out-of-range bytes read as zero bits
            if byte_idx >= data.len() {
                continue;
            }
            let bit = ((data[byte_idx] >> bit_idx) & 1) as u64;
            result |= bit << significance(order, bit_length, i);
        }

        result
    }

    /// Sign-extend a value from N bits to 64 bits (two's complement)
    fn sign_extend(value: u64, bit_length: usize) -> i64 {
        if bit_length >= 64 {
            return value as i64;
        }
        let sign_bit = 1u64 << (bit_length - 1);
        if value & sign_bit != 0 {
            (value | (!0u64 << bit_length)) as i64
        } else {
            value as i64
        }
    }
}
