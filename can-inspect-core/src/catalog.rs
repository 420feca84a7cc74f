//! Message catalog
//!
//! Signal and message definitions, queryable by CAN ID and by name. The
//! decode pipeline holds the catalog as an immutable snapshot; edit
//! operations run on an owned copy which is then published as a fresh
//! snapshot, so a lookup never observes a half-applied edit.

use crate::types::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Byte order for signal extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// Little-endian (Intel format)
    LittleEndian,
    /// Big-endian (Motorola format)
    BigEndian,
}

/// Value kind for signal interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Unsigned integer
    Unsigned,
    /// Signed integer (two's complement)
    Signed,
}

/// A DBC-style CAN signal definition
///
/// Describes how to extract one engineering value from a frame payload:
/// bit position, width, byte order, and scaling. `min`/`max` are advisory
/// only - the codec never clamps or rejects values against them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDefinition {
    /// Signal name (unique within its message)
    pub name: String,
    /// Start bit in the CAN frame (0..63)
    pub start_bit: u16,
    /// Length in bits (1..64)
    pub bit_length: u16,
    /// Byte order for bit extraction
    pub byte_order: ByteOrder,
    /// Signed/unsigned interpretation of the raw value
    pub value_kind: ValueKind,
    /// Scale factor to convert raw value to physical value
    pub factor: f64,
    /// Offset added after scaling
    pub offset: f64,
    /// Advisory minimum physical value (not enforced)
    pub min: f64,
    /// Advisory maximum physical value (not enforced)
    pub max: f64,
    /// Engineering unit (e.g., "km/h", "degC", "V")
    #[serde(default)]
    pub unit: Option<String>,
    /// Value table for enum-like values (raw value -> human label)
    #[serde(default)]
    pub value_descriptions: HashMap<i64, String>,
    /// Receiving node names
    #[serde(default)]
    pub receivers: Vec<String>,
}

impl SignalDefinition {
    /// Build an unscaled unsigned signal (factor 1, offset 0)
    pub fn new(name: impl Into<String>, start_bit: u16, bit_length: u16, byte_order: ByteOrder) -> Self {
        Self {
            name: name.into(),
            start_bit,
            bit_length,
            byte_order,
            value_kind: ValueKind::Unsigned,
            factor: 1.0,
            offset: 0.0,
            min: 0.0,
            max: 0.0,
            unit: None,
            value_descriptions: HashMap::new(),
            receivers: Vec::new(),
        }
    }
}

/// A complete CAN message definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDefinition {
    /// CAN arbitration ID (11-bit or 29-bit)
    pub id: u32,
    /// Message name (unique within the catalog)
    pub name: String,
    /// Message size in bytes (0..8 for classic CAN)
    pub length: usize,
    /// True if this message uses an extended (29-bit) ID
    #[serde(default)]
    pub is_extended: bool,
    /// All signals in this message (names unique)
    #[serde(default)]
    pub signals: Vec<SignalDefinition>,
}

impl MessageDefinition {
    /// Find a signal by name
    pub fn signal(&self, name: &str) -> Option<&SignalDefinition> {
        self.signals.iter().find(|s| s.name == name)
    }
}

/// The message catalog - all known message definitions
///
/// One definition per CAN ID. Owned by a catalog-management collaborator;
/// the pipeline only needs read access to a resolved definition per frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageCatalog {
    /// Message definitions in catalog order
    messages: Vec<MessageDefinition>,
    /// CAN ID -> index into `messages`
    #[serde(skip)]
    id_index: HashMap<u32, usize>,
    /// Message name -> index into `messages`
    #[serde(skip)]
    name_index: HashMap<String, usize>,
}

impl MessageCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a list of definitions
    ///
    /// Fails on duplicate CAN IDs or duplicate message names.
    pub fn from_messages(messages: Vec<MessageDefinition>) -> Result<Self> {
        let mut catalog = Self::new();
        for message in messages {
            catalog.add_message(message)?;
        }
        Ok(catalog)
    }

    /// Rebuild the lookup indices after deserialization or bulk edits
    pub fn reindex(&mut self) {
        self.id_index.clear();
        self.name_index.clear();
        for (idx, message) in self.messages.iter().enumerate() {
            self.id_index.insert(message.id, idx);
            self.name_index.insert(message.name.clone(), idx);
        }
    }

    /// Add a message definition
    pub fn add_message(&mut self, message: MessageDefinition) -> Result<()> {
        if self.id_index.contains_key(&message.id) {
            return Err(CoreError::DuplicateMessage(message.id));
        }
        if self.name_index.contains_key(&message.name) {
            return Err(CoreError::InvalidDefinition(format!(
                "message name already in use: {}",
                message.name
            )));
        }
        let idx = self.messages.len();
        self.id_index.insert(message.id, idx);
        self.name_index.insert(message.name.clone(), idx);
        self.messages.push(message);
        Ok(())
    }

    /// Replace the definition for an existing CAN ID
    pub fn update_message(&mut self, message: MessageDefinition) -> Result<()> {
        let idx = *self
            .id_index
            .get(&message.id)
            .ok_or(CoreError::MessageNotFound(message.id))?;
        self.name_index.remove(&self.messages[idx].name);
        self.name_index.insert(message.name.clone(), idx);
        self.messages[idx] = message;
        Ok(())
    }

    /// Remove a message definition by CAN ID
    pub fn remove_message(&mut self, can_id: u32) -> Result<MessageDefinition> {
        if !self.id_index.contains_key(&can_id) {
            return Err(CoreError::MessageNotFound(can_id));
        }
        let idx = self.id_index[&can_id];
        let removed = self.messages.remove(idx);
        self.reindex();
        Ok(removed)
    }

    /// Add a signal to an existing message
    pub fn add_signal(&mut self, can_id: u32, signal: SignalDefinition) -> Result<()> {
        let idx = *self
            .id_index
            .get(&can_id)
            .ok_or(CoreError::MessageNotFound(can_id))?;
        let message = &mut self.messages[idx];
        if message.signals.iter().any(|s| s.name == signal.name) {
            return Err(CoreError::DuplicateSignal(signal.name));
        }
        message.signals.push(signal);
        Ok(())
    }

    /// Replace a signal in an existing message, matched by name
    pub fn update_signal(&mut self, can_id: u32, signal: SignalDefinition) -> Result<()> {
        let idx = *self
            .id_index
            .get(&can_id)
            .ok_or(CoreError::MessageNotFound(can_id))?;
        let message = &mut self.messages[idx];
        let slot = message
            .signals
            .iter_mut()
            .find(|s| s.name == signal.name)
            .ok_or_else(|| CoreError::SignalNotFound(signal.name.clone()))?;
        *slot = signal;
        Ok(())
    }

    /// Remove a signal from a message by name
    pub fn remove_signal(&mut self, can_id: u32, signal_name: &str) -> Result<SignalDefinition> {
        let idx = *self
            .id_index
            .get(&can_id)
            .ok_or(CoreError::MessageNotFound(can_id))?;
        let message = &mut self.messages[idx];
        let pos = message
            .signals
            .iter()
            .position(|s| s.name == signal_name)
            .ok_or_else(|| CoreError::SignalNotFound(signal_name.to_string()))?;
        Ok(message.signals.remove(pos))
    }

    /// Get the message definition for a CAN ID
    pub fn find_message_by_id(&self, can_id: u32) -> Option<&MessageDefinition> {
        self.id_index.get(&can_id).map(|&idx| &self.messages[idx])
    }

    /// Get a message definition by name
    pub fn find_message_by_name(&self, name: &str) -> Option<&MessageDefinition> {
        self.name_index.get(name).map(|&idx| &self.messages[idx])
    }

    /// All message definitions in catalog order
    pub fn messages(&self) -> &[MessageDefinition] {
        &self.messages
    }

    /// All CAN IDs in the catalog, sorted
    pub fn all_can_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.id_index.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Get catalog statistics
    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            num_messages: self.messages.len(),
            num_signals: self.messages.iter().map(|m| m.signals.len()).sum(),
        }
    }
}

/// Catalog statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStats {
    /// Total number of message definitions
    pub num_messages: usize,
    /// Total number of signal definitions
    pub num_signals: usize,
}
