//! Editable-field model and the generation-independent `SpdEditor`
//! capability.
//!
//! Editors project decoded state into categorized fields, validate proposed
//! values, and turn accepted values back into minimal byte patches. The apply
//! step is all-or-nothing: any validation failure aborts the whole batch.

use std::collections::HashMap;
use std::fmt;

/// Field categories used for grouping by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditCategory {
    MemoryModule,
    DramComponents,
    DensityDie,
    Timing,
    ModuleConfig,
    Xmp,
}

impl fmt::Display for EditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditCategory::MemoryModule => write!(f, "Memory Module"),
            EditCategory::DramComponents => write!(f, "DRAM Components"),
            EditCategory::DensityDie => write!(f, "Density / Die"),
            EditCategory::Timing => write!(f, "Timing"),
            EditCategory::ModuleConfig => write!(f, "Module Configuration"),
            EditCategory::Xmp => write!(f, "XMP"),
        }
    }
}

/// Input widget kind a field expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditFieldKind {
    Text,
    Choice,
    Flag,
    Numeric,
}

/// One entry of a choice list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceItem {
    pub label: String,
    pub value: String,
}

impl ChoiceItem {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { label: label.into(), value: value.into() }
    }
}

/// Editable-field description regenerated from the buffer on every load and
/// after every successful apply.
#[derive(Debug, Clone)]
pub struct EditField {
    pub id: String,
    pub label: String,
    pub value: String,
    pub kind: EditFieldKind,
    pub tooltip: String,
    pub max_length: Option<usize>,
    pub read_only: bool,
    pub choices: Vec<ChoiceItem>,
    pub category: EditCategory,
}

impl EditField {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<String>,
        kind: EditFieldKind,
        category: EditCategory,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            value: value.into(),
            kind,
            tooltip: String::new(),
            max_length: None,
            read_only: false,
            choices: Vec::new(),
            category,
        }
    }

    pub fn tooltip(mut self, text: impl Into<String>) -> Self {
        self.tooltip = text.into();
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn choices(mut self, choices: Vec<ChoiceItem>) -> Self {
        self.choices = choices;
        self
    }
}

/// A byte patch: `bytes` replaces the buffer content at `offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteChange {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

/// Proposed field values keyed by field id.
pub type FieldValues = HashMap<String, String>;
/// Per-field validation error messages keyed by field id.
pub type ValidationErrors = HashMap<String, String>;

/// Generation-specific editor facade. Each instance owns a private buffer
/// copy; concurrent edit sessions require separate instances.
pub trait SpdEditor {
    /// Snapshot the buffer for editing.
    fn load_data(&mut self, data: &[u8]);

    /// Current private buffer content.
    fn data(&self) -> &[u8];

    /// Project decoded state into categorized editable fields.
    fn edit_fields(&self) -> Vec<EditField>;

    /// Check proposed values; an empty map means the batch is acceptable.
    fn validate_fields(&self, values: &FieldValues) -> ValidationErrors;

    /// Validate, then encode accepted values as byte patches applied to the
    /// private buffer, finishing with a checksum repair. Any validation
    /// failure returns an empty list and leaves the buffer untouched.
    fn apply_changes(&mut self, values: &FieldValues) -> Vec<ByteChange>;
}

/// Records byte writes against a buffer, enforcing the `ByteChange`
/// invariants: out-of-range writes are dropped whole and unchanged bytes are
/// never reported.
pub(crate) struct ChangeRecorder<'a> {
    data: &'a mut [u8],
    changes: Vec<ByteChange>,
}

impl<'a> ChangeRecorder<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, changes: Vec::new() }
    }

    pub fn data(&self) -> &[u8] {
        self.data
    }

    pub fn set_byte(&mut self, offset: usize, value: u8) {
        self.set_bytes(offset, &[value]);
    }

    /// Write a span; silently dropped when it does not fit the buffer.
    pub fn set_bytes(&mut self, offset: usize, bytes: &[u8]) {
        let Some(end) = offset.checked_add(bytes.len()) else {
            return;
        };
        if end > self.data.len() || bytes.is_empty() {
            return;
        }
        if self.data[offset..end] == *bytes {
            return;
        }
        self.data[offset..end].copy_from_slice(bytes);
        self.changes.push(ByteChange { offset, bytes: bytes.to_vec() });
    }

    /// Read-modify-write of selected bits within one byte.
    pub fn set_bits(&mut self, offset: usize, mask: u8, value: u8) {
        if offset >= self.data.len() {
            return;
        }
        let merged = (self.data[offset] & !mask) | (value & mask);
        self.set_byte(offset, merged);
    }

    pub fn into_changes(self) -> Vec<ByteChange> {
        self.changes
    }
}

/// Parse "1A" / "0x1A" style hex bytes.
pub fn parse_hex_u8(text: &str) -> Option<u8> {
    let text = text.trim();
    let text = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")).unwrap_or(text);
    u8::from_str_radix(text, 16).ok()
}

/// Parse "80CE" / "0x80CE" style 16-bit hex ids.
pub fn parse_hex_u16(text: &str) -> Option<u16> {
    let text = text.trim();
    let text = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")).unwrap_or(text);
    u16::from_str_radix(text, 16).ok()
}

/// Parse a decimal 0-99 value into its BCD byte.
pub fn parse_bcd(text: &str) -> Option<u8> {
    let value: u8 = text.trim().parse().ok()?;
    crate::codec::decimal_to_bcd(value)
}

/// Serial-number input: up to 8 hex characters (even count), zero-padded to
/// the 4-byte field.
pub fn parse_serial_hex(text: &str) -> Option<[u8; 4]> {
    let text = text.trim().replace(' ', "");
    let text = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")).unwrap_or(&text);
    if text.is_empty() || text.len() % 2 != 0 || text.len() > 8 {
        return None;
    }
    if !text.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let mut bytes = [0u8; 4];
    for (i, chunk) in text.as_bytes().chunks(2).enumerate() {
        let pair = std::str::from_utf8(chunk).ok()?;
        bytes[i] = u8::from_str_radix(pair, 16).ok()?;
    }
    Some(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_skips_noop_and_out_of_range() {
        let mut data = vec![0u8; 8];
        data[2] = 0x55;
        let mut rec = ChangeRecorder::new(&mut data);

        rec.set_byte(2, 0x55); // no-op
        rec.set_byte(100, 0x01); // out of range, dropped
        rec.set_bytes(6, &[1, 2, 3]); // spills past the end, dropped whole
        rec.set_byte(3, 0xAA);

        let changes = rec.into_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0], ByteChange { offset: 3, bytes: vec![0xAA] });
        assert_eq!(data[3], 0xAA);
        assert_eq!(data[6], 0);
    }

    #[test]
    fn recorder_merges_bits() {
        let mut data = vec![0b1010_1010u8];
        let mut rec = ChangeRecorder::new(&mut data);
        rec.set_bits(0, 0x0F, 0x05);
        let changes = rec.into_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(data[0], 0b1010_0101);
    }

    #[test]
    fn hex_and_bcd_parsing() {
        assert_eq!(parse_hex_u8("0x1A"), Some(0x1A));
        assert_eq!(parse_hex_u8("ff"), Some(0xFF));
        assert_eq!(parse_hex_u8("zz"), None);
        assert_eq!(parse_hex_u16("80CE"), Some(0x80CE));
        assert_eq!(parse_bcd("26"), Some(0x26));
        assert_eq!(parse_bcd("100"), None);
    }

    #[test]
    fn serial_hex_parsing() {
        assert_eq!(parse_serial_hex("DEADBEEF"), Some([0xDE, 0xAD, 0xBE, 0xEF]));
        assert_eq!(parse_serial_hex("1234"), Some([0x12, 0x34, 0, 0]));
        assert_eq!(parse_serial_hex("123"), None);
        assert_eq!(parse_serial_hex("XYZ1"), None);
        assert_eq!(parse_serial_hex("AABBCCDDEE"), None);
    }
}
