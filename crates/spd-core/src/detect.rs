//! Memory-type detection and the decoder/editor factory.

use tracing::debug;

use crate::constants::{MEMORY_TYPE_DDR4, MEMORY_TYPE_DDR5, MEMORY_TYPE_OFFSET, MIN_VALID_SPD_SIZE};
use crate::decode::SpdDecoder;
use crate::ddr4::{Ddr4Decoder, Ddr4Editor};
use crate::ddr5::{Ddr5Decoder, Ddr5Editor};
use crate::edit::SpdEditor;

/// Memory generation derived from the device-type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryType {
    #[default]
    Unknown,
    Ddr4,
    Ddr5,
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryType::Unknown => write!(f, "Unknown"),
            MemoryType::Ddr4 => write!(f, "DDR4"),
            MemoryType::Ddr5 => write!(f, "DDR5"),
        }
    }
}

/// Caller-supplied override for dumps whose type byte is corrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForcedMemoryType {
    #[default]
    Auto,
    Ddr4,
    Ddr5,
}

/// Sniff the memory generation from byte 2. Buffers shorter than 3 bytes are
/// `Unknown`.
pub fn detect_memory_type(data: &[u8]) -> MemoryType {
    match data.get(MEMORY_TYPE_OFFSET) {
        Some(&MEMORY_TYPE_DDR4) => MemoryType::Ddr4,
        Some(&MEMORY_TYPE_DDR5) => MemoryType::Ddr5,
        _ => MemoryType::Unknown,
    }
}

/// Detection result honoring a forced override.
pub fn resolve_memory_type(data: &[u8], forced: ForcedMemoryType) -> MemoryType {
    match forced {
        ForcedMemoryType::Auto => detect_memory_type(data),
        ForcedMemoryType::Ddr4 => MemoryType::Ddr4,
        ForcedMemoryType::Ddr5 => MemoryType::Ddr5,
    }
}

/// Build the generation-specific decoder. `None` means the buffer is too
/// short or the type is unknown; absence signals "unsupported", not an error.
pub fn create_decoder(data: &[u8], forced: ForcedMemoryType) -> Option<Box<dyn SpdDecoder>> {
    if data.len() < MIN_VALID_SPD_SIZE {
        debug!(len = data.len(), "buffer below factory minimum");
        return None;
    }
    match resolve_memory_type(data, forced) {
        MemoryType::Ddr4 => Some(Box::new(Ddr4Decoder::new(data.to_vec()))),
        MemoryType::Ddr5 => Some(Box::new(Ddr5Decoder::new(data.to_vec()))),
        MemoryType::Unknown => None,
    }
}

/// Build the generation-specific editor with its own private buffer copy.
pub fn create_editor(data: &[u8], forced: ForcedMemoryType) -> Option<Box<dyn SpdEditor>> {
    if data.len() < MIN_VALID_SPD_SIZE {
        return None;
    }
    match resolve_memory_type(data, forced) {
        MemoryType::Ddr4 => {
            let mut editor = Ddr4Editor::new();
            editor.load_data(data);
            Some(Box::new(editor))
        }
        MemoryType::Ddr5 => {
            let mut editor = Ddr5Editor::new();
            editor.load_data(data);
            Some(Box::new(editor))
        }
        MemoryType::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_two_selects_generation() {
        let mut data = vec![0u8; 512];
        data[2] = 0x0C;
        assert_eq!(detect_memory_type(&data), MemoryType::Ddr4);
        data[2] = 0x12;
        assert_eq!(detect_memory_type(&data), MemoryType::Ddr5);
        data[2] = 0x0B;
        assert_eq!(detect_memory_type(&data), MemoryType::Unknown);
    }

    #[test]
    fn short_buffer_is_unknown() {
        assert_eq!(detect_memory_type(&[]), MemoryType::Unknown);
        assert_eq!(detect_memory_type(&[0, 0]), MemoryType::Unknown);
    }

    #[test]
    fn forced_type_bypasses_detection() {
        let mut data = vec![0u8; 512];
        data[2] = 0xFF; // corrupted type byte
        assert_eq!(
            resolve_memory_type(&data, ForcedMemoryType::Ddr4),
            MemoryType::Ddr4
        );
        assert!(create_decoder(&data, ForcedMemoryType::Ddr4).is_some());
        assert!(create_decoder(&data, ForcedMemoryType::Auto).is_none());
    }

    #[test]
    fn factory_gates_on_minimum_length() {
        let mut data = vec![0u8; 128];
        data[2] = 0x0C;
        assert!(create_decoder(&data, ForcedMemoryType::Auto).is_none());
        assert!(create_editor(&data, ForcedMemoryType::Auto).is_none());

        let mut data = vec![0u8; 256];
        data[2] = 0x0C;
        assert!(create_decoder(&data, ForcedMemoryType::Auto).is_some());
        assert!(create_editor(&data, ForcedMemoryType::Auto).is_some());
    }
}
