//! CRC-16/CCITT verification and repair for SPD blocks.
//!
//! Polynomial 0x1021, zero initial value, MSB-first, no input/output
//! reflection. DDR4 covers two independent 126-byte blocks; DDR5 covers a
//! single 510-byte block. Stored checksums are little-endian.

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::decode::ByteRange;

pub const POLYNOMIAL: u16 = 0x1021;

/// One protected block: the covered data span and where the CRC is stored.
#[derive(Debug, Clone, Copy)]
pub struct CrcBlock {
    pub data_start: usize,
    pub data_len: usize,
    pub stored_at: usize,
}

/// DDR4 layout: bytes [0..126) checked at 126-127, [128..254) at 254-255.
pub const DDR4_BLOCKS: [CrcBlock; 2] = [
    CrcBlock { data_start: 0, data_len: 126, stored_at: 126 },
    CrcBlock { data_start: 128, data_len: 126, stored_at: 254 },
];

/// DDR5 layout: bytes [0..510) checked at 510-511.
pub const DDR5_BLOCKS: [CrcBlock; 1] =
    [CrcBlock { data_start: 0, data_len: 510, stored_at: 510 }];

/// Block layout for a memory generation; empty for unknown types.
pub fn layout_for(memory_type: crate::detect::MemoryType) -> &'static [CrcBlock] {
    match memory_type {
        crate::detect::MemoryType::Ddr4 => &DDR4_BLOCKS,
        crate::detect::MemoryType::Ddr5 => &DDR5_BLOCKS,
        crate::detect::MemoryType::Unknown => &[],
    }
}

/// CRC-16/CCITT over a byte slice.
pub fn compute(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Outcome of checking one block against its stored value.
#[derive(Debug, Clone)]
pub struct BlockReport {
    pub calculated: u16,
    pub stored: Option<u16>,
    pub ok: bool,
    /// Display string ("calc 0x1234 - OK", "data incomplete (…)", …).
    pub summary: String,
    /// Byte spans that contributed (the stored checksum location).
    pub ranges: Vec<ByteRange>,
}

/// Verify a single block. Short buffers produce a diagnostic report instead
/// of an error.
pub fn verify_block(data: &[u8], block: &CrcBlock) -> BlockReport {
    if data.len() < block.data_start + block.data_len {
        let available = data.len().saturating_sub(block.data_start);
        return BlockReport {
            calculated: 0,
            stored: None,
            ok: false,
            summary: format!("data incomplete ({available}/{} bytes)", block.data_len),
            ranges: Vec::new(),
        };
    }

    let calculated = compute(&data[block.data_start..block.data_start + block.data_len]);

    if data.len() >= block.stored_at + 2 {
        let stored = LittleEndian::read_u16(&data[block.stored_at..]);
        let ok = stored == calculated;
        let status = if ok { "OK" } else { "BAD" };
        BlockReport {
            calculated,
            stored: Some(stored),
            ok,
            summary: format!("calc 0x{calculated:04X}, stored 0x{stored:04X} - {status}"),
            ranges: vec![ByteRange::new(block.stored_at, 2)],
        }
    } else if data.len() == block.stored_at + 1 {
        BlockReport {
            calculated,
            stored: None,
            ok: false,
            summary: format!("calc 0x{calculated:04X} - BAD (stored incomplete)"),
            ranges: vec![ByteRange::new(block.stored_at, 1)],
        }
    } else {
        BlockReport {
            calculated,
            stored: None,
            ok: false,
            summary: format!("calc 0x{calculated:04X} - BAD (stored missing)"),
            ranges: Vec::new(),
        }
    }
}

/// Verify every block of a layout.
pub fn verify(data: &[u8], blocks: &[CrcBlock]) -> Vec<BlockReport> {
    blocks.iter().map(|b| verify_block(data, b)).collect()
}

/// Recompute one block's checksum and overwrite the stored copy if it
/// differs. Returns whether the buffer was mutated; a block that is already
/// correct (or does not fit the buffer) is left untouched.
pub fn fix_block(data: &mut [u8], block: &CrcBlock) -> bool {
    if data.len() < block.data_start + block.data_len || data.len() < block.stored_at + 2 {
        return false;
    }

    let calculated = compute(&data[block.data_start..block.data_start + block.data_len]);
    let stored = LittleEndian::read_u16(&data[block.stored_at..]);
    if stored == calculated {
        return false;
    }

    debug!(
        offset = block.stored_at,
        was = format!("0x{stored:04X}"),
        now = format!("0x{calculated:04X}"),
        "CRC repaired"
    );
    LittleEndian::write_u16(&mut data[block.stored_at..block.stored_at + 2], calculated);
    true
}

/// Repair every block of a layout. Idempotent: a second call on a repaired
/// buffer reports no change.
pub fn fix(data: &mut [u8], blocks: &[CrcBlock]) -> bool {
    let mut changed = false;
    for block in blocks {
        changed |= fix_block(data, block);
    }
    changed
}
