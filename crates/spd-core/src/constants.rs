//! SPD layout constants from the JEDEC DDR4 (JESD79-4 annex L) and DDR5
//! (JESD400-5) serial presence detect specifications.

// ============================================================================
// Dump Sizes
// ============================================================================

/// Full DDR4 SPD image (4 pages x 128 bytes, typically dumped as 512).
pub const DDR4_SPD_SIZE: usize = 512;
/// Full DDR5 SPD image (8 pages x 128 bytes).
pub const DDR5_SPD_SIZE: usize = 1024;

/// Smallest buffer the factory will build a decoder/editor for.
pub const MIN_VALID_SPD_SIZE: usize = 256;
/// Minimum bytes required for meaningful DDR4 decoding (module section at 320+).
pub const DDR4_DECODE_MIN_SIZE: usize = 352;
/// Minimum bytes required for meaningful DDR5 decoding.
pub const DDR5_DECODE_MIN_SIZE: usize = 512;

// ============================================================================
// Memory Type Detection
// ============================================================================

/// Offset of the DRAM device type byte.
pub const MEMORY_TYPE_OFFSET: usize = 2;
pub const MEMORY_TYPE_DDR4: u8 = 0x0C;
pub const MEMORY_TYPE_DDR5: u8 = 0x12;

// ============================================================================
// Timebases (DDR4)
// ============================================================================

/// Medium timebase when byte 15 selects the default encoding.
pub const DDR4_MEDIUM_TIMEBASE_PS: f64 = 125.0;
/// Fine timebase when byte 15 selects the default encoding.
pub const DDR4_FINE_TIMEBASE_PS: f64 = 1.0;
/// Byte carrying the MTB/FTB selection codes.
pub const TIMEBASE_OFFSET: usize = 15;

// ============================================================================
// DDR4 Offsets
// ============================================================================

pub const DDR4_MODULE_MANUFACTURER_OFFSET: usize = 320;
pub const DDR4_DRAM_MANUFACTURER_OFFSET: usize = 350;
pub const DDR4_PART_NUMBER_START: usize = 329;
pub const DDR4_PART_NUMBER_END: usize = 348;
pub const DDR4_PART_NUMBER_LEN: usize = 20;
pub const DDR4_SERIAL_NUMBER_START: usize = 325;
pub const DDR4_SERIAL_NUMBER_END: usize = 328;
pub const DDR4_MANUFACTURING_YEAR_OFFSET: usize = 323;
pub const DDR4_MANUFACTURING_WEEK_OFFSET: usize = 324;
pub const DDR4_MANUFACTURING_LOCATION_OFFSET: usize = 322;
/// Vendor-specific data area scanned for secondary part numbers.
pub const DDR4_SPECIFIC_DATA_START: usize = 353;
pub const DDR4_SPECIFIC_DATA_END: usize = 383;

// ============================================================================
// DDR4 XMP 2.0 Block
// ============================================================================

/// "XMP" signature bytes.
pub const XMP_HEADER_OFFSET: usize = 384;
/// Profile enable bit flags.
pub const XMP_ENABLE_OFFSET: usize = 0x182;
/// First profile block.
pub const XMP_PROFILE1_OFFSET: usize = 0x189;
/// Second profile block.
pub const XMP_PROFILE2_OFFSET: usize = 0x1C8;
/// Distance between the two profile blocks.
pub const XMP_PROFILE_STRIDE: usize = 63;

// ============================================================================
// DDR5 Offsets
// ============================================================================

pub const DDR5_MODULE_MANUFACTURER_OFFSET: usize = 512;
pub const DDR5_DRAM_MANUFACTURER_OFFSET: usize = 552;
pub const DDR5_PART_NUMBER_START: usize = 521;
pub const DDR5_PART_NUMBER_END: usize = 550;
pub const DDR5_PART_NUMBER_LEN: usize = 30;
pub const DDR5_SERIAL_NUMBER_START: usize = 517;
pub const DDR5_SERIAL_NUMBER_END: usize = 520;
pub const DDR5_MANUFACTURING_YEAR_OFFSET: usize = 515;
pub const DDR5_MANUFACTURING_WEEK_OFFSET: usize = 516;
pub const DDR5_MANUFACTURING_LOCATION_OFFSET: usize = 514;
pub const DDR5_PMIC_MANUFACTURER_OFFSET: usize = 554;
pub const DDR5_PMIC_REVISION_OFFSET: usize = 556;

// ============================================================================
// Data Rate Rounding
// ============================================================================

/// DDR4 data rates snap to 100 MT/s grid.
pub const DDR4_RATE_STEP: f64 = 100.0;
/// DDR5 data rates snap to 400 MT/s grid.
pub const DDR5_RATE_STEP: f64 = 400.0;
