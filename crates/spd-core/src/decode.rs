//! Decoder-facing output model: attributes with byte provenance, timing rows,
//! and the generation-independent `SpdDecoder` capability.

use crate::detect::MemoryType;

/// Byte span inside the SPD buffer that contributed to a derived value.
///
/// Consumed by external viewers for highlighting; the engine only supplies the
/// ranges and never renders them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: usize,
    pub len: usize,
}

impl ByteRange {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }
}

/// A single decoded attribute. `value` is always a finished display string;
/// derivations that fail their preconditions substitute the "—" sentinel.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub label: String,
    pub value: String,
    pub highlighted: bool,
    pub ranges: Vec<ByteRange>,
}

impl Attribute {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            highlighted: false,
            ranges: Vec::new(),
        }
    }

    pub fn with_range(mut self, offset: usize, len: usize) -> Self {
        self.ranges.push(ByteRange::new(offset, len));
        self
    }

    pub fn with_ranges(mut self, ranges: Vec<ByteRange>) -> Self {
        self.ranges = ranges;
        self
    }

    pub fn highlighted(mut self) -> Self {
        self.highlighted = true;
        self
    }
}

/// One row of the timing table: a speed bin plus cycle counts per parameter.
#[derive(Debug, Clone)]
pub struct TimingRow {
    pub frequency: String,
    pub cas: String,
    pub rcd: String,
    pub rp: String,
    pub ras: String,
    pub rc: String,
    pub faw: String,
    pub rrd_s: String,
    pub rrd_l: String,
    pub wr: String,
    pub wtr_s: String,
}

impl TimingRow {
    /// Placeholder row with every cell set to the sentinel.
    pub fn empty(frequency: impl Into<String>) -> Self {
        Self {
            frequency: frequency.into(),
            cas: "—".into(),
            rcd: "—".into(),
            rp: "—".into(),
            ras: "—".into(),
            rc: "—".into(),
            faw: "—".into(),
            rrd_s: "—".into(),
            rrd_l: "—".into(),
            wr: "—".into(),
            wtr_s: "—".into(),
        }
    }
}

/// The three collections a decoder produces.
#[derive(Debug, Clone, Default)]
pub struct DecodeOutput {
    pub module: Vec<Attribute>,
    pub dram: Vec<Attribute>,
    pub timings: Vec<TimingRow>,
}

/// Generation-specific decoder facade.
///
/// `populate` never fails: internal derivation errors degrade individual
/// attributes to sentinels and already-computed attributes stay in the result.
pub trait SpdDecoder {
    fn memory_type(&self) -> MemoryType;
    fn populate(&self) -> DecodeOutput;
}

/// Shared attribute labels so the two generations stay consistent.
pub mod labels {
    pub const MANUFACTURER: &str = "Manufacturer";
    pub const PART_NUMBER: &str = "Part Number";
    pub const SERIAL_NUMBER: &str = "Serial Number";
    pub const SPECIFIC_PART: &str = "Specific Part Number";
    pub const DIMM_LABEL: &str = "JEDEC DIMM Label";
    pub const ARCHITECTURE: &str = "Architecture";
    pub const SPEED_GRADE: &str = "Speed Grade";
    pub const CAPACITY: &str = "Capacity";
    pub const ORGANIZATION: &str = "Organization";
    pub const THERMAL_SENSOR: &str = "Thermal Sensor";
    pub const MODULE_HEIGHT: &str = "Module Height";
    pub const MODULE_THICKNESS: &str = "Module Thickness";
    pub const REGISTER_MANUFACTURER: &str = "Register Manufacturer";
    pub const REGISTER_BUFFER_MANUFACTURER: &str = "Register/Buffer Manufacturer";
    pub const REGISTER_MODEL: &str = "Register Model";
    pub const REVISION_RAW_CARD: &str = "Revision / Raw Card";
    pub const ADDRESS_MAPPING: &str = "Address Mapping";
    pub const MANUFACTURING_DATE: &str = "Manufacturing Date";
    pub const MANUFACTURING_LOCATION: &str = "Manufacturing Location";
    pub const CRC: &str = "CRC";
    pub const CRC_BLOCK0: &str = "CRC Block 0";
    pub const CRC_BLOCK1: &str = "CRC Block 1";
    pub const DRAM_PART_NUMBER: &str = "DRAM Part Number";
    pub const PACKAGE: &str = "Package";
    pub const DIE_DENSITY_COUNT: &str = "Die Density / Count";
    pub const COMPOSITION: &str = "Composition";
    pub const INPUT_CLOCK: &str = "Input Clock Frequency";
    pub const ADDRESSING: &str = "Addressing";
    pub const MIN_TIMINGS: &str = "Minimum Timing Delays";
    pub const READ_LATENCIES: &str = "Read Latencies Supported";
    pub const SUPPLY_VOLTAGE: &str = "Supply Voltage";
    pub const SPD_REVISION: &str = "SPD Revision";
    pub const XMP_CERTIFIED: &str = "XMP Certified";
    pub const XMP_REVISION: &str = "XMP Revision";
}

/// The universal "value not derivable" sentinel.
pub const SENTINEL: &str = "—";
