//! XMP 2.0 profile extraction (DDR4 only).
//!
//! The vendor block starts with an "XMP" signature at byte 384 (two accepted
//! byte orders exist in the wild), enable bits at 0x182, and up to two
//! profile blocks at a 63-byte stride. A profile is emitted only when its
//! enable bit is set and its clock period resolves positive.

use crate::codec::{self, FieldCodec};
use crate::constants::{DDR4_RATE_STEP, XMP_ENABLE_OFFSET, XMP_HEADER_OFFSET, XMP_PROFILE_STRIDE};

/// One decoded XMP profile with nanosecond timings.
#[derive(Debug, Clone)]
pub struct XmpProfile {
    pub label: String,
    pub tck_ns: f64,
    pub taa_ns: f64,
    pub trcd_ns: f64,
    pub trp_ns: f64,
    pub tras_ns: f64,
    pub trc_ns: f64,
    pub tfaw_ns: f64,
    pub trrd_s_ns: f64,
    pub trrd_l_ns: f64,
    /// Requested DIMM voltage in volts.
    pub voltage: f64,
    /// Data rate in MT/s, rounded to the 100 MT/s grid.
    pub data_rate: u32,
    pub frequency_mhz: f64,
}

impl XmpProfile {
    /// One-line summary: "3600 MT/s (1800 MHz) 18-22-22-42 @ 1.35 V".
    pub fn summary(&self) -> String {
        if self.tck_ns <= 0.0 {
            return "—".into();
        }

        let cl = codec::timing_to_cycles(self.taa_ns, self.tck_ns);
        let rcd = codec::timing_to_cycles(self.trcd_ns, self.tck_ns);
        let rp = codec::timing_to_cycles(self.trp_ns, self.tck_ns);
        let ras = codec::timing_to_cycles(self.tras_ns, self.tck_ns);
        let timings = format!("{cl:.0}-{rcd:.0}-{rp:.0}-{ras:.0}");

        let freq = if self.data_rate > 0 {
            format!("{} MT/s ({:.0} MHz)", self.data_rate, self.frequency_mhz)
        } else {
            format!("{:.0} MHz", self.frequency_mhz)
        };

        let volts = if self.voltage > 0.0 {
            format!("{:.2} V", self.voltage)
        } else {
            "—".into()
        };

        format!("{freq} {timings} @ {volts}")
    }
}

/// Detect the fixed-offset header signature; both byte orders are accepted.
pub fn has_header(data: &[u8]) -> bool {
    let Some(sig) = data.get(XMP_HEADER_OFFSET..XMP_HEADER_OFFSET + 3) else {
        return false;
    };
    sig == b"XMP" || sig == b"PMX"
}

/// Fractional voltage field: one integer bit plus hundredths in bits 6-0.
pub fn decode_voltage(codec: &FieldCodec<'_>, offset: usize) -> f64 {
    if !codec.has(offset) {
        return 0.0;
    }
    let value = codec.byte(offset);
    f64::from(value >> 7) + f64::from(value & 0x7F) / 100.0
}

/// Extract all enabled profiles. Disabled blocks never appear regardless of
/// their byte content.
pub fn profiles(data: &[u8]) -> Vec<XmpProfile> {
    let mut out = Vec::new();
    if !has_header(data) || data.len() <= XMP_ENABLE_OFFSET {
        return out;
    }

    let codec = FieldCodec::new(data);
    let enable_bits = codec.byte(XMP_ENABLE_OFFSET);

    for index in 0..2usize {
        if enable_bits & (1 << index) == 0 {
            continue;
        }

        let off = index * XMP_PROFILE_STRIDE;
        if !codec.has(0x1AF + off) {
            continue;
        }

        let tck_ns = codec.timing_ns(0x18C + off, 0x1AF + off);
        if tck_ns <= 0.0 {
            continue;
        }

        out.push(XmpProfile {
            label: format!("XMP Profile {}", index + 1),
            tck_ns,
            taa_ns: codec.timing_ns(0x191 + off, 0x1AE + off),
            trcd_ns: codec.timing_ns(0x192 + off, 0x1AD + off),
            trp_ns: codec.timing_ns(0x193 + off, 0x1AC + off),
            tras_ns: codec.composite_ns(0x195 + off, 0x194 + off, 7, 4, None),
            trc_ns: codec.composite_ns(0x196 + off, 0x194 + off, 3, 4, Some(0x1AB + off)),
            tfaw_ns: codec.composite_ns(0x19E + off, 0x19D + off, 3, 4, None),
            trrd_s_ns: codec.timing_ns(0x19F + off, 0x1AA + off),
            trrd_l_ns: codec.timing_ns(0x1A0 + off, 0x1A9 + off),
            voltage: decode_voltage(&codec, 0x189 + off),
            data_rate: codec::round_data_rate(tck_ns, DDR4_RATE_STEP),
            frequency_mhz: 1000.0 / tck_ns,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xmp_image() -> Vec<u8> {
        let mut data = vec![0u8; 512];
        data[384..387].copy_from_slice(b"XMP");
        data[0x182] = 0b01; // profile 1 enabled
        data[0x18C] = 5; // tCK = 625 ps -> 3200 MT/s
        data[0x189] = 0x80 | 35; // 1.35 V
        data[0x191] = 100; // tAA = 12.5 ns -> CL20
        data
    }

    #[test]
    fn enabled_profile_is_extracted() {
        let data = xmp_image();
        let profiles = profiles(&data);
        assert_eq!(profiles.len(), 1);
        let p = &profiles[0];
        assert_eq!(p.label, "XMP Profile 1");
        assert_eq!(p.data_rate, 3200);
        assert!((p.voltage - 1.35).abs() < 1e-9);
        assert!((p.taa_ns - 12.5).abs() < 1e-9);
    }

    #[test]
    fn disabled_profile_never_appears() {
        let mut data = xmp_image();
        data[0x182] = 0; // both disabled, block content untouched
        assert!(profiles(&data).is_empty());
    }

    #[test]
    fn missing_header_yields_nothing() {
        let mut data = xmp_image();
        data[384] = 0;
        assert!(profiles(&data).is_empty());
    }

    #[test]
    fn reversed_signature_is_accepted() {
        let mut data = xmp_image();
        data[384..387].copy_from_slice(&[0x50, 0x4D, 0x58]);
        assert_eq!(profiles(&data).len(), 1);
    }

    #[test]
    fn zero_tck_suppresses_profile() {
        let mut data = xmp_image();
        data[0x18C] = 0;
        assert!(profiles(&data).is_empty());
    }

    #[test]
    fn summary_renders_cycles() {
        let data = xmp_image();
        let p = &profiles(&data)[0];
        assert_eq!(p.summary(), "3200 MT/s (1600 MHz) 20-0-0-0 @ 1.35 V");
    }
}
