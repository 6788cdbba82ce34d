//! DDR5 DIMM label synthesis.
//!
//! Format: `{capacity} {organization} PC5-{rate}{bin}-{arch}-{height}-{attrs}`
//! (e.g. "16GB 1Rx8 PC5-5600B-UA0-1010-NT"). Missing capacity or data rate
//! collapses the label to "—".

use crate::codec;
use crate::constants::DDR5_RATE_STEP;
use crate::ddr5::geometry::Ddr5Geometry;

/// Speed-bin letter from byte 7 bits 7-5.
pub fn speed_bin_suffix(data: &[u8]) -> &'static str {
    match data.get(7).map(|b| (b >> 5) & 0x7) {
        Some(0) => "B",
        Some(1) => "C",
        Some(2) => "A",
        _ => "",
    }
}

/// Architecture code: module-type letter, design revision letter, channel
/// digit ("UA0", "RB1", …).
pub fn architecture_code(data: &[u8]) -> String {
    if data.len() <= 13 {
        return String::new();
    }

    let type_code = match data[3] & 0x0F {
        0x01 => 'R',
        0x02 => 'U',
        0x03 => 'S',
        0x04 => 'L',
        0x08 => 'T',
        0x09 => 'V',
        0x0A => 'C',
        _ => 'U',
    };

    let revision_code = match data.get(234) {
        Some(&b) => {
            let revision = (b >> 4) & 0x0F;
            if revision < 26 { (b'A' + revision) as char } else { 'A' }
        }
        None => 'A',
    };

    let channels = Ddr5Geometry::new(data).channel_count();
    let channel_code = if channels > 1 {
        char::from_digit(channels - 1, 10).unwrap_or('0')
    } else {
        '0'
    };

    format!("{type_code}{revision_code}{channel_code}")
}

/// Height/thickness hex code from bytes 229-230:
/// front nibble, back nibble, then the two height nibbles.
pub fn height_thickness_code(data: &[u8]) -> String {
    if data.len() <= 230 {
        return String::new();
    }
    let height = data[229] & 0x1F;
    let front = data[230] & 0x0F;
    let back = (data[230] >> 4) & 0x0F;
    format!("{front:X}{back:X}{:X}{:X}", height >> 4, height & 0xF)
}

/// Attribute letters: X (extended features) or N, plus T when a thermal
/// sensor is present.
pub fn module_attributes(data: &[u8]) -> String {
    let mut attrs = String::new();
    let extended = data.get(7).is_some_and(|b| b & 0x10 != 0);
    attrs.push(if extended { 'X' } else { 'N' });
    if data.get(14).is_some_and(|b| b & 0x80 != 0) {
        attrs.push('T');
    }
    attrs
}

/// Assemble the full label, or "—" when capacity or rate is underivable.
pub fn build_label(data: &[u8], tck_ns: f64) -> String {
    let geometry = Ddr5Geometry::new(data);
    let capacity_bytes = geometry.module_capacity_bytes();
    let data_rate = codec::round_data_rate(tck_ns, DDR5_RATE_STEP);
    if capacity_bytes == 0 || data_rate == 0 {
        return "—".into();
    }

    let capacity = codec::format_data_size(capacity_bytes).replace(' ', "");
    let organization = geometry.rank_descriptor();
    let mut label = format!("{capacity} {organization} PC5-{data_rate}");

    label.push_str(speed_bin_suffix(data));

    let arch = architecture_code(data);
    if !arch.is_empty() {
        label.push('-');
        label.push_str(&arch);
    }

    let height = height_thickness_code(data);
    if !height.is_empty() {
        label.push('-');
        label.push_str(&height);
    }

    let attrs = module_attributes(data);
    if !attrs.is_empty() {
        label.push('-');
        label.push_str(&attrs);
    }

    label
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> Vec<u8> {
        let mut data = vec![0u8; 1024];
        data[2] = 0x12;
        data[3] = 0x02; // UDIMM
        data[4] = 0x04; // 16 Gb
        data[6] = 0b0010_0000; // x8
        data[229] = 0x10; // height code 16
        data[230] = 0x01; // front 1, back 0
        data[234] = 0; // 1 rank, revision A
        data[235] = 0b0000_0010; // 64-bit, 1 channel
        data
    }

    #[test]
    fn full_label_assembles() {
        let data = image();
        // tCK 357 ps -> DDR5-5600
        assert_eq!(build_label(&data, 0.357), "16GB 1Rx8 PC5-5600B-UA0-1010-N");
    }

    #[test]
    fn label_collapses_without_rate_or_capacity() {
        let data = image();
        assert_eq!(build_label(&data, 0.0), "—");

        let mut data = image();
        data[4] = 0x00; // density 0
        assert_eq!(build_label(&data, 0.357), "—");
    }

    #[test]
    fn thermal_sensor_adds_t() {
        let mut data = image();
        data[14] = 0x80;
        assert!(build_label(&data, 0.357).ends_with("-NT"));
    }

    #[test]
    fn height_code_nibbles() {
        let data = image();
        assert_eq!(height_thickness_code(&data), "1010");
    }
}
