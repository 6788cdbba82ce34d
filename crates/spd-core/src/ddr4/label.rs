//! DDR4 JEDEC DIMM label synthesis and raw-card naming.
//!
//! The canonical descriptor has the form
//! `{capacity}{organization} PC4-{speedCode}{bin}[-{section}][-{revision}]`.
//! Any missing contributing field collapses the whole label to "—"; a
//! partially-filled label is never emitted.

use crate::codec::{self, FieldCodec};
use crate::constants::DDR4_RATE_STEP;
use crate::ddr4::geometry::Ddr4Geometry;

/// JEDEC speed-bin letters keyed by data rate.
static SPEED_BIN_CODES: &[(u32, &str)] = &[
    (1600, "P"),
    (1866, "R"),
    (2133, "S"),
    (2400, "T"),
    (2666, "V"),
    (2933, "Y"),
    (3200, "AA"),
];

/// Ordered raw-card name table; the extension bit selects the upper half and
/// 0x1F is the reserved "ZZ" entry.
static RAW_CARD_NAMES: &[&str] = &[
    "A", "B", "C", "D", "E", "F", "G", "H", "J", "K", "L", "M", "N", "P", "R", "T",
    "U", "V", "W", "Y", "AA", "AB", "AC", "AD", "AE", "AF", "AG", "AH", "AJ", "AK", "AL",
    "AM", "AN", "AP", "AR", "AT", "AU", "AV", "AW", "AY", "BA", "BB", "BC", "BD", "BE",
    "BF", "BG", "BH", "BJ", "BK", "BL", "BM", "BN", "BP", "BR", "BT", "BU", "BV", "BW",
    "BY", "CA", "CB", "ZZ",
];

/// Raw cards with a known layer count, shown alongside the name.
static RAW_CARD_LAYERS: &[(&str, u32)] =
    &[("A1", 8), ("B1", 12), ("B2", 12), ("B3", 12), ("B4", 12)];

pub fn speed_bin_suffix(data_rate: u32) -> &'static str {
    SPEED_BIN_CODES
        .iter()
        .find(|(rate, _)| *rate == data_rate)
        .map(|(_, code)| *code)
        .unwrap_or("")
}

pub fn build_speed_code(data_rate: u32) -> String {
    format!("{data_rate}{}", speed_bin_suffix(data_rate))
}

/// Single-letter module-type prefix for the label section.
pub fn module_type_prefix(module_type: u8) -> &'static str {
    match module_type & 0x0F {
        0x00 => "X",
        0x01 | 0x05 => "R",
        0x02 | 0x06 => "U",
        0x03 | 0x08 | 0x09 | 0x0C | 0x0D => "S",
        0x04 => "L",
        _ => "",
    }
}

/// Raw-card ordinal from the overflow nibble at byte 128 (bits 7-5, offset by
/// 3 when present), falling back to the revision bits of byte 130.
pub fn raw_card_ordinal(data: &[u8]) -> u32 {
    let Some(&height_byte) = data.get(128) else {
        return 0;
    };
    let extension = u32::from((height_byte >> 5) & 0x07);
    if extension > 0 {
        return extension + 3;
    }
    match data.get(130) {
        Some(&b) => u32::from((b >> 5) & 0x07),
        None => 0,
    }
}

/// Raw-card name from byte 130 (code bits 4-0, extension bit 7), including
/// the ordinal. Empty when underivable.
pub fn raw_card_code(data: &[u8]) -> String {
    let Some(&raw) = data.get(130) else {
        return String::new();
    };
    let code = usize::from(raw & 0x1F);
    if code == 0x1F {
        return "ZZ".into();
    }

    let index = code + if raw & 0x80 != 0 { 32 } else { 0 };
    let Some(&name) = RAW_CARD_NAMES.get(index) else {
        return String::new();
    };

    let ordinal = raw_card_ordinal(data);
    if ordinal > 0 {
        format!("{name}{ordinal}")
    } else {
        name.to_string()
    }
}

/// "Revision / Raw Card" attribute text: the 16-bit revision code from bytes
/// 142-143 plus the card name (with layer count when known).
pub fn raw_card_info(data: &[u8]) -> String {
    let Some(&raw) = data.get(130) else {
        return "—".into();
    };

    let revision_code = match data.get(142..144) {
        Some(pair) => u16::from(pair[0]) | (u16::from(pair[1]) << 8),
        None => 0,
    };

    let extension = raw & 0x80 != 0;
    let revision = (raw >> 5) & 0x03;
    let code = usize::from(raw & 0x1F);

    let code_text = if code == 0x1F {
        "ZZ".to_string()
    } else if extension {
        match RAW_CARD_NAMES.get(code + 32) {
            Some(&name) => {
                let ordinal = raw_card_ordinal(data);
                if ordinal > 0 {
                    format!("{name}{ordinal}")
                } else {
                    name.to_string()
                }
            }
            None => char::from(b'A' + code as u8).to_string(),
        }
    } else {
        char::from(b'A' + code as u8).to_string()
    };

    let card_part = match RAW_CARD_LAYERS.iter().find(|(name, _)| *name == code_text) {
        Some((_, layers)) => format!("{code_text} ({layers} layers)"),
        None if revision > 0 => format!("{code_text}{revision}"),
        None => code_text,
    };

    format!("{revision_code:04X}h / {card_part}")
}

/// SPD-revision suffix appended to the label ("11", "12", …); empty at 0.0.
pub fn spd_revision_suffix(data: &[u8]) -> String {
    let Some(&rev) = data.get(1) else {
        return String::new();
    };
    let major = rev >> 4;
    let minor = rev & 0x0F;
    if major == 0 && minor == 0 {
        String::new()
    } else {
        format!("{major}{minor}")
    }
}

/// Assemble the full DIMM label, or "—" when capacity or data rate cannot be
/// derived.
pub fn build_label(data: &[u8], tck_ns: f64) -> String {
    let geometry = Ddr4Geometry::new(data);
    let capacity_bytes = geometry.module_capacity_bytes();
    let data_rate = codec::round_data_rate(tck_ns, DDR4_RATE_STEP);
    if capacity_bytes == 0 || data_rate == 0 {
        return "—".into();
    }

    let capacity = codec::format_data_size(capacity_bytes).replace(' ', "");
    let organization = geometry.rank_descriptor();
    let speed_code = build_speed_code(data_rate);

    let mut label = if organization.is_empty() {
        format!("{capacity} PC4-{speed_code}")
    } else {
        format!("{capacity} {organization} PC4-{speed_code}")
    };

    let codec = FieldCodec::new(data);
    let section = format!(
        "{}{}",
        module_type_prefix(codec.byte(3)),
        raw_card_code(data)
    );
    if !section.is_empty() {
        label.push('-');
        label.push_str(&section);
    }

    let revision = spd_revision_suffix(data);
    if !revision.is_empty() {
        label.push('-');
        label.push_str(&revision);
    }

    label
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> Vec<u8> {
        let mut data = vec![0u8; 512];
        data[1] = 0x12; // SPD revision 1.2
        data[2] = 0x0C;
        data[3] = 0x02; // UDIMM
        data[4] = 0x04; // 4 Gb dies
        data[5] = 0b0001_0010;
        data[12] = 0b0000_1001; // 2 ranks, x8
        data[13] = 0b0000_0011; // 64-bit bus
        data[18] = 5; // tCK = 625 ps -> DDR4-3200
        data[130] = 0x01; // raw card B
        data
    }

    #[test]
    fn full_label_assembles() {
        let data = image();
        let tck = 0.625;
        assert_eq!(build_label(&data, tck), "8GB 2Rx8 PC4-3200AA-UB-12");
    }

    #[test]
    fn label_collapses_without_rate() {
        let data = image();
        assert_eq!(build_label(&data, 0.0), "—");
    }

    #[test]
    fn label_collapses_without_capacity() {
        let mut data = image();
        data[12] = 0; // removes rank/width info? width code 0 is x4, rank 1
        data.truncate(12); // actually drop the organization bytes entirely
        assert_eq!(build_label(&data, 0.625), "—");
    }

    #[test]
    fn speed_bins() {
        assert_eq!(build_speed_code(2666), "2666V");
        assert_eq!(build_speed_code(3200), "3200AA");
        assert_eq!(build_speed_code(2500), "2500");
    }

    #[test]
    fn raw_card_extension_and_ordinal() {
        let mut data = vec![0u8; 256];
        data[130] = 0x80; // extension set, code 0 -> upper table "AA"
        assert_eq!(raw_card_code(&data), "AA");

        data[128] = 0b0010_0000; // overflow nibble 1 -> ordinal 4
        assert_eq!(raw_card_code(&data), "AA4");

        data[128] = 0;
        data[130] = 0x1F; // reserved
        assert_eq!(raw_card_code(&data), "ZZ");
    }

    #[test]
    fn raw_card_info_formats_revision() {
        let mut data = vec![0u8; 256];
        data[130] = 0x23; // code 3 = "D", revision 1
        data[142] = 0x00;
        data[143] = 0x00;
        // ordinal comes from byte 130 bits 6-5 when byte 128 has no overflow
        assert_eq!(raw_card_info(&data), "0000h / D1");
    }
}
