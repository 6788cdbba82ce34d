//! JEP106 manufacturer registry.
//!
//! SPD stores a vendor as two bytes: a continuation-bank count (bits 6-0,
//! odd parity in bit 7) and the code within that bank (also parity-carrying).
//! The table below keys on the raw `(continuation << 8) | code` value with
//! parity bits intact, which is how the bytes appear in dumps.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Raw JEP106 id (parity included) to vendor name.
///
/// Bank 1 entries carry continuation byte 0x80 (count 0 + odd parity),
/// bank 2 carries 0x01, bank 3 carries 0x02, and so on.
static MANUFACTURERS: &[(u16, &str)] = &[
    // Bank 1
    (0x8001, "AMD"),
    (0x8004, "Fujitsu"),
    (0x8007, "Hitachi"),
    (0x8089, "Intel"),
    (0x8010, "NEC"),
    (0x8097, "Texas Instruments"),
    (0x801C, "Mitsubishi"),
    (0x802C, "Micron Technology"),
    (0x8040, "ProMOS/Mosel Vitelic"),
    (0x80AD, "SK Hynix"),
    (0x80B3, "IDT (Renesas)"),
    (0x80C1, "Infineon"),
    (0x80CE, "Samsung"),
    (0x80DA, "Winbond Electronics"),
    (0x80E0, "LG Semiconductor"),
    // Bank 2
    (0x0132, "V-Color"),
    (0x014F, "Transcend Information"),
    (0x0194, "SMART Modular"),
    (0x0198, "Kingston"),
    (0x017A, "Apacer Technology"),
    (0x01F1, "Innodisk"),
    // Bank 3
    (0x029E, "Corsair"),
    (0x02C0, "Mushkin"),
    (0x02FE, "Elpida"),
    // Bank 4
    (0x830B, "Nanya Technology"),
    (0x8394, "Ramtron"),
    // Bank 5
    (0x0443, "Ramaxel Technology"),
    (0x04B0, "OCZ Technology"),
    (0x04CB, "A-DATA Technology"),
    (0x04CD, "G.Skill"),
    (0x04EF, "Team Group"),
    // Bank 6
    (0x853E, "Patriot Memory"),
    (0x8551, "Qimonda"),
    (0x859B, "Crucial Technology"),
    // Bank 7
    (0x86F1, "InnoDisk Corporation"),
    (0x8632, "Montage Technology"),
    // Bank 9
    (0x0825, "Kingmax Semiconductor"),
    (0x0851, "Goldkey"),
];

fn registry() -> &'static HashMap<u16, &'static str> {
    static MAP: OnceLock<HashMap<u16, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| MANUFACTURERS.iter().copied().collect())
}

/// Combine the two SPD bytes into the registry key.
pub fn jedec_id(continuation: u8, code: u8) -> u16 {
    (u16::from(continuation) << 8) | u16::from(code)
}

/// Vendor name for a `(continuation, code)` pair. Unmatched pairs render as
/// `Unknown (0xXX, 0xXX)` rather than failing.
pub fn manufacturer_name(continuation: u8, code: u8) -> String {
    match registry().get(&jedec_id(continuation, code)) {
        Some(name) => (*name).to_string(),
        None => format!("Unknown (0x{continuation:02X}, 0x{code:02X})"),
    }
}

/// `(display, id)` pairs for editor choice lists, sorted by name.
pub fn choices() -> Vec<(String, u16)> {
    let mut items: Vec<(String, u16)> = MANUFACTURERS
        .iter()
        .map(|&(id, name)| (format!("{name} (0x{id:04X})"), id))
        .collect();
    items.sort_by(|a, b| a.0.cmp(&b.0));
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vendors_resolve() {
        assert_eq!(manufacturer_name(0x80, 0xCE), "Samsung");
        assert_eq!(manufacturer_name(0x80, 0xAD), "SK Hynix");
        assert_eq!(manufacturer_name(0x80, 0x2C), "Micron Technology");
        assert_eq!(manufacturer_name(0x01, 0x98), "Kingston");
        assert_eq!(manufacturer_name(0x04, 0xCD), "G.Skill");
    }

    #[test]
    fn unknown_pair_yields_sentinel_string() {
        assert_eq!(manufacturer_name(0x7F, 0x7F), "Unknown (0x7F, 0x7F)");
    }

    #[test]
    fn choices_are_sorted_and_complete() {
        let items = choices();
        assert_eq!(items.len(), MANUFACTURERS.len());
        let mut sorted = items.clone();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(items, sorted);
    }
}
