//! DRAM package classification from the DDR4 package byte.
//!
//! Byte 6 encodes monolithic-vs-stacked (bit 7), die count (bits 6-4,
//! value + 1) and signal loading (bits 1-0). Known combinations map to JEDEC
//! package names through a static table; everything else synthesizes a
//! generic description.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::codec::extract_bits;

/// Signal-loading mode of a stacked package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalLoading {
    /// Not specified (monolithic parts report this).
    Unspecified,
    /// Multiple dies each load the signal bus (DDP-style).
    MultiLoadStack,
    /// One die loads the bus for the whole stack (3DS).
    SingleLoadStack,
}

impl SignalLoading {
    pub fn from_code(code: u8) -> Self {
        match code & 0x3 {
            1 => SignalLoading::MultiLoadStack,
            2 => SignalLoading::SingleLoadStack,
            _ => SignalLoading::Unspecified,
        }
    }
}

/// Decoded package byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiePackage {
    pub monolithic: bool,
    pub die_count: u8,
    pub loading: SignalLoading,
}

impl DiePackage {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            monolithic: byte & 0x80 == 0,
            die_count: extract_bits(byte, 4, 3) + 1,
            loading: SignalLoading::from_code(extract_bits(byte, 0, 2)),
        }
    }

    pub fn is_single_load_stack(&self) -> bool {
        !self.monolithic && self.loading == SignalLoading::SingleLoadStack
    }

    pub fn is_multi_load_stack(&self) -> bool {
        !self.monolithic && self.loading == SignalLoading::MultiLoadStack
    }

    /// Multi-load stacks are the non-standard configurations.
    pub fn is_standard(&self) -> bool {
        !self.is_multi_load_stack()
    }

    /// Human description, table first, generic synthesis second.
    pub fn describe(&self) -> String {
        if let Some(known) = known_packages().get(&(self.die_count, self.loading, self.monolithic))
        {
            return (*known).to_string();
        }

        // Unmatched triple: synthesize in the same vocabulary.
        let ball = "78-ball FBGA";
        if self.monolithic {
            return format!("Standard Monolithic {ball}");
        }
        match self.loading {
            SignalLoading::SingleLoadStack => format!("{}-High 3DS {ball}", self.die_count),
            SignalLoading::MultiLoadStack => format!("Non-Standard {ball}"),
            SignalLoading::Unspecified => format!("Non-Standard Stack {ball}"),
        }
    }
}

/// (die count, loading, monolithic) -> JEDEC package description.
///
/// All standard DDR4 packages use the 78-ball FBGA; 3DS stacks keep the same
/// ballout and are named by their stack height.
fn known_packages() -> &'static HashMap<(u8, SignalLoading, bool), &'static str> {
    static MAP: OnceLock<HashMap<(u8, SignalLoading, bool), &'static str>> = OnceLock::new();
    MAP.get_or_init(|| {
        let mut map = HashMap::new();
        map.insert(
            (1, SignalLoading::Unspecified, true),
            "Standard Monolithic 78-ball FBGA",
        );
        for dies in 1..=8u8 {
            map.insert(
                (dies, SignalLoading::SingleLoadStack, false),
                match dies {
                    1 => "1-High 3DS 78-ball FBGA",
                    2 => "2-High 3DS 78-ball FBGA",
                    3 => "3-High 3DS 78-ball FBGA",
                    4 => "4-High 3DS 78-ball FBGA",
                    5 => "5-High 3DS 78-ball FBGA",
                    6 => "6-High 3DS 78-ball FBGA",
                    7 => "7-High 3DS 78-ball FBGA",
                    _ => "8-High 3DS 78-ball FBGA",
                },
            );
            map.insert(
                (dies, SignalLoading::MultiLoadStack, false),
                "Non-Standard Multi Load Stack 78-ball FBGA",
            );
            map.insert(
                (dies, SignalLoading::Unspecified, false),
                "Non-Standard Stack 78-ball FBGA",
            );
        }
        map
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monolithic_byte_decodes() {
        // 0x00: monolithic, one die, loading unspecified
        let pkg = DiePackage::from_byte(0x00);
        assert!(pkg.monolithic);
        assert_eq!(pkg.die_count, 1);
        assert_eq!(pkg.loading, SignalLoading::Unspecified);
        assert_eq!(pkg.describe(), "Standard Monolithic 78-ball FBGA");
        assert!(pkg.is_standard());
    }

    #[test]
    fn three_ds_stack_decodes() {
        // bit7 set, die code 3 (4 dies), loading 2 (single load stack)
        let pkg = DiePackage::from_byte(0x80 | (3 << 4) | 2);
        assert!(!pkg.monolithic);
        assert_eq!(pkg.die_count, 4);
        assert!(pkg.is_single_load_stack());
        assert_eq!(pkg.describe(), "4-High 3DS 78-ball FBGA");
    }

    #[test]
    fn multi_load_stack_is_non_standard() {
        let pkg = DiePackage::from_byte(0x80 | (1 << 4) | 1);
        assert!(pkg.is_multi_load_stack());
        assert!(!pkg.is_standard());
        assert_eq!(pkg.describe(), "Non-Standard Multi Load Stack 78-ball FBGA");
    }

    #[test]
    fn unspecified_stack_synthesizes() {
        let pkg = DiePackage::from_byte(0x80 | (5 << 4));
        assert_eq!(pkg.die_count, 6);
        assert_eq!(pkg.describe(), "Non-Standard Stack 78-ball FBGA");
    }
}
