//! DDR4 capacity and organization derivation.
//!
//! Everything here is a pure function of the raw buffer. Short buffers yield
//! zeros, which callers render as the "—" sentinel.

use crate::codec::extract_bits;
use crate::package::DiePackage;

/// Geometry view over a DDR4 SPD image.
pub struct Ddr4Geometry<'a> {
    data: &'a [u8],
}

impl<'a> Ddr4Geometry<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn byte(&self, index: usize) -> Option<u8> {
        self.data.get(index).copied()
    }

    /// Package byte 6 decode; a missing byte reads as monolithic single-die.
    pub fn package(&self) -> DiePackage {
        DiePackage::from_byte(self.byte(6).unwrap_or(0))
    }

    /// Ranks from byte 12 bits 5-3 (value + 1).
    pub fn rank_count(&self) -> u32 {
        match self.byte(12) {
            Some(b) => u32::from(extract_bits(b, 3, 3)) + 1,
            None => 0,
        }
    }

    /// SDRAM device width in bits from byte 12 bits 2-0.
    pub fn device_width_bits(&self) -> u32 {
        match self.byte(12) {
            Some(b) => 4 << extract_bits(b, 0, 3),
            None => 0,
        }
    }

    /// Primary bus width in bits from byte 13 bits 2-0.
    pub fn primary_bus_width_bits(&self) -> u32 {
        match self.byte(13) {
            Some(b) => 8 << extract_bits(b, 0, 3),
            None => 0,
        }
    }

    pub fn has_ecc(&self) -> bool {
        self.byte(13).is_some_and(|b| b & 0x08 != 0)
    }

    pub fn total_bus_width_bits(&self) -> u32 {
        self.primary_bus_width_bits() + if self.has_ecc() { 8 } else { 0 }
    }

    /// Bank groups from byte 4 bits 7-6 (code 0 means ungrouped, reported
    /// as 4 total banks worth of groups).
    pub fn bank_group_count(&self) -> u32 {
        match self.byte(4) {
            Some(b) => {
                let code = u32::from(extract_bits(b, 6, 2));
                if code == 0 { 4 } else { code * 2 }
            }
            None => 4,
        }
    }

    /// Banks per group from byte 4 bits 5-4.
    pub fn banks_per_group(&self) -> u32 {
        match self.byte(4) {
            Some(b) => 1 << (extract_bits(b, 4, 2) + 2),
            None => 4,
        }
    }

    /// Row address bits from byte 5 bits 5-3 (12-18).
    pub fn row_count(&self) -> u32 {
        match self.byte(5) {
            Some(b) => u32::from(extract_bits(b, 3, 3)) + 12,
            None => 0,
        }
    }

    /// Column address bits from byte 5 bits 2-0 (9-12).
    pub fn column_count(&self) -> u32 {
        match self.byte(5) {
            Some(b) => u32::from(extract_bits(b, 0, 3)) + 9,
            None => 0,
        }
    }

    /// Programmed capacity per die in megabits, from byte 4 bits 3-0.
    ///
    /// Bit 3 selects between the legacy range (256Mb-32Gb) and the 3DS range
    /// (12Gb-24Gb); the two encodings use disjoint formulas.
    pub fn per_die_capacity_mb(&self) -> u32 {
        let Some(b) = self.byte(4) else { return 0 };
        let code = u32::from(b & 0x0F);
        if b & 0x08 == 0 {
            2 << (code + 7)
        } else {
            3 << (code + 4)
        }
    }

    /// Per-die density in megabits derived from the addressing fields:
    /// 2^rows x 2^cols x banks x groups x width. Unlike the programmed
    /// density this is always the single-die value, whatever the package.
    pub fn die_density_mb(&self) -> u64 {
        let rows = self.row_count();
        let cols = self.column_count();
        let groups = u64::from(self.bank_group_count());
        let banks = u64::from(self.banks_per_group());
        let width = u64::from(self.device_width_bits());
        if rows == 0 || cols == 0 || groups == 0 || banks == 0 || width == 0 {
            return 0;
        }
        let bits = (1u64 << rows) * (1u64 << cols) * banks * groups * width;
        bits >> 20
    }

    /// Total module capacity in bytes.
    ///
    /// perDieMb/8 x (busWidth/deviceWidth) x ranks x effectiveDieCount x 1MiB,
    /// where the die count only multiplies single-load (3DS) stacks.
    pub fn module_capacity_bytes(&self) -> u64 {
        let per_die_mb = u64::from(self.per_die_capacity_mb());
        if per_die_mb == 0 {
            return 0;
        }
        let device = u64::from(self.device_width_bits());
        let bus = u64::from(self.primary_bus_width_bits());
        let ranks = u64::from(self.rank_count());
        if device == 0 || bus == 0 || ranks == 0 {
            return 0;
        }

        let package = self.package();
        let effective_dies = if package.is_single_load_stack() {
            u64::from(package.die_count)
        } else {
            1
        };

        (per_die_mb / 8) * (bus / device) * ranks * effective_dies * 1024 * 1024
    }

    /// Total DRAM component count across the module, folding multi-load
    /// stacks as ceil(ranks / dieCount) physical packages per channel.
    pub fn total_components(&self) -> (u32, u32) {
        let device = self.device_width_bits();
        let primary = self.primary_bus_width_bits();
        let ranks = self.rank_count();
        if device == 0 || primary == 0 || ranks == 0 {
            return (0, 0);
        }

        let primary_per_rank = primary / device;
        let ecc_per_rank = if self.has_ecc() { 8 / device } else { 0 };

        let package = self.package();
        let effective_ranks = if package.is_multi_load_stack() && package.die_count > 0 {
            ranks.div_ceil(u32::from(package.die_count)).max(1)
        } else {
            ranks
        };

        (primary_per_rank * effective_ranks, ecc_per_rank * effective_ranks)
    }

    /// "{perDieMb}M x{width} ({n} ranks)" organization descriptor.
    pub fn organization(&self) -> String {
        let ranks = self.rank_count();
        if ranks == 0 {
            return "—".into();
        }
        let bus = self.total_bus_width_bits();
        let per_die_mb = self.per_die_capacity_mb();
        if per_die_mb == 0 {
            return "—".into();
        }
        let plural = if ranks > 1 { "s" } else { "" };
        format!("{per_die_mb}M x{bus} ({ranks} rank{plural})")
    }

    /// Compact rank descriptor for the DIMM label ("2Rx4", "2S2Rx4", …).
    /// Empty when underivable.
    pub fn rank_descriptor(&self) -> String {
        let ranks = self.rank_count();
        let width = self.device_width_bits();
        if ranks == 0 || width == 0 {
            return String::new();
        }

        let package = self.package();
        if !package.monolithic {
            let dies = u32::from(package.die_count);
            if package.is_single_load_stack() {
                let die_per_rank = dies / ranks;
                if die_per_rank > 0 {
                    return format!("{die_per_rank}S{ranks}Rx{width}");
                }
            } else if package.is_multi_load_stack() {
                let label_dies = ((dies * ranks) / 2).max(1);
                return format!("{label_dies}DRx{width}");
            }
        }

        format!("{ranks}Rx{width}")
    }

    /// Device composition: total device capacity broken into bank arithmetic,
    /// with a per-die breakdown for stacked packages.
    pub fn composition(&self) -> String {
        let groups = self.bank_group_count();
        let banks = self.banks_per_group();
        let width = self.device_width_bits();
        let device_mb = self.per_die_capacity_mb();
        if groups == 0 || banks == 0 || width == 0 || device_mb == 0 {
            return "—".into();
        }

        let total_banks = groups * banks;
        let per_bank_mb = device_mb / total_banks;
        let mut text = format!(
            "{device_mb}Mb x{width} ({per_bank_mb}Mb x{width} x {total_banks} banks)"
        );

        let package = self.package();
        let dies = u32::from(package.die_count);
        if (package.is_multi_load_stack() || package.is_single_load_stack()) && dies > 1 {
            // Multi-load stacks program the whole-device density, so the
            // per-die value divides it; 3DS parts use the addressing-derived
            // single-die density.
            let per_die_mb = if package.is_multi_load_stack() {
                u64::from(device_mb / dies)
            } else {
                let derived = self.die_density_mb();
                if derived > 0 { derived } else { u64::from(device_mb / dies) }
            };
            if per_die_mb > 0 {
                let per_die_bank_mb = per_die_mb / u64::from(total_banks);
                text.push_str(&format!(
                    " / Per die: {per_die_mb}Mb x{width} ({per_die_bank_mb}Mb x{width} x {total_banks} banks)"
                ));
            }
        }

        text
    }

    /// "{rows} rows × {cols} cols, {groups} BG × {banks} banks".
    pub fn addressing(&self) -> String {
        if self.data.len() <= 5 {
            return "—".into();
        }
        format!(
            "{} rows × {} cols, {} BG × {} banks",
            self.row_count(),
            self.column_count(),
            self.bank_group_count(),
            self.banks_per_group()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4Gb x8 dies on a 64-bit bus, single rank, monolithic.
    fn base_image() -> Vec<u8> {
        let mut data = vec![0u8; 512];
        data[2] = 0x0C;
        data[4] = 0x04; // density code 4 -> 4096 Mb, 4 bank groups, 4 banks
        data[5] = 0b0001_0010; // 14 rows, 11 cols
        data[6] = 0x00; // monolithic
        data[12] = 0b0000_0001; // 1 rank, x8
        data[13] = 0b0000_0011; // 64-bit primary bus
        data
    }

    #[test]
    fn capacity_formula_round_trip() {
        // (4096/8) x (64/8) x 1 rank x 1 die x 1 MiB = 4 GiB
        let data = base_image();
        let geo = Ddr4Geometry::new(&data);
        assert_eq!(geo.per_die_capacity_mb(), 4096);
        assert_eq!(geo.module_capacity_bytes(), 4u64 << 30);
    }

    #[test]
    fn three_ds_density_range() {
        let mut data = base_image();
        data[4] = (data[4] & 0xF0) | 0x08; // 3DS range, code 8 -> 3 << 12 = 12288 Mb
        let geo = Ddr4Geometry::new(&data);
        assert_eq!(geo.per_die_capacity_mb(), 12288);
    }

    #[test]
    fn single_load_stack_multiplies_capacity() {
        let mut data = base_image();
        data[6] = 0x80 | (1 << 4) | 2; // stacked, 2 dies, single load
        let geo = Ddr4Geometry::new(&data);
        assert_eq!(geo.module_capacity_bytes(), 8u64 << 30);
    }

    #[test]
    fn multi_load_stack_does_not_multiply_capacity() {
        let mut data = base_image();
        data[6] = 0x80 | (1 << 4) | 1; // stacked, 2 dies, multi load
        let geo = Ddr4Geometry::new(&data);
        assert_eq!(geo.module_capacity_bytes(), 4u64 << 30);
    }

    #[test]
    fn zero_density_underives_everything() {
        let mut data = base_image();
        data[4] = 0;
        data[5] = 0;
        data[12] = 0;
        data[13] = 0;
        // density code 0 is 256 Mb, so zero the geometry the hard way
        let geo = Ddr4Geometry::new(&data[..4]);
        assert_eq!(geo.module_capacity_bytes(), 0);
        assert_eq!(geo.organization(), "—");
        assert_eq!(geo.rank_descriptor(), "");
    }

    #[test]
    fn organization_and_descriptor() {
        let mut data = base_image();
        data[12] = 0b0000_1001; // 2 ranks, x8
        let geo = Ddr4Geometry::new(&data);
        assert_eq!(geo.organization(), "4096M x64 (2 ranks)");
        assert_eq!(geo.rank_descriptor(), "2Rx8");
    }

    #[test]
    fn stacked_rank_descriptors() {
        let mut data = base_image();
        data[12] = 0b0000_1000; // 2 ranks, x4
        data[6] = 0x80 | (3 << 4) | 2; // 4 dies, single load stack
        let geo = Ddr4Geometry::new(&data);
        assert_eq!(geo.rank_descriptor(), "2S2Rx4");

        data[6] = 0x80 | (1 << 4) | 1; // 2 dies, multi load stack
        let geo = Ddr4Geometry::new(&data);
        assert_eq!(geo.rank_descriptor(), "2DRx4");
    }

    #[test]
    fn die_density_from_addressing() {
        // 2^14 rows x 2^11 cols x 16 banks x 8 bits = 4096 Mb
        let data = base_image();
        let geo = Ddr4Geometry::new(&data);
        assert_eq!(geo.die_density_mb(), 4096);
    }

    #[test]
    fn component_counts_fold_multi_load_ranks() {
        let mut data = base_image();
        data[12] = 0b0000_1001; // 2 ranks, x8
        data[13] |= 0x08; // ECC
        let geo = Ddr4Geometry::new(&data);
        assert_eq!(geo.total_components(), (16, 2));

        data[6] = 0x80 | (1 << 4) | 1; // 2 dies, multi load: ceil(2/2) = 1 rank
        let geo = Ddr4Geometry::new(&data);
        assert_eq!(geo.total_components(), (8, 1));
    }
}
