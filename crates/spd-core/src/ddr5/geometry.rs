//! DDR5 capacity and organization derivation.

use crate::codec::extract_bits;

/// Per-die density lookup: byte 4 bits 3-0 select from this fixed table (Gb).
pub static DENSITY_GB: &[u32] = &[0, 4, 8, 12, 16, 24, 32, 48, 64];

/// Geometry view over a DDR5 SPD image.
pub struct Ddr5Geometry<'a> {
    data: &'a [u8],
}

impl<'a> Ddr5Geometry<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn byte(&self, index: usize) -> Option<u8> {
        self.data.get(index).copied()
    }

    /// Density per die in Gb via the fixed 9-entry table.
    pub fn density_gb(&self) -> u32 {
        let Some(b) = self.byte(4) else { return 0 };
        let code = usize::from(b & 0x0F);
        DENSITY_GB.get(code).copied().unwrap_or(0)
    }

    /// Dies per package from byte 4 bits 7-4; code 0 reads as one die.
    pub fn die_count(&self) -> u32 {
        let Some(b) = self.byte(4) else { return 1 };
        let code = u32::from(b >> 4);
        if code == 0 { 1 } else { code }
    }

    /// SDRAM I/O width from byte 6 bits 7-5.
    pub fn device_width_bits(&self) -> u32 {
        let Some(b) = self.byte(6) else { return 0 };
        match extract_bits(b, 5, 3) {
            0 => 4,
            1 => 8,
            2 => 16,
            3 => 32,
            _ => 0,
        }
    }

    /// Total bus width per channel: byte 235 bits 2-0 give the sub-channel
    /// width, and every DDR5 channel carries two sub-channels.
    pub fn bus_width_bits(&self) -> u32 {
        let Some(b) = self.byte(235) else { return 0 };
        let code = u32::from(extract_bits(b, 0, 3));
        let sub_channel = (1u32 << (code + 3)) & 0xF8;
        sub_channel * 2
    }

    /// Package ranks per channel from byte 234 bits 5-3 (value + 1).
    pub fn rank_count(&self) -> u32 {
        let Some(b) = self.byte(234) else { return 0 };
        u32::from(extract_bits(b, 3, 3)) + 1
    }

    /// Channel count from byte 235 bits 7-6 (2^code).
    pub fn channel_count(&self) -> u32 {
        let Some(b) = self.byte(235) else { return 1 };
        1 << extract_bits(b, 6, 2)
    }

    /// Bank groups from byte 4 bits 7-5 of the addressing view. Note that the
    /// SPD overlays density and bank-group codes in byte 4; the group code
    /// occupies the top three bits.
    pub fn bank_group_count(&self) -> u32 {
        let Some(b) = self.byte(4) else { return 0 };
        match extract_bits(b, 5, 3) {
            0 => 2,
            1 => 4,
            2 => 8,
            _ => 0,
        }
    }

    /// DDR5 always has four banks per group.
    pub fn banks_per_group(&self) -> u32 {
        4
    }

    /// Row address bits from byte 5 bits 6-4 (16-18).
    pub fn row_count(&self) -> u32 {
        match self.byte(5) {
            Some(b) => u32::from(extract_bits(b, 4, 3)) + 16,
            None => 0,
        }
    }

    /// Column address bits from byte 5 bits 2-0 (10-12).
    pub fn column_count(&self) -> u32 {
        match self.byte(5) {
            Some(b) => u32::from(extract_bits(b, 0, 3)) + 10,
            None => 0,
        }
    }

    /// Module capacity in bytes:
    /// densityGb x dieCount / 8 x (busWidth/deviceWidth) x ranks x channels.
    pub fn module_capacity_bytes(&self) -> u64 {
        if self.data.len() <= 235 {
            return 0;
        }

        let density = u64::from(self.density_gb());
        let dies = u64::from(self.die_count());
        let device = u64::from(self.device_width_bits());
        let bus = u64::from(self.bus_width_bits());
        let ranks = u64::from(self.rank_count());
        let channels = u64::from(self.channel_count());
        if density == 0 || device == 0 || bus == 0 || ranks == 0 {
            return 0;
        }

        let capacity_gb = density * dies / 8 * (bus / device) * ranks * channels;
        capacity_gb * 1024 * 1024 * 1024
    }

    /// "{n} ranks × {bus}-bit, {channels} channels, x{width} devices".
    pub fn organization(&self) -> String {
        let ranks = self.rank_count();
        let width = self.device_width_bits();
        let bus = self.bus_width_bits();
        let channels = self.channel_count();
        if ranks == 0 || width == 0 || bus == 0 {
            return "—".into();
        }

        let channel_text = if channels > 1 {
            format!(", {channels} channels")
        } else {
            String::new()
        };
        let plural = if ranks > 1 { "s" } else { "" };
        format!("{ranks} rank{plural} × {bus}-bit{channel_text}, x{width} devices")
    }

    /// Compact rank descriptor for the DIMM label.
    pub fn rank_descriptor(&self) -> String {
        let ranks = self.rank_count();
        let width = self.device_width_bits();
        if ranks == 0 || width == 0 {
            return String::new();
        }
        format!("{ranks}Rx{width}")
    }

    /// "{rows} rows × {cols} cols, {groups} BG × 4 banks".
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

    /// 16GB DDR5 UDIMM: 16Gb dies, x8, 64-bit channel, single rank.
    fn base_image() -> Vec<u8> {
        let mut data = vec![0u8; 1024];
        data[2] = 0x12;
        data[4] = 0x04; // density code 4 -> 16 Gb, no extra dies
        data[5] = 0b0000_0000; // 16 rows, 10 cols
        data[6] = 0b0010_0000; // x8
        data[234] = 0; // 1 rank
        data[235] = 0b0000_0010; // 32-bit sub-channel -> 64-bit, 1 channel
        data
    }

    #[test]
    fn density_table_lookup() {
        let mut data = base_image();
        let geo = Ddr5Geometry::new(&data);
        assert_eq!(geo.density_gb(), 16);

        data[4] = 0x08; // code 8 -> 64 Gb
        let geo = Ddr5Geometry::new(&data);
        assert_eq!(geo.density_gb(), 64);

        data[4] = 0x0F; // out of table -> 0
        let geo = Ddr5Geometry::new(&data);
        assert_eq!(geo.density_gb(), 0);
    }

    #[test]
    fn capacity_formula() {
        // 16 Gb x 1 die / 8 x (64/8) x 1 rank x 1 channel = 16 GB
        let data = base_image();
        let geo = Ddr5Geometry::new(&data);
        assert_eq!(geo.bus_width_bits(), 64);
        assert_eq!(geo.device_width_bits(), 8);
        assert_eq!(geo.module_capacity_bytes(), 16u64 << 30);
    }

    #[test]
    fn channels_and_ranks_multiply() {
        let mut data = base_image();
        data[234] = 1 << 3; // 2 ranks
        data[235] = 0b0100_0010; // 2 channels, 64-bit
        let geo = Ddr5Geometry::new(&data);
        assert_eq!(geo.rank_count(), 2);
        assert_eq!(geo.channel_count(), 2);
        assert_eq!(geo.module_capacity_bytes(), 64u64 << 30);
    }

    #[test]
    fn die_count_zero_code_reads_one() {
        let data = base_image();
        let geo = Ddr5Geometry::new(&data);
        assert_eq!(geo.die_count(), 1);

        let mut data = base_image();
        data[4] = 0x24; // 2 dies, 16 Gb
        let geo = Ddr5Geometry::new(&data);
        assert_eq!(geo.die_count(), 2);
        assert_eq!(geo.module_capacity_bytes(), 32u64 << 30);
    }

    #[test]
    fn short_buffer_degrades() {
        let data = vec![0u8; 200];
        let geo = Ddr5Geometry::new(&data);
        assert_eq!(geo.module_capacity_bytes(), 0);
        assert_eq!(geo.organization(), "—");
    }

    #[test]
    fn organization_text() {
        let data = base_image();
        let geo = Ddr5Geometry::new(&data);
        assert_eq!(geo.organization(), "1 rank × 64-bit, x8 devices");
        assert_eq!(geo.rank_descriptor(), "1Rx8");
    }

    #[test]
    fn addressing_text() {
        let mut data = base_image();
        data[4] = 0b0010_0100; // bank group code 1 -> 4 groups, density 16 Gb
        data[5] = 0b0001_0010; // 17 rows, 12 cols
        let geo = Ddr5Geometry::new(&data);
        assert_eq!(geo.addressing(), "17 rows × 12 cols, 4 BG × 4 banks");
    }
}
