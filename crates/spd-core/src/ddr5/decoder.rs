//! DDR5 decode facade.
//!
//! Same independence contract as DDR4: each attribute guards its own
//! preconditions and degrades to the sentinel. Fields requiring out-of-band
//! hub-register reads (hub identity, write protection, live sensor state)
//! are reported as explicitly unavailable rather than inferred.

use crate::codec::{self, FieldCodec};
use crate::constants::{DDR5_DECODE_MIN_SIZE, DDR5_RATE_STEP};
use crate::crc::{self, DDR5_BLOCKS};
use crate::decode::{labels, Attribute, ByteRange, DecodeOutput, SpdDecoder, TimingRow, SENTINEL};
use crate::ddr5::geometry::Ddr5Geometry;
use crate::ddr5::label;
use crate::detect::MemoryType;
use crate::manufacturers;

/// DDR5 module-type names from byte 3 bits 3-0.
static MODULE_TYPE_NAMES: &[(u8, &str)] = &[
    (0x01, "RDIMM"),
    (0x02, "UDIMM"),
    (0x03, "SO-DIMM"),
    (0x04, "LRDIMM"),
    (0x05, "Mini-RDIMM"),
    (0x06, "Mini-UDIMM"),
    (0x08, "72b-SO-RDIMM"),
    (0x09, "72b-SO-UDIMM"),
    (0x0A, "SO-UDIMM (16b non-ECC)"),
    (0x0B, "SO-DIMM (32b ECC)"),
    (0x0C, "SO-RDIMM (16b non-ECC)"),
    (0x0D, "SO-RDIMM (32b ECC)"),
    (0x0E, "SO-UDIMM (32b ECC)"),
    (0x0F, "SO-RDIMM (64b ECC)"),
];

pub struct Ddr5Decoder {
    data: Vec<u8>,
}

impl Ddr5Decoder {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    fn codec(&self) -> FieldCodec<'_> {
        FieldCodec::new(&self.data)
    }

    fn geometry(&self) -> Ddr5Geometry<'_> {
        Ddr5Geometry::new(&self.data)
    }

    /// tCKAVGmin: direct little-endian picosecond pair at bytes 20-21.
    fn tck_ns(&self) -> f64 {
        self.codec().timing16_ns(20)
    }

    fn data_rate(&self) -> u32 {
        codec::round_data_rate(self.tck_ns(), DDR5_RATE_STEP)
    }

    // ------------------------------------------------------------------
    // Module attributes
    // ------------------------------------------------------------------

    fn populate_module(&self, out: &mut Vec<Attribute>) {
        let codec = self.codec();

        // The continuation byte is stored second in the DDR5 layout.
        out.push(
            Attribute::new(
                labels::MANUFACTURER,
                manufacturers::manufacturer_name(codec.byte(513), codec.byte(512)),
            )
            .with_range(512, 2),
        );

        let part = codec.ascii_string(521, 550).trim().to_string();
        out.push(
            Attribute::new(
                labels::PART_NUMBER,
                if part.is_empty() { SENTINEL.into() } else { part },
            )
            .with_range(521, 30),
        );

        out.push(
            Attribute::new(labels::SERIAL_NUMBER, codec.serial_string(517, 520)).with_range(517, 4),
        );

        out.push(
            Attribute::new(
                labels::MANUFACTURING_DATE,
                codec.manufacturing_date_string(515, 516),
            )
            .with_range(515, 2),
        );

        out.push(
            Attribute::new(labels::MANUFACTURING_LOCATION, self.manufacturing_location())
                .with_range(514, 1),
        );

        out.push(
            Attribute::new(labels::DIMM_LABEL, label::build_label(&self.data, self.tck_ns()))
                .highlighted()
                .with_ranges(vec![
                    ByteRange::new(1, 1),
                    ByteRange::new(3, 1),
                    ByteRange::new(4, 2),
                    ByteRange::new(12, 2),
                    ByteRange::new(20, 2),
                    ByteRange::new(229, 2),
                    ByteRange::new(234, 2),
                ]),
        );

        out.push(Attribute::new(labels::ARCHITECTURE, self.module_type_text()).with_range(3, 1));

        out.push(
            Attribute::new(labels::SPEED_GRADE, self.speed_grade())
                .with_ranges(vec![ByteRange::new(20, 2)]),
        );

        out.push(
            Attribute::new(labels::CAPACITY, self.capacity_text()).with_ranges(vec![
                ByteRange::new(4, 2),
                ByteRange::new(12, 2),
                ByteRange::new(234, 2),
            ]),
        );

        out.push(
            Attribute::new(labels::ORGANIZATION, self.geometry().organization()).with_ranges(vec![
                ByteRange::new(12, 2),
                ByteRange::new(234, 2),
            ]),
        );

        out.push(
            Attribute::new(
                labels::THERMAL_SENSOR,
                if self.has_thermal_sensor() { "Present" } else { "Not present" },
            )
            .with_range(14, 1),
        );

        out.push(Attribute::new(labels::MODULE_HEIGHT, self.module_height()).with_range(229, 1));
        out.push(
            Attribute::new(labels::MODULE_THICKNESS, self.module_thickness()).with_range(230, 1),
        );

        out.push(Attribute::new(labels::SPD_REVISION, self.spd_revision()).with_range(1, 1));

        let report = crc::verify_block(&self.data, &DDR5_BLOCKS[0]);
        out.push(
            Attribute::new(labels::CRC, report.summary.clone()).with_ranges(report.ranges.clone()),
        );

        self.push_hub_attributes(out);
    }

    /// SPD hub device group. Everything beyond the device-type sniff needs
    /// out-of-band hub register reads that a static image cannot provide.
    fn push_hub_attributes(&self, out: &mut Vec<Attribute>) {
        out.push(Attribute::new("Hub Device Type", self.hub_device_type()).with_range(0, 2));
        out.push(Attribute::new(
            "Hub Manufacturer",
            "Undefined (requires hub register read)",
        ));
        out.push(Attribute::new(
            "Hub Model",
            "SPD5118 variant (requires hub register read)",
        ));
        out.push(
            Attribute::new(
                "Temperature Sensor",
                if self.has_thermal_sensor() {
                    "Incorporated (status requires hub read)"
                } else {
                    "Not Incorporated / N/A"
                },
            )
            .with_range(14, 1),
        );
        out.push(Attribute::new(
            "Write Protection",
            "Unknown (requires hub register read)",
        ));
    }

    // ------------------------------------------------------------------
    // DRAM attributes
    // ------------------------------------------------------------------

    fn populate_dram(&self, out: &mut Vec<Attribute>) {
        let codec = self.codec();

        out.push(
            Attribute::new(
                labels::MANUFACTURER,
                manufacturers::manufacturer_name(codec.byte(553), codec.byte(552)),
            )
            .with_range(552, 2),
        );

        out.push(Attribute::new(labels::PACKAGE, self.package_text()).with_range(6, 1));
        out.push(
            Attribute::new(labels::DIE_DENSITY_COUNT, self.die_density_text()).with_range(4, 2),
        );
        out.push(
            Attribute::new(labels::ADDRESSING, self.geometry().addressing()).with_range(4, 2),
        );
        out.push(Attribute::new(labels::INPUT_CLOCK, self.clock_frequency()));
        out.push(Attribute::new(labels::MIN_TIMINGS, self.min_timing_text()));
        out.push(
            Attribute::new(labels::READ_LATENCIES, self.read_latencies()).with_range(22, 10),
        );
        out.push(
            Attribute::new(labels::SUPPLY_VOLTAGE, self.supply_voltage()).with_range(11, 1),
        );

        // Extended timings (tRFC family is MTB-only, 16-bit).
        out.push(
            Attribute::new("tRFC1 (Refresh Normal)", self.extended_timing_text(43, None))
                .with_range(43, 2),
        );
        out.push(
            Attribute::new("tRFC2 (Refresh Fine)", self.extended_timing_text(45, None))
                .with_range(45, 2),
        );
        out.push(
            Attribute::new("tRFCsb (Refresh Same Bank)", self.extended_timing_text(47, None))
                .with_range(47, 2),
        );
        out.push(
            Attribute::new("tFAW (Four Activate Window)", self.extended_timing_text(36, Some(242)))
                .with_ranges(vec![ByteRange::new(36, 2), ByteRange::new(242, 1)]),
        );
        out.push(
            Attribute::new("tRTP (Read to Precharge)", self.mtb_timing_text(38, 243)).with_ranges(
                vec![ByteRange::new(38, 1), ByteRange::new(243, 1)],
            ),
        );
        out.push(
            Attribute::new("tWR (Write Recovery Time)", self.mtb_timing_text(42, 244))
                .with_ranges(vec![ByteRange::new(42, 1), ByteRange::new(244, 1)]),
        );

        out.push(
            Attribute::new("CAS Write Latencies", self.cas_write_latencies()).with_range(32, 4),
        );
        out.push(
            Attribute::new("Refresh Management", self.refresh_management()).with_range(9, 1),
        );

        if self.data.len() > 560 {
            out.push(
                Attribute::new("PMIC Manufacturer", self.pmic_manufacturer()).with_range(554, 2),
            );
            out.push(Attribute::new("PMIC Revision", self.pmic_revision()).with_range(556, 1));
        }
    }

    // ------------------------------------------------------------------
    // Timing rows
    // ------------------------------------------------------------------

    fn populate_timings(&self, out: &mut Vec<TimingRow>) {
        let codec = self.codec();
        let tck = self.tck_ns();
        if tck <= 0.0 {
            return;
        }

        let taa = codec.timing16_ns(30);
        let trcd = codec.timing16_ns(32);
        let trp = codec.timing16_ns(34);
        let tras = codec.timing16_ns(36);
        let trc = codec.timing16_ns(38);
        let tfaw = codec.extended16_ns(36, Some(242));
        let twr = codec.timing_ns(42, 244);

        let rate = self.data_rate();
        out.push(TimingRow {
            frequency: if rate == 0 { SENTINEL.into() } else { format!("{rate} MT/s") },
            cas: codec::format_timing_cell(taa, tck),
            rcd: codec::format_timing_cell(trcd, tck),
            rp: codec::format_timing_cell(trp, tck),
            ras: codec::format_timing_cell(tras, tck),
            rc: codec::format_timing_cell(trc, tck),
            faw: codec::format_timing_cell(tfaw, tck),
            rrd_s: SENTINEL.into(),
            rrd_l: SENTINEL.into(),
            wr: codec::format_timing_cell(twr, tck),
            wtr_s: SENTINEL.into(),
        });
    }

    // ------------------------------------------------------------------
    // Derivations
    // ------------------------------------------------------------------

    fn module_type_text(&self) -> String {
        if self.data.len() < 4 {
            return SENTINEL.into();
        }
        let base = self.data[3] & 0x0F;
        match MODULE_TYPE_NAMES.iter().find(|(code, _)| *code == base) {
            Some((_, name)) => format!("DDR5 SDRAM {name}"),
            None => format!("DDR5 SDRAM Unknown (0x{base:02X})"),
        }
    }

    fn speed_grade(&self) -> String {
        let rate = self.data_rate();
        if rate == 0 {
            return SENTINEL.into();
        }
        format!("DDR5-{rate}")
    }

    fn capacity_text(&self) -> String {
        let geometry = self.geometry();
        let bytes = geometry.module_capacity_bytes();
        if bytes == 0 {
            return SENTINEL.into();
        }
        let channels = geometry.channel_count();
        let size = codec::format_data_size(bytes);
        if channels > 1 {
            format!("{size} ({channels} channels)")
        } else {
            size
        }
    }

    fn has_thermal_sensor(&self) -> bool {
        self.data.get(14).is_some_and(|b| b & 0x80 != 0)
    }

    fn module_height(&self) -> String {
        match self.data.get(229) {
            Some(&b) => format!("{} mm", u32::from(b & 0x1F) + 15),
            None => SENTINEL.into(),
        }
    }

    fn module_thickness(&self) -> String {
        match self.data.get(230) {
            Some(&b) => {
                let front = 1.0 + f64::from(b & 0x0F) * 0.2;
                let back = 1.0 + f64::from((b >> 4) & 0x0F) * 0.2;
                format!("Front {front:.1} mm / Back {back:.1} mm")
            }
            None => SENTINEL.into(),
        }
    }

    fn spd_revision(&self) -> String {
        match self.data.get(1) {
            Some(&b) => format!("{}.{}", b >> 4, b & 0x0F),
            None => SENTINEL.into(),
        }
    }

    fn manufacturing_location(&self) -> String {
        match self.data.get(514) {
            Some(0) | None => SENTINEL.into(),
            Some(&code) => format!("0x{code:02X}"),
        }
    }

    fn hub_device_type(&self) -> String {
        if self.data.len() < 3 {
            return SENTINEL.into();
        }
        if self.data[2] == 0x12 || self.data[0] == 0x12 {
            "SPD5118 (or compatible)".into()
        } else {
            format!(
                "Unknown (byte 0=0x{:02X}, byte 2=0x{:02X})",
                self.data[0], self.data[2]
            )
        }
    }

    fn package_text(&self) -> String {
        let Some(&b) = self.data.get(6) else {
            return SENTINEL.into();
        };
        let die_count = ((b >> 5) & 0x7) + 1;
        let package_type = (b >> 2) & 0x7;
        let desc = match package_type {
            0 => "Monolithic".to_string(),
            1 => "Multi Load Stack (DDP)".to_string(),
            2 => "Single Load Stack (3DS)".to_string(),
            other => format!("Unknown (0x{other:X})"),
        };
        format!("{desc}, {die_count} die{}", if die_count > 1 { "s" } else { "" })
    }

    fn die_density_text(&self) -> String {
        if self.data.len() <= 4 {
            return SENTINEL.into();
        }
        let geometry = self.geometry();
        let density = geometry.density_gb();
        let dies = geometry.die_count();
        let die_text = if dies == 1 { "1 die".into() } else { format!("{dies} dies") };
        format!("{density} Gb / {die_text}")
    }

    fn clock_frequency(&self) -> String {
        let tck = self.tck_ns();
        if tck <= 0.0 {
            return SENTINEL.into();
        }
        let freq = f64::from(self.data_rate()) / 2.0;
        format!("{freq:.0} MHz ({tck:.3} ns)")
    }

    fn min_timing_text(&self) -> String {
        let codec = self.codec();
        let tck = self.tck_ns();
        if tck <= 0.0 {
            return SENTINEL.into();
        }

        let taa = codec.timing16_ns(30);
        let trcd = codec.timing16_ns(32);
        let trp = codec.timing16_ns(34);
        let tras = codec.timing16_ns(36);
        let trc = codec.timing16_ns(38);

        format!(
            "{:.0}-{:.0}-{:.0}-{:.0}-{:.0}",
            codec::timing_to_cycles(taa, tck),
            codec::timing_to_cycles(trcd, tck),
            codec::timing_to_cycles(trp, tck),
            codec::timing_to_cycles(tras, tck),
            codec::timing_to_cycles(trc, tck),
        )
    }

    /// CAS latencies from the 80-bit mask at bytes 22-31 (CL22 upward).
    fn read_latencies(&self) -> String {
        if self.data.len() < 32 {
            return SENTINEL.into();
        }

        let mut latencies = Vec::new();
        for (byte_index, &mask) in self.data[22..32].iter().enumerate() {
            for bit in 0..8 {
                if mask & (1 << bit) != 0 {
                    latencies.push(22 + byte_index * 8 + bit);
                }
            }
        }
        if latencies.is_empty() {
            return SENTINEL.into();
        }
        latencies.sort_unstable_by(|a, b| b.cmp(a));
        latencies
            .iter()
            .map(|l| format!("{l}T"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// CAS write latencies from the 32-bit mask at bytes 32-35 (CWL 22-53),
    /// top eight shown.
    fn cas_write_latencies(&self) -> String {
        if self.data.len() < 36 {
            return SENTINEL.into();
        }

        let mut latencies = Vec::new();
        for (byte_index, &mask) in self.data[32..36].iter().enumerate() {
            for bit in 0..8 {
                if mask & (1 << bit) != 0 {
                    let cwl = 22 + byte_index * 8 + bit;
                    if cwl <= 53 {
                        latencies.push(cwl);
                    }
                }
            }
        }
        if latencies.is_empty() {
            return SENTINEL.into();
        }
        latencies.sort_unstable_by(|a, b| b.cmp(a));
        latencies
            .iter()
            .take(8)
            .map(|l| format!("{l}T"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn supply_voltage(&self) -> String {
        let Some(&b) = self.data.get(11) else {
            return SENTINEL.into();
        };

        let vdd = match b & 0x7 {
            0 => "1.1 V (nominal)".to_string(),
            1 => "1.1 V (operable)".to_string(),
            2 => "1.1 V (endurant)".to_string(),
            other => format!("Unknown (0x{other:X})"),
        };
        let vpp = match (b >> 3) & 0x7 {
            0 => "1.8 V".to_string(),
            other => format!("Unknown (0x{other:X})"),
        };
        format!("Vdd/Vddq: {vdd}, Vpp: {vpp}")
    }

    fn refresh_management(&self) -> String {
        let Some(&b) = self.data.get(9) else {
            return SENTINEL.into();
        };

        let rate = match b & 0x7 {
            0 => "Normal (7.8 µs @ 85°C)".to_string(),
            1 => "2x (3.9 µs)".to_string(),
            2 => "4x (1.95 µs)".to_string(),
            other => format!("Reserved (0x{other:X})"),
        };
        let options = match (b >> 4) & 0x7 {
            0 => "Normal".to_string(),
            1 => "Extended Temperature".to_string(),
            2 => "Fine Granularity".to_string(),
            other => format!("Reserved (0x{other:X})"),
        };
        let raaimt = if b & 0x08 != 0 { ", RAAIMT" } else { "" };
        format!("{rate}, {options}{raaimt}")
    }

    fn pmic_manufacturer(&self) -> String {
        if self.data.len() <= 555 {
            return SENTINEL.into();
        }
        let lsb = self.data[554];
        let msb = self.data[555];
        if lsb == 0 && msb == 0 {
            return "Not programmed".into();
        }
        manufacturers::manufacturer_name(msb, lsb)
    }

    fn pmic_revision(&self) -> String {
        match self.data.get(556) {
            Some(0) => "Not programmed".into(),
            Some(&rev) => format!("0x{rev:02X}"),
            None => SENTINEL.into(),
        }
    }

    /// 16-bit MTB timing (optionally FTB-corrected) as a display string.
    fn extended_timing_text(&self, lsb_index: usize, ftb_index: Option<usize>) -> String {
        let ns = self.codec().extended16_ns(lsb_index, ftb_index);
        if ns <= 0.0 {
            return SENTINEL.into();
        }
        match ftb_index {
            Some(_) => format!("{ns:.3} ns"),
            None => format!("{ns:.2} ns"),
        }
    }

    /// Single-byte MTB + FTB timing as a display string.
    fn mtb_timing_text(&self, mtb_index: usize, ftb_index: usize) -> String {
        let ns = self.codec().timing_ns(mtb_index, ftb_index);
        if ns <= 0.0 {
            return SENTINEL.into();
        }
        format!("{ns:.3} ns")
    }
}

impl SpdDecoder for Ddr5Decoder {
    fn memory_type(&self) -> MemoryType {
        MemoryType::Ddr5
    }

    fn populate(&self) -> DecodeOutput {
        let mut out = DecodeOutput::default();

        if self.data.len() < DDR5_DECODE_MIN_SIZE {
            out.module.push(Attribute::new(
                "DDR5",
                format!(
                    "SPD dump is too short for DDR5 decoding. Minimum {DDR5_DECODE_MIN_SIZE} bytes required."
                ),
            ));
            return out;
        }

        self.populate_module(&mut out.module);
        self.populate_dram(&mut out.dram);
        self.populate_timings(&mut out.timings);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc;

    /// Plausible 16GB DDR5-5600 UDIMM image.
    fn udimm_image() -> Vec<u8> {
        let mut data = vec![0u8; 1024];
        data[0] = 0x30;
        data[1] = 0x10; // SPD 1.0
        data[2] = 0x12;
        data[3] = 0x02; // UDIMM
        data[4] = 0x04; // 16 Gb
        data[5] = 0b0000_0000;
        data[6] = 0b0010_0000; // x8
        data[11] = 0x00; // 1.1 V nominal, Vpp 1.8
        data[14] = 0x80; // thermal sensor
        data[20] = 0x65; // tCK = 0x0165 = 357 ps
        data[21] = 0x01;
        data[30] = 0x8E; // tAA = 0x408E? no: LE -> 0x??; set below
        data[31] = 0x3E; // tAA = 0x3E8E = 16014 ps ≈ 16 ns
        data[229] = 0x10;
        data[230] = 0x01;
        data[234] = 0; // 1 rank
        data[235] = 0b0000_0010; // 64-bit, 1 channel
        data[512] = 0xCE; // Samsung, code first
        data[513] = 0x80;
        data[515] = 0x23;
        data[516] = 0x15;
        data[521..529].copy_from_slice(b"M323R2GA");
        data[552] = 0xCE;
        data[553] = 0x80;
        crc::fix(&mut data, &crc::DDR5_BLOCKS);
        data
    }

    fn find<'a>(attrs: &'a [Attribute], label: &str) -> &'a Attribute {
        attrs
            .iter()
            .find(|a| a.label == label)
            .unwrap_or_else(|| panic!("missing attribute {label}"))
    }

    #[test]
    fn populate_never_fails_on_garbage() {
        for seed in [0u8, 0x5A, 0xFF] {
            let data: Vec<u8> = (0..1024).map(|i| (i as u8).wrapping_add(seed)).collect();
            let out = Ddr5Decoder::new(data).populate();
            assert!(!out.module.is_empty());
        }
    }

    #[test]
    fn short_buffer_yields_single_diagnostic() {
        let out = Ddr5Decoder::new(vec![0u8; 400]).populate();
        assert_eq!(out.module.len(), 1);
        assert!(out.module[0].value.contains("too short"));
    }

    #[test]
    fn module_attributes_decode() {
        let out = Ddr5Decoder::new(udimm_image()).populate();

        assert_eq!(find(&out.module, labels::MANUFACTURER).value, "Samsung");
        assert_eq!(find(&out.module, labels::PART_NUMBER).value, "M323R2GA");
        assert_eq!(
            find(&out.module, labels::ARCHITECTURE).value,
            "DDR5 SDRAM UDIMM"
        );
        assert_eq!(find(&out.module, labels::SPEED_GRADE).value, "DDR5-5600");
        assert_eq!(find(&out.module, labels::CAPACITY).value, "16 GB");
        assert_eq!(find(&out.module, labels::MODULE_HEIGHT).value, "31 mm");
        assert_eq!(
            find(&out.module, labels::MANUFACTURING_DATE).value,
            "Week 15, 2023"
        );
        assert!(find(&out.module, labels::CRC).value.contains("OK"));
    }

    #[test]
    fn hub_fields_are_explicitly_unavailable() {
        let out = Ddr5Decoder::new(udimm_image()).populate();
        assert_eq!(
            find(&out.module, "Hub Device Type").value,
            "SPD5118 (or compatible)"
        );
        assert!(find(&out.module, "Hub Manufacturer").value.contains("requires hub register read"));
        assert!(find(&out.module, "Write Protection").value.contains("requires hub register read"));
        assert!(find(&out.module, "Temperature Sensor")
            .value
            .starts_with("Incorporated"));
    }

    #[test]
    fn dram_attributes_decode() {
        let out = Ddr5Decoder::new(udimm_image()).populate();

        assert_eq!(find(&out.dram, labels::MANUFACTURER).value, "Samsung");
        assert_eq!(
            find(&out.dram, labels::PACKAGE).value,
            "Monolithic, 2 dies"
        );
        assert_eq!(
            find(&out.dram, labels::DIE_DENSITY_COUNT).value,
            "16 Gb / 1 die"
        );
        assert_eq!(
            find(&out.dram, labels::SUPPLY_VOLTAGE).value,
            "Vdd/Vddq: 1.1 V (nominal), Vpp: 1.8 V"
        );
        assert_eq!(find(&out.dram, "PMIC Manufacturer").value, "Not programmed");
    }

    #[test]
    fn timing_row_uses_direct_picoseconds() {
        let out = Ddr5Decoder::new(udimm_image()).populate();
        assert_eq!(out.timings.len(), 1);
        let row = &out.timings[0];
        assert_eq!(row.frequency, "5600 MT/s");
        // tAA = 16014 ps / 357 ps = 44.86 -> 44.9 cycles
        assert_eq!(row.cas, "44.9");
        assert_eq!(row.rrd_s, "—");
    }

    #[test]
    fn label_attribute_collapses_without_rate() {
        let mut data = udimm_image();
        data[20] = 0;
        data[21] = 0;
        let out = Ddr5Decoder::new(data).populate();
        assert_eq!(find(&out.module, labels::DIMM_LABEL).value, "—");
        assert_eq!(find(&out.module, labels::SPEED_GRADE).value, "—");
        // no timing rows without a clock
        assert!(out.timings.is_empty());
    }

    #[test]
    fn bad_crc_is_reported_non_fatally() {
        let mut data = udimm_image();
        data[510] ^= 0xFF;
        let out = Ddr5Decoder::new(data).populate();
        assert!(find(&out.module, labels::CRC).value.contains("BAD"));
        assert_eq!(find(&out.module, labels::MANUFACTURER).value, "Samsung");
    }
}
