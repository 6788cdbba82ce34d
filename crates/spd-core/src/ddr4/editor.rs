//! DDR4 edit facade: categorized fields, validation, and inverse byte
//! encodings with checksum repair.

use tracing::debug;

use crate::codec::extract_bits;
use crate::constants::{XMP_PROFILE1_OFFSET, XMP_PROFILE2_OFFSET};
use crate::crc::{self, DDR4_BLOCKS};
use crate::edit::{
    parse_bcd, parse_hex_u8, parse_hex_u16, parse_serial_hex, ByteChange, ChangeRecorder,
    ChoiceItem, EditCategory, EditField, EditFieldKind, FieldValues, SpdEditor, ValidationErrors,
};
use crate::manufacturers;

pub struct Ddr4Editor {
    data: Vec<u8>,
}

impl Ddr4Editor {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    fn byte(&self, index: usize) -> u8 {
        self.data.get(index).copied().unwrap_or(0)
    }

    fn has_xmp_header(&self) -> bool {
        crate::ddr4::xmp::has_header(&self.data)
    }

    fn xmp_profile_enabled(&self, profile: usize) -> bool {
        self.data.len() > 0x182 && self.data[0x182] & (1 << (profile - 1)) != 0
    }

    // ------------------------------------------------------------------
    // Field projection
    // ------------------------------------------------------------------

    fn manufacturer_choices(current: u16) -> Vec<ChoiceItem> {
        let mut items: Vec<ChoiceItem> = manufacturers::choices()
            .into_iter()
            .map(|(display, id)| ChoiceItem::new(display, format!("{id:04X}")))
            .collect();
        if !items.iter().any(|i| i.value == format!("{current:04X}")) {
            items.insert(
                0,
                ChoiceItem::new(
                    format!(
                        "{} (0x{current:04X})",
                        manufacturers::manufacturer_name((current >> 8) as u8, current as u8)
                    ),
                    format!("{current:04X}"),
                ),
            );
        }
        items
    }

    fn common_fields(&self, fields: &mut Vec<EditField>) {
        if self.data.len() > 321 {
            let id = (u16::from(self.byte(320)) << 8) | u16::from(self.byte(321));
            fields.push(
                EditField::new(
                    "ModuleManufacturer",
                    "Manufacturer",
                    format!("{id:04X}"),
                    EditFieldKind::Choice,
                    EditCategory::MemoryModule,
                )
                .tooltip("Bytes 320-321: JEDEC Manufacturer ID")
                .choices(Self::manufacturer_choices(id)),
            );
        }

        if self.data.len() > 348 {
            let codec = crate::codec::FieldCodec::new(&self.data);
            fields.push(
                EditField::new(
                    "ModulePartNumber",
                    "Part Number",
                    codec.ascii_string(329, 348).trim_end().to_string(),
                    EditFieldKind::Text,
                    EditCategory::MemoryModule,
                )
                .tooltip("Bytes 329-348: Module Part Number (ASCII, space-padded to 20 bytes)")
                .max_length(20),
            );
        }

        if self.data.len() > 328 {
            let serial: String =
                self.data[325..=328].iter().map(|b| format!("{b:02X}")).collect();
            fields.push(
                EditField::new(
                    "ModuleSerialNumber",
                    "Serial Number",
                    serial,
                    EditFieldKind::Text,
                    EditCategory::MemoryModule,
                )
                .tooltip("Bytes 325-328: Serial Number (4 bytes as 8 hex characters)")
                .max_length(8),
            );
        }

        if self.data.len() > 324 {
            let year = bcd_value(self.byte(323));
            let week = bcd_value(self.byte(324));

            let year_choices = (0..=99u8)
                .map(|y| ChoiceItem::new(format!("{} ({y:02})", 2000 + u32::from(y)), format!("{y:02}")))
                .collect();
            fields.push(
                EditField::new(
                    "ModuleYear",
                    "Manufacturing Year",
                    year.map(|y| format!("{y:02}")).unwrap_or_default(),
                    EditFieldKind::Choice,
                    EditCategory::MemoryModule,
                )
                .tooltip("Byte 323: Year (BCD, 00-99 = 2000-2099)")
                .choices(year_choices),
            );

            let week_choices = (1..=52u8)
                .map(|w| ChoiceItem::new(format!("Week {w:02}"), format!("{w:02}")))
                .collect();
            fields.push(
                EditField::new(
                    "ModuleWeek",
                    "Manufacturing Week",
                    week.map(|w| format!("{w:02}")).unwrap_or_default(),
                    EditFieldKind::Choice,
                    EditCategory::MemoryModule,
                )
                .tooltip("Byte 324: Week (BCD, 01-52)")
                .choices(week_choices),
            );
        }

        if self.data.len() > 322 {
            fields.push(
                EditField::new(
                    "ModuleLocation",
                    "Manufacturing Location",
                    format!("{:02X}", self.byte(322)),
                    EditFieldKind::Text,
                    EditCategory::MemoryModule,
                )
                .tooltip("Byte 322: Location Code (hex)")
                .max_length(2),
            );
        }

        if self.data.len() > 3 {
            fields.push(
                EditField::new(
                    "ModuleType",
                    "Module Type",
                    format!("0x{:02X}", self.byte(3) & 0x0F),
                    EditFieldKind::Choice,
                    EditCategory::MemoryModule,
                )
                .tooltip("Byte 3, bits 3-0: Module Type")
                .choices(vec![
                    ChoiceItem::new("Extended DIMM", "0x00"),
                    ChoiceItem::new("RDIMM", "0x01"),
                    ChoiceItem::new("UDIMM", "0x02"),
                    ChoiceItem::new("SO-DIMM", "0x03"),
                    ChoiceItem::new("LRDIMM", "0x04"),
                    ChoiceItem::new("Mini-RDIMM", "0x05"),
                    ChoiceItem::new("Mini-UDIMM", "0x06"),
                ]),
            );
        }

        if self.data.len() > 1 {
            fields.push(
                EditField::new(
                    "SpdRevisionMajor",
                    "SPD Revision (Major)",
                    format!("{:X}", self.byte(1) >> 4),
                    EditFieldKind::Text,
                    EditCategory::MemoryModule,
                )
                .tooltip("Byte 1, bits 7-4: encoding level")
                .max_length(1),
            );
            fields.push(
                EditField::new(
                    "SpdRevisionMinor",
                    "SPD Revision (Minor)",
                    format!("{:X}", self.byte(1) & 0x0F),
                    EditFieldKind::Text,
                    EditCategory::MemoryModule,
                )
                .tooltip("Byte 1, bits 3-0: additions level")
                .max_length(1),
            );
        }

        if self.data.len() > 2 {
            fields.push(
                EditField::new(
                    "MemoryType",
                    "Memory Type",
                    format!("0x{:02X}", self.byte(2)),
                    EditFieldKind::Choice,
                    EditCategory::MemoryModule,
                )
                .tooltip("Byte 2: Memory Type (read-only)")
                .read_only()
                .choices(vec![
                    ChoiceItem::new("DDR4 SDRAM", "0x0C"),
                    ChoiceItem::new("DDR5 SDRAM", "0x12"),
                ]),
            );
        }
    }

    fn density_fields(&self, fields: &mut Vec<EditField>) {
        if self.data.len() > 4 {
            fields.push(
                EditField::new(
                    "Density",
                    "Die Density",
                    (self.byte(4) & 0x0F).to_string(),
                    EditFieldKind::Choice,
                    EditCategory::DensityDie,
                )
                .tooltip("Byte 4, bits 3-0: density per die (0-7 standard, 8-9 3DS)")
                .choices(vec![
                    ChoiceItem::new("256 Mb", "0"),
                    ChoiceItem::new("512 Mb", "1"),
                    ChoiceItem::new("1 Gb", "2"),
                    ChoiceItem::new("2 Gb", "3"),
                    ChoiceItem::new("4 Gb", "4"),
                    ChoiceItem::new("8 Gb", "5"),
                    ChoiceItem::new("16 Gb", "6"),
                    ChoiceItem::new("32 Gb", "7"),
                    ChoiceItem::new("12 Gb (3DS)", "8"),
                    ChoiceItem::new("24 Gb (3DS)", "9"),
                ]),
            );
        }

        if self.data.len() > 6 {
            let package = self.byte(6);
            fields.push(
                EditField::new(
                    "PackageMonolithic",
                    "Package Type",
                    if package & 0x80 == 0 { "True" } else { "False" },
                    EditFieldKind::Choice,
                    EditCategory::DensityDie,
                )
                .tooltip("Byte 6, bit 7: 0 = Monolithic, 1 = Stacked")
                .choices(vec![
                    ChoiceItem::new("Monolithic", "True"),
                    ChoiceItem::new("Stacked", "False"),
                ]),
            );

            let die_choices = (0..=7u8)
                .map(|c| {
                    let n = c + 1;
                    ChoiceItem::new(
                        format!("{n} die{}", if n > 1 { "s" } else { "" }),
                        c.to_string(),
                    )
                })
                .collect();
            fields.push(
                EditField::new(
                    "PackageDieCount",
                    "Die Count",
                    extract_bits(package, 4, 3).to_string(),
                    EditFieldKind::Choice,
                    EditCategory::DensityDie,
                )
                .tooltip("Byte 6, bits 6-4: die count code (value + 1 dies)")
                .choices(die_choices),
            );
        }

        if self.data.len() > 5 {
            fields.push(
                EditField::new(
                    "Banks",
                    "Banks",
                    extract_bits(self.byte(4), 4, 2).to_string(),
                    EditFieldKind::Choice,
                    EditCategory::DensityDie,
                )
                .tooltip("Byte 4, bits 5-4: banks per group (0 = 4, 1 = 8)")
                .choices(vec![
                    ChoiceItem::new("4 banks", "0"),
                    ChoiceItem::new("8 banks", "1"),
                ]),
            );

            fields.push(
                EditField::new(
                    "BankGroups",
                    "Bank Groups",
                    extract_bits(self.byte(4), 6, 2).to_string(),
                    EditFieldKind::Choice,
                    EditCategory::DensityDie,
                )
                .tooltip("Byte 4, bits 7-6: bank groups (0 = none, 1 = 2, 2 = 4)")
                .choices(vec![
                    ChoiceItem::new("0 groups", "0"),
                    ChoiceItem::new("2 groups", "1"),
                    ChoiceItem::new("4 groups", "2"),
                ]),
            );

            fields.push(
                EditField::new(
                    "ColumnAddresses",
                    "Column Addresses",
                    extract_bits(self.byte(5), 0, 3).to_string(),
                    EditFieldKind::Choice,
                    EditCategory::DensityDie,
                )
                .tooltip("Byte 5, bits 2-0: column bits (code + 9)")
                .choices(vec![
                    ChoiceItem::new("9 bits", "0"),
                    ChoiceItem::new("10 bits", "1"),
                    ChoiceItem::new("11 bits", "2"),
                    ChoiceItem::new("12 bits", "3"),
                ]),
            );

            fields.push(
                EditField::new(
                    "RowAddresses",
                    "Row Addresses",
                    extract_bits(self.byte(5), 3, 3).to_string(),
                    EditFieldKind::Choice,
                    EditCategory::DensityDie,
                )
                .tooltip("Byte 5, bits 5-3: row bits (code + 12)")
                .choices(
                    (0..=6u8)
                        .map(|c| ChoiceItem::new(format!("{} bits", c + 12), c.to_string()))
                        .collect(),
                ),
            );
        }
    }

    fn timing_fields(&self, fields: &mut Vec<EditField>) {
        if self.data.len() <= 125 {
            return;
        }

        let mtb = |id: &str, label: &str, offset: usize, tooltip: &str| {
            EditField::new(id, label, self.byte(offset).to_string(), EditFieldKind::Text, EditCategory::Timing)
                .tooltip(tooltip)
        };
        let ftb = |id: &str, label: &str, offset: usize, tooltip: &str| {
            EditField::new(
                id,
                label,
                (self.byte(offset) as i8).to_string(),
                EditFieldKind::Text,
                EditCategory::Timing,
            )
            .tooltip(tooltip)
        };

        fields.push(mtb("TimingTckMtb", "tCK (Clock Period) MTB", 18, "Byte 18: tCK medium timebase"));
        fields.push(ftb("TimingTckFtb", "tCK (Clock Period) FTB", 125, "Byte 125: tCK fine timebase (signed)"));
        fields.push(mtb("TimingTaaMtb", "CAS Latency (tAA) MTB", 24, "Byte 24: tAA medium timebase"));
        fields.push(ftb("TimingTaaFtb", "CAS Latency (tAA) FTB", 123, "Byte 123: tAA fine timebase (signed)"));
        fields.push(mtb("TimingTrcdMtb", "tRCD MTB", 25, "Byte 25: tRCD medium timebase"));
        fields.push(ftb("TimingTrcdFtb", "tRCD FTB", 122, "Byte 122: tRCD fine timebase (signed)"));
        fields.push(mtb("TimingTrpMtb", "tRP MTB", 26, "Byte 26: tRP medium timebase"));
        fields.push(ftb("TimingTrpFtb", "tRP FTB", 121, "Byte 121: tRP fine timebase (signed)"));

        let tras = u32::from(self.byte(28)) | (u32::from(self.byte(27) & 0x0F) << 8);
        fields.push(
            EditField::new("TimingTras", "tRAS (composite)", tras.to_string(), EditFieldKind::Numeric, EditCategory::Timing)
                .tooltip("Byte 28 + byte 27 bits 3-0: tRAS in MTB ticks (0-4095)"),
        );

        let trc = u32::from(self.byte(29)) | (u32::from(self.byte(27) >> 4) << 8);
        fields.push(
            EditField::new("TimingTrc", "tRC (composite)", trc.to_string(), EditFieldKind::Numeric, EditCategory::Timing)
                .tooltip("Byte 29 + byte 27 bits 7-4: tRC in MTB ticks (0-4095)"),
        );
        fields.push(ftb("TimingTrcFtb", "tRC FTB", 120, "Byte 120: tRC fine timebase (signed)"));

        let tfaw = u32::from(self.byte(37)) | (u32::from(self.byte(36) & 0x0F) << 8);
        fields.push(
            EditField::new("TimingTfaw", "tFAW (composite)", tfaw.to_string(), EditFieldKind::Numeric, EditCategory::Timing)
                .tooltip("Byte 37 + byte 36 bits 3-0: tFAW in MTB ticks (0-4095)"),
        );

        fields.push(mtb("TimingTrrdSMtb", "tRRD_S MTB", 38, "Byte 38: tRRD_S medium timebase"));
        fields.push(ftb("TimingTrrdSFtb", "tRRD_S FTB", 119, "Byte 119: tRRD_S fine timebase (signed)"));
        fields.push(mtb("TimingTrrdLMtb", "tRRD_L MTB", 39, "Byte 39: tRRD_L medium timebase"));
        fields.push(ftb("TimingTrrdLFtb", "tRRD_L FTB", 118, "Byte 118: tRRD_L fine timebase (signed)"));
        fields.push(mtb("TimingCcdlMtb", "tCCD_L MTB", 40, "Byte 40: tCCD_L medium timebase"));
        fields.push(ftb("TimingCcdlFtb", "tCCD_L FTB", 117, "Byte 117: tCCD_L fine timebase (signed)"));

        let twr = u32::from(self.byte(42)) | (u32::from(self.byte(41) & 0x0F) << 8);
        fields.push(
            EditField::new("TimingTwr", "tWR (composite)", twr.to_string(), EditFieldKind::Numeric, EditCategory::Timing)
                .tooltip("Byte 42 + byte 41 bits 3-0: tWR in MTB ticks (0-4095)"),
        );

        let twtrs = u32::from(self.byte(44)) | (u32::from(self.byte(43) & 0x0F) << 8);
        fields.push(
            EditField::new("TimingTwtrs", "tWTR_S (composite)", twtrs.to_string(), EditFieldKind::Numeric, EditCategory::Timing)
                .tooltip("Byte 44 + byte 43 bits 3-0: tWTR_S in MTB ticks (0-4095)"),
        );
    }

    fn module_config_fields(&self, fields: &mut Vec<EditField>) {
        if self.data.len() > 13 {
            fields.push(
                EditField::new(
                    "ModuleRanks",
                    "Number of Ranks",
                    (u32::from(extract_bits(self.byte(12), 3, 3)) + 1).to_string(),
                    EditFieldKind::Numeric,
                    EditCategory::ModuleConfig,
                )
                .tooltip("Byte 12, bits 5-3: package ranks (1-8)"),
            );

            fields.push(
                EditField::new(
                    "DeviceWidth",
                    "Device Width (bits)",
                    (4u32 << extract_bits(self.byte(12), 0, 3)).to_string(),
                    EditFieldKind::Numeric,
                    EditCategory::ModuleConfig,
                )
                .tooltip("Byte 12, bits 2-0: SDRAM width (4, 8, 16, 32)"),
            );

            fields.push(
                EditField::new(
                    "PrimaryBusWidth",
                    "Primary Bus Width (bits)",
                    (8u32 << extract_bits(self.byte(13), 0, 3)).to_string(),
                    EditFieldKind::Numeric,
                    EditCategory::ModuleConfig,
                )
                .tooltip("Byte 13, bits 2-0: primary bus width (8, 16, 32, 64)"),
            );

            fields.push(
                EditField::new(
                    "HasEcc",
                    "ECC Support",
                    if self.byte(13) & 0x08 != 0 { "True" } else { "False" },
                    EditFieldKind::Flag,
                    EditCategory::ModuleConfig,
                )
                .tooltip("Byte 13, bit 3: bus width extension"),
            );

            fields.push(
                EditField::new(
                    "RankMix",
                    "Rank Mix",
                    if self.byte(12) & 0x40 != 0 { "True" } else { "False" },
                    EditFieldKind::Choice,
                    EditCategory::ModuleConfig,
                )
                .tooltip("Byte 12, bit 6: 0 = symmetrical, 1 = asymmetrical")
                .choices(vec![
                    ChoiceItem::new("Symmetrical", "False"),
                    ChoiceItem::new("Asymmetrical", "True"),
                ]),
            );
        }

        if self.data.len() > 14 {
            fields.push(
                EditField::new(
                    "ThermalSensor",
                    "Thermal Sensor",
                    if self.byte(14) & 0x80 != 0 { "True" } else { "False" },
                    EditFieldKind::Flag,
                    EditCategory::ModuleConfig,
                )
                .tooltip("Byte 14, bit 7: thermal sensor present"),
            );
        }

        if self.data.len() > 11 {
            fields.push(
                EditField::new(
                    "SupplyVoltageOperable",
                    "Supply Voltage Operable",
                    if self.byte(11) & 0x01 != 0 { "True" } else { "False" },
                    EditFieldKind::Flag,
                    EditCategory::ModuleConfig,
                )
                .tooltip("Byte 11, bit 0: 1.2 V operable"),
            );
        }

        if self.data.len() > 351 {
            let id = (u16::from(self.byte(350)) << 8) | u16::from(self.byte(351));
            fields.push(
                EditField::new(
                    "DramManufacturer",
                    "DRAM Manufacturer",
                    format!("{id:04X}"),
                    EditFieldKind::Choice,
                    EditCategory::DramComponents,
                )
                .tooltip("Bytes 350-351: JEDEC Manufacturer ID")
                .choices(Self::manufacturer_choices(id)),
            );
        }
    }

    fn xmp_fields(&self, fields: &mut Vec<EditField>, profile: usize, base: usize) {
        if self.data.len() < base + 47 || !self.xmp_profile_enabled(profile) {
            return;
        }

        let prefix = format!("XMP{profile}_");
        let category = EditCategory::Xmp;

        let voltage_byte = self.byte(base);
        let voltage = u32::from(voltage_byte >> 7) * 100 + u32::from(voltage_byte & 0x7F);
        fields.push(
            EditField::new(
                format!("{prefix}Voltage"),
                format!("XMP Profile {profile} - Voltage (hundredths)"),
                voltage.to_string(),
                EditFieldKind::Numeric,
                category,
            )
            .tooltip("Voltage in hundredths of a volt (0-227 = 0.00-2.27 V)"),
        );

        let byte_field = |id: String, label: String, offset: usize| {
            EditField::new(id, label, self.byte(offset).to_string(), EditFieldKind::Numeric, category)
                .tooltip(format!("Profile offset {}: MTB ticks", offset - base))
        };
        let fc_field = |id: String, label: String, offset: usize| {
            EditField::new(
                id,
                label,
                (self.byte(offset) as i8).to_string(),
                EditFieldKind::Numeric,
                category,
            )
            .tooltip(format!("Profile offset {}: fine correction in ps", offset - base))
        };

        fields.push(byte_field(
            format!("{prefix}SDRAMCycleTicks"),
            format!("XMP Profile {profile} - tCK (MTB ticks)"),
            base + 3,
        ));
        fields.push(fc_field(
            format!("{prefix}SDRAMCycleTimeFC"),
            format!("XMP Profile {profile} - tCK FC (ps)"),
            base + 38,
        ));

        for i in 0..3usize {
            fields.push(
                EditField::new(
                    format!("{prefix}CLSupported{i}"),
                    format!("XMP Profile {profile} - CL Support Byte {i}"),
                    format!("{:02X}", self.byte(base + 4 + i)),
                    EditFieldKind::Text,
                    category,
                )
                .tooltip("Supported CAS latency bitmask byte (hex)")
                .max_length(2),
            );
        }

        fields.push(byte_field(
            format!("{prefix}CLTicks"),
            format!("XMP Profile {profile} - tAA (MTB ticks)"),
            base + 8,
        ));
        fields.push(fc_field(
            format!("{prefix}CLFC"),
            format!("XMP Profile {profile} - tAA FC (ps)"),
            base + 37,
        ));
        fields.push(byte_field(
            format!("{prefix}RCDTicks"),
            format!("XMP Profile {profile} - tRCD (MTB ticks)"),
            base + 9,
        ));
        fields.push(fc_field(
            format!("{prefix}RCDFC"),
            format!("XMP Profile {profile} - tRCD FC (ps)"),
            base + 36,
        ));
        fields.push(byte_field(
            format!("{prefix}RPTicks"),
            format!("XMP Profile {profile} - tRP (MTB ticks)"),
            base + 10,
        ));
        fields.push(fc_field(
            format!("{prefix}RPFC"),
            format!("XMP Profile {profile} - tRP FC (ps)"),
            base + 35,
        ));

        let ras = u32::from(self.byte(base + 12)) | (u32::from(self.byte(base + 11) & 0x0F) << 8);
        fields.push(
            EditField::new(
                format!("{prefix}RASTicks"),
                format!("XMP Profile {profile} - tRAS (MTB ticks)"),
                ras.to_string(),
                EditFieldKind::Numeric,
                category,
            )
            .tooltip("Composite tRAS ticks (0-4095)"),
        );

        let rc = u32::from(self.byte(base + 13)) | (u32::from(self.byte(base + 11) >> 4) << 8);
        fields.push(
            EditField::new(
                format!("{prefix}RCTicks"),
                format!("XMP Profile {profile} - tRC (MTB ticks)"),
                rc.to_string(),
                EditFieldKind::Numeric,
                category,
            )
            .tooltip("Composite tRC ticks (0-4095)"),
        );
        fields.push(fc_field(
            format!("{prefix}RCFC"),
            format!("XMP Profile {profile} - tRC FC (ps)"),
            base + 34,
        ));

        for (name, offset) in [("RFC1Ticks", 14usize), ("RFC2Ticks", 16), ("RFC4Ticks", 18)] {
            let ticks =
                u32::from(self.byte(base + offset)) | (u32::from(self.byte(base + offset + 1)) << 8);
            fields.push(
                EditField::new(
                    format!("{prefix}{name}"),
                    format!("XMP Profile {profile} - t{} (MTB ticks)", &name[..4]),
                    ticks.to_string(),
                    EditFieldKind::Numeric,
                    category,
                )
                .tooltip("16-bit refresh timing in MTB ticks (0-65535)"),
            );
        }

        let faw = u32::from(self.byte(base + 21)) | (u32::from(self.byte(base + 20) & 0x0F) << 8);
        fields.push(
            EditField::new(
                format!("{prefix}FAWTicks"),
                format!("XMP Profile {profile} - tFAW (MTB ticks)"),
                faw.to_string(),
                EditFieldKind::Numeric,
                category,
            )
            .tooltip("Composite tFAW ticks (0-4095)"),
        );

        fields.push(byte_field(
            format!("{prefix}RRDSTicks"),
            format!("XMP Profile {profile} - tRRD_S (MTB ticks)"),
            base + 22,
        ));
        fields.push(fc_field(
            format!("{prefix}RRDSFC"),
            format!("XMP Profile {profile} - tRRD_S FC (ps)"),
            base + 33,
        ));
        fields.push(byte_field(
            format!("{prefix}RRDLTicks"),
            format!("XMP Profile {profile} - tRRD_L (MTB ticks)"),
            base + 23,
        ));
        fields.push(fc_field(
            format!("{prefix}RRDLFC"),
            format!("XMP Profile {profile} - tRRD_L FC (ps)"),
            base + 32,
        ));
    }

    // ------------------------------------------------------------------
    // Apply helpers (free of `self`: they only see the recorder's buffer)
    // ------------------------------------------------------------------

    fn apply_common(rec: &mut ChangeRecorder<'_>, values: &FieldValues) {
        if let Some(id) = values.get("ModuleManufacturer").and_then(|v| parse_hex_u16(v)) {
            rec.set_bytes(320, &[(id >> 8) as u8, id as u8]);
        }

        if let Some(part) = values.get("ModulePartNumber") {
            let mut bytes = [b' '; 20];
            for (slot, ch) in bytes.iter_mut().zip(part.chars()) {
                if ch.is_ascii() && !ch.is_ascii_control() {
                    *slot = ch as u8;
                }
            }
            rec.set_bytes(329, &bytes);
        }

        if let Some(serial) = values.get("ModuleSerialNumber") {
            if let Some(bytes) = parse_serial_hex(serial) {
                rec.set_bytes(325, &bytes);
            }
        }

        if let Some(year) = values.get("ModuleYear").and_then(|v| parse_bcd(v)) {
            rec.set_byte(323, year);
        }
        if let Some(week) = values.get("ModuleWeek").and_then(|v| parse_bcd(v)) {
            rec.set_byte(324, week);
        }
        if let Some(location) = values.get("ModuleLocation").and_then(|v| parse_hex_u8(v)) {
            rec.set_byte(322, location);
        }
        if let Some(module_type) = values.get("ModuleType").and_then(|v| parse_hex_u8(v)) {
            rec.set_bits(3, 0x0F, module_type);
        }

        let major = values.get("SpdRevisionMajor").and_then(|v| parse_hex_u8(v));
        let minor = values.get("SpdRevisionMinor").and_then(|v| parse_hex_u8(v));
        if let (Some(major), Some(minor)) = (major, minor) {
            rec.set_byte(1, (major << 4) | (minor & 0x0F));
        }
    }

    fn apply_density(rec: &mut ChangeRecorder<'_>, values: &FieldValues) {
        if let Some(code) = parse_range(values, "Density", 0, 9) {
            rec.set_bits(4, 0x0F, code as u8);
        }
        if let Some(code) = parse_range(values, "Banks", 0, 1) {
            rec.set_bits(4, 0x30, (code as u8) << 4);
        }
        if let Some(code) = parse_range(values, "BankGroups", 0, 2) {
            rec.set_bits(4, 0xC0, (code as u8) << 6);
        }
        if let Some(code) = parse_range(values, "ColumnAddresses", 0, 3) {
            rec.set_bits(5, 0x07, code as u8);
        }
        if let Some(code) = parse_range(values, "RowAddresses", 0, 6) {
            rec.set_bits(5, 0x38, (code as u8) << 3);
        }
        if let Some(code) = parse_range(values, "PackageDieCount", 0, 7) {
            rec.set_bits(6, 0x70, (code as u8) << 4);
        }
        if let Some(text) = values.get("PackageMonolithic") {
            let monolithic = text.eq_ignore_ascii_case("true");
            rec.set_bits(6, 0x80, if monolithic { 0x00 } else { 0x80 });
        }
    }

    fn apply_timings(rec: &mut ChangeRecorder<'_>, values: &FieldValues) {
        let mtb_writes: [(&str, usize); 7] = [
            ("TimingTckMtb", 18),
            ("TimingTaaMtb", 24),
            ("TimingTrcdMtb", 25),
            ("TimingTrpMtb", 26),
            ("TimingTrrdSMtb", 38),
            ("TimingTrrdLMtb", 39),
            ("TimingCcdlMtb", 40),
        ];
        for (id, offset) in mtb_writes {
            if let Some(ticks) = values.get(id).and_then(|v| v.trim().parse::<u8>().ok()) {
                rec.set_byte(offset, ticks);
            }
        }

        let ftb_writes: [(&str, usize); 8] = [
            ("TimingTckFtb", 125),
            ("TimingTaaFtb", 123),
            ("TimingTrcdFtb", 122),
            ("TimingTrpFtb", 121),
            ("TimingTrcFtb", 120),
            ("TimingTrrdSFtb", 119),
            ("TimingTrrdLFtb", 118),
            ("TimingCcdlFtb", 117),
        ];
        for (id, offset) in ftb_writes {
            if let Some(fc) = values.get(id).and_then(|v| v.trim().parse::<i8>().ok()) {
                rec.set_byte(offset, fc as u8);
            }
        }

        if let Some(ticks) = parse_range(values, "TimingTras", 0, 4095) {
            rec.set_byte(28, ticks as u8);
            rec.set_bits(27, 0x0F, (ticks >> 8) as u8);
        }
        if let Some(ticks) = parse_range(values, "TimingTrc", 0, 4095) {
            rec.set_byte(29, ticks as u8);
            rec.set_bits(27, 0xF0, ((ticks >> 8) as u8) << 4);
        }
        if let Some(ticks) = parse_range(values, "TimingTfaw", 0, 4095) {
            rec.set_byte(37, ticks as u8);
            rec.set_bits(36, 0x0F, (ticks >> 8) as u8);
        }
        if let Some(ticks) = parse_range(values, "TimingTwr", 0, 4095) {
            rec.set_byte(42, ticks as u8);
            rec.set_bits(41, 0x0F, (ticks >> 8) as u8);
        }
        if let Some(ticks) = parse_range(values, "TimingTwtrs", 0, 4095) {
            rec.set_byte(44, ticks as u8);
            rec.set_bits(43, 0x0F, (ticks >> 8) as u8);
        }
    }

    fn apply_module_config(rec: &mut ChangeRecorder<'_>, values: &FieldValues) {
        if let Some(ranks) = parse_range(values, "ModuleRanks", 1, 8) {
            rec.set_bits(12, 0x38, ((ranks - 1) as u8) << 3);
        }

        if let Some(width) = values.get("DeviceWidth").and_then(|v| v.trim().parse::<u32>().ok()) {
            if let Some(code) = device_width_code(width) {
                rec.set_bits(12, 0x07, code);
            }
        }

        if let Some(width) = values.get("PrimaryBusWidth").and_then(|v| v.trim().parse::<u32>().ok())
        {
            if let Some(code) = bus_width_code(width) {
                rec.set_bits(13, 0x07, code);
            }
        }

        if let Some(text) = values.get("HasEcc") {
            let ecc = text.eq_ignore_ascii_case("true");
            rec.set_bits(13, 0x08, if ecc { 0x08 } else { 0x00 });
        }
        if let Some(text) = values.get("RankMix") {
            let asymmetrical = text.eq_ignore_ascii_case("true");
            rec.set_bits(12, 0x40, if asymmetrical { 0x40 } else { 0x00 });
        }
        if let Some(text) = values.get("ThermalSensor") {
            let present = text.eq_ignore_ascii_case("true");
            rec.set_bits(14, 0x80, if present { 0x80 } else { 0x00 });
        }
        if let Some(text) = values.get("SupplyVoltageOperable") {
            if !text.trim().is_empty() {
                let operable = text.eq_ignore_ascii_case("true");
                rec.set_bits(11, 0x01, if operable { 0x01 } else { 0x00 });
            }
        }

        if let Some(id) = values.get("DramManufacturer").and_then(|v| parse_hex_u16(v)) {
            rec.set_bytes(350, &[(id >> 8) as u8, id as u8]);
        }
    }

    fn apply_xmp(rec: &mut ChangeRecorder<'_>, values: &FieldValues, profile: usize, base: usize) {
        if rec.data().len() < base + 47 {
            return;
        }
        let prefix = format!("XMP{profile}_");
        let get = |name: &str| values.get(&format!("{prefix}{name}"));

        if let Some(voltage) = get("Voltage").and_then(|v| v.trim().parse::<u32>().ok()) {
            if voltage <= 227 {
                let integer = if voltage >= 100 { 0x80u8 } else { 0 };
                let hundredths = if voltage >= 100 { voltage - 100 } else { voltage } as u8;
                rec.set_byte(base, integer | (hundredths & 0x7F));
            }
        }

        let byte_writes: [(&str, usize); 5] = [
            ("SDRAMCycleTicks", 3),
            ("CLTicks", 8),
            ("RCDTicks", 9),
            ("RPTicks", 10),
            ("RRDSTicks", 22),
        ];
        for (name, offset) in byte_writes {
            if let Some(ticks) = get(name).and_then(|v| v.trim().parse::<u8>().ok()) {
                rec.set_byte(base + offset, ticks);
            }
        }
        if let Some(ticks) = get("RRDLTicks").and_then(|v| v.trim().parse::<u8>().ok()) {
            rec.set_byte(base + 23, ticks);
        }

        let fc_writes: [(&str, usize); 7] = [
            ("SDRAMCycleTimeFC", 38),
            ("CLFC", 37),
            ("RCDFC", 36),
            ("RPFC", 35),
            ("RCFC", 34),
            ("RRDSFC", 33),
            ("RRDLFC", 32),
        ];
        for (name, offset) in fc_writes {
            if let Some(fc) = get(name).and_then(|v| v.trim().parse::<i8>().ok()) {
                rec.set_byte(base + offset, fc as u8);
            }
        }

        for i in 0..3usize {
            if let Some(mask) = get(&format!("CLSupported{i}")).and_then(|v| parse_hex_u8(v)) {
                rec.set_byte(base + 4 + i, mask);
            }
        }

        if let Some(ticks) = get("RASTicks").and_then(|v| v.trim().parse::<u32>().ok()) {
            if ticks <= 4095 {
                rec.set_byte(base + 12, ticks as u8);
                rec.set_bits(base + 11, 0x0F, (ticks >> 8) as u8);
            }
        }
        if let Some(ticks) = get("RCTicks").and_then(|v| v.trim().parse::<u32>().ok()) {
            if ticks <= 4095 {
                rec.set_byte(base + 13, ticks as u8);
                rec.set_bits(base + 11, 0xF0, ((ticks >> 8) as u8) << 4);
            }
        }
        if let Some(ticks) = get("FAWTicks").and_then(|v| v.trim().parse::<u32>().ok()) {
            if ticks <= 4095 {
                rec.set_byte(base + 21, ticks as u8);
                rec.set_bits(base + 20, 0x0F, (ticks >> 8) as u8);
            }
        }

        for (name, offset) in [("RFC1Ticks", 14usize), ("RFC2Ticks", 16), ("RFC4Ticks", 18)] {
            if let Some(ticks) = get(name).and_then(|v| v.trim().parse::<u16>().ok()) {
                rec.set_bytes(base + offset, &ticks.to_le_bytes());
            }
        }
    }

    // ------------------------------------------------------------------
    // Validation helpers
    // ------------------------------------------------------------------

    fn validate_xmp(&self, values: &FieldValues, errors: &mut ValidationErrors, profile: usize) {
        let prefix = format!("XMP{profile}_");
        let get = |name: &str| values.get(&format!("{prefix}{name}"));

        if let Some(text) = get("Voltage") {
            if !text.trim().is_empty()
                && !text.trim().parse::<u32>().is_ok_and(|v| v <= 227)
            {
                errors.insert(format!("{prefix}Voltage"), "Voltage must be 0-227 (0.00-2.27 V)".into());
            }
        }

        for name in ["SDRAMCycleTicks", "CLTicks", "RCDTicks", "RPTicks", "RRDSTicks", "RRDLTicks"] {
            if let Some(text) = get(name) {
                if !text.trim().is_empty() && text.trim().parse::<u8>().is_err() {
                    errors.insert(format!("{prefix}{name}"), "Must be 0-255".into());
                }
            }
        }

        for name in ["SDRAMCycleTimeFC", "CLFC", "RCDFC", "RPFC", "RCFC", "RRDSFC", "RRDLFC"] {
            if let Some(text) = get(name) {
                if !text.trim().is_empty()
                    && !text.trim().parse::<i8>().is_ok_and(|v| v > i8::MIN)
                {
                    errors.insert(
                        format!("{prefix}{name}"),
                        "Fine correction must be -127 to +127".into(),
                    );
                }
            }
        }

        for name in ["RASTicks", "RCTicks", "FAWTicks"] {
            if let Some(text) = get(name) {
                if !text.trim().is_empty()
                    && !text.trim().parse::<u32>().is_ok_and(|v| v <= 4095)
                {
                    errors.insert(format!("{prefix}{name}"), "Must be 0-4095".into());
                }
            }
        }

        for name in ["RFC1Ticks", "RFC2Ticks", "RFC4Ticks"] {
            if let Some(text) = get(name) {
                if !text.trim().is_empty() && text.trim().parse::<u16>().is_err() {
                    errors.insert(format!("{prefix}{name}"), "Must be 0-65535".into());
                }
            }
        }

        for i in 0..3usize {
            if let Some(text) = get(&format!("CLSupported{i}")) {
                if !text.trim().is_empty() && parse_hex_u8(text).is_none() {
                    errors.insert(
                        format!("{prefix}CLSupported{i}"),
                        "Must be a hex byte (00-FF)".into(),
                    );
                }
            }
        }
    }
}

impl Default for Ddr4Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl SpdEditor for Ddr4Editor {
    fn load_data(&mut self, data: &[u8]) {
        self.data = data.to_vec();
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn edit_fields(&self) -> Vec<EditField> {
        let mut fields = Vec::new();
        if self.data.len() < 256 {
            return fields;
        }

        self.common_fields(&mut fields);
        self.density_fields(&mut fields);
        self.timing_fields(&mut fields);
        self.module_config_fields(&mut fields);

        if self.has_xmp_header() {
            self.xmp_fields(&mut fields, 1, XMP_PROFILE1_OFFSET);
            self.xmp_fields(&mut fields, 2, XMP_PROFILE2_OFFSET);
        }

        fields
    }

    fn validate_fields(&self, values: &FieldValues) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        for (id, limit) in [("ModuleYear", 99u8), ("ModuleWeek", 52)] {
            if let Some(text) = values.get(id) {
                if !text.trim().is_empty() {
                    let valid = text
                        .trim()
                        .parse::<u8>()
                        .is_ok_and(|v| v <= limit && (id != "ModuleWeek" || v >= 1));
                    if !valid {
                        errors.insert(id.into(), format!("Invalid BCD value (max {limit})"));
                    }
                }
            }
        }

        if let Some(text) = values.get("ModulePartNumber") {
            if text.len() > 20 {
                errors.insert("ModulePartNumber".into(), "Part number is limited to 20 characters".into());
            }
        }

        if let Some(text) = values.get("ModuleSerialNumber") {
            if !text.trim().is_empty() && parse_serial_hex(text).is_none() {
                errors.insert(
                    "ModuleSerialNumber".into(),
                    "Serial number must be up to 8 hex characters (even length)".into(),
                );
            }
        }

        if let Some(text) = values.get("ModuleLocation") {
            if !text.trim().is_empty() && parse_hex_u8(text).is_none() {
                errors.insert("ModuleLocation".into(), "Location must be a hex byte".into());
            }
        }

        if let Some(text) = values.get("Density") {
            if !text.trim().is_empty() && !text.trim().parse::<u8>().is_ok_and(|v| v <= 9) {
                errors.insert("Density".into(), "Density code must be 0-9".into());
            }
        }

        if let Some(text) = values.get("PackageDieCount") {
            if !text.trim().is_empty() && !text.trim().parse::<u8>().is_ok_and(|v| v <= 7) {
                errors.insert("PackageDieCount".into(), "Die count code must be 0-7".into());
            }
        }

        if let Some(text) = values.get("ModuleRanks") {
            if !text.trim().is_empty()
                && !text.trim().parse::<u32>().is_ok_and(|v| (1..=8).contains(&v))
            {
                errors.insert("ModuleRanks".into(), "Ranks must be 1-8".into());
            }
        }

        if let Some(text) = values.get("DeviceWidth") {
            if !text.trim().is_empty()
                && !text.trim().parse::<u32>().is_ok_and(|v| device_width_code(v).is_some())
            {
                errors.insert("DeviceWidth".into(), "Device width must be 4, 8, 16, or 32".into());
            }
        }

        if let Some(text) = values.get("PrimaryBusWidth") {
            if !text.trim().is_empty()
                && !text.trim().parse::<u32>().is_ok_and(|v| bus_width_code(v).is_some())
            {
                errors.insert(
                    "PrimaryBusWidth".into(),
                    "Primary bus width must be 8, 16, 32, or 64".into(),
                );
            }
        }

        for id in ["TimingTras", "TimingTrc", "TimingTfaw", "TimingTwr", "TimingTwtrs"] {
            if let Some(text) = values.get(id) {
                if !text.trim().is_empty()
                    && !text.trim().parse::<u32>().is_ok_and(|v| v <= 4095)
                {
                    errors.insert(id.into(), "Composite timing must be 0-4095 ticks".into());
                }
            }
        }

        self.validate_xmp(values, &mut errors, 1);
        self.validate_xmp(values, &mut errors, 2);

        errors
    }

    fn apply_changes(&mut self, values: &FieldValues) -> Vec<ByteChange> {
        let errors = self.validate_fields(values);
        if !errors.is_empty() {
            debug!(errors = errors.len(), "apply aborted by validation");
            return Vec::new();
        }

        let has_xmp = self.has_xmp_header();
        let mut rec = ChangeRecorder::new(&mut self.data);

        // Field writes first, checksum repair last.
        Self::apply_common(&mut rec, values);
        Self::apply_density(&mut rec, values);
        Self::apply_timings(&mut rec, values);
        Self::apply_module_config(&mut rec, values);
        if has_xmp {
            Self::apply_xmp(&mut rec, values, 1, XMP_PROFILE1_OFFSET);
            Self::apply_xmp(&mut rec, values, 2, XMP_PROFILE2_OFFSET);
        }

        for block in &DDR4_BLOCKS {
            if rec.data().len() >= block.data_start + block.data_len
                && rec.data().len() >= block.stored_at + 2
            {
                let calculated =
                    crc::compute(&rec.data()[block.data_start..block.data_start + block.data_len]);
                rec.set_bytes(block.stored_at, &calculated.to_le_bytes());
            }
        }

        rec.into_changes()
    }
}

fn bcd_value(byte: u8) -> Option<u8> {
    if byte == 0 || byte == 0xFF {
        return None;
    }
    let tens = byte >> 4;
    let ones = byte & 0x0F;
    if tens > 9 || ones > 9 {
        return None;
    }
    Some(tens * 10 + ones)
}

fn parse_range(values: &FieldValues, id: &str, min: u32, max: u32) -> Option<u32> {
    values
        .get(id)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| (min..=max).contains(v))
}

fn device_width_code(width: u32) -> Option<u8> {
    match width {
        4 => Some(0),
        8 => Some(1),
        16 => Some(2),
        32 => Some(3),
        _ => None,
    }
}

fn bus_width_code(width: u32) -> Option<u8> {
    match width {
        8 => Some(0),
        16 => Some(1),
        32 => Some(2),
        64 => Some(3),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc;
    use crate::edit::FieldValues;

    fn image() -> Vec<u8> {
        let mut data = vec![0u8; 512];
        data[1] = 0x12;
        data[2] = 0x0C;
        data[3] = 0x02;
        data[4] = 0x04;
        data[5] = 0b0001_0010;
        data[12] = 0b0000_1001;
        data[13] = 0b0000_0011;
        data[18] = 5;
        data[320] = 0x80;
        data[321] = 0xCE;
        data[329..337].copy_from_slice(b"M378A1K4");
        crc::fix(&mut data, &crc::DDR4_BLOCKS);
        data
    }

    fn editor() -> Ddr4Editor {
        let mut ed = Ddr4Editor::new();
        ed.load_data(&image());
        ed
    }

    #[test]
    fn fields_are_projected_by_category() {
        let ed = editor();
        let fields = ed.edit_fields();
        assert!(fields.iter().any(|f| f.id == "ModuleManufacturer"));
        assert!(fields.iter().any(|f| f.id == "TimingTckMtb"));
        assert!(fields.iter().any(|f| f.id == "ModuleRanks"));
        // No XMP header -> no XMP fields
        assert!(!fields.iter().any(|f| f.id.starts_with("XMP")));

        let part = fields.iter().find(|f| f.id == "ModulePartNumber").unwrap();
        assert_eq!(part.value, "M378A1K4");
        assert_eq!(part.max_length, Some(20));

        let mem_type = fields.iter().find(|f| f.id == "MemoryType").unwrap();
        assert!(mem_type.read_only);
    }

    #[test]
    fn out_of_range_value_rejected_and_apply_returns_nothing() {
        let mut ed = editor();
        let mut values = FieldValues::new();
        values.insert("Density".into(), "12".into());

        let errors = ed.validate_fields(&values);
        assert!(errors.contains_key("Density"));

        let before = ed.data().to_vec();
        let changes = ed.apply_changes(&values);
        assert!(changes.is_empty());
        assert_eq!(ed.data(), &before[..]); // all-or-nothing
    }

    #[test]
    fn too_long_part_number_rejected() {
        let ed = editor();
        let mut values = FieldValues::new();
        values.insert("ModulePartNumber".into(), "X".repeat(21));
        assert!(ed.validate_fields(&values).contains_key("ModulePartNumber"));
    }

    #[test]
    fn in_range_value_produces_single_field_change_plus_crc() {
        let mut ed = editor();
        let mut values = FieldValues::new();
        values.insert("TimingTckMtb".into(), "6".into());

        let changes = ed.apply_changes(&values);
        // One change for byte 18, one for the repaired block-0 CRC.
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0], ByteChange { offset: 18, bytes: vec![6] });
        assert_eq!(changes[1].offset, 126);
        assert_eq!(ed.data()[18], 6);
        assert!(crc::verify(ed.data(), &crc::DDR4_BLOCKS).iter().all(|r| r.ok));
    }

    #[test]
    fn part_number_change_is_one_padded_span() {
        let mut ed = editor();
        let mut values = FieldValues::new();
        values.insert("ModulePartNumber".into(), "NEWPART".into());

        let changes = ed.apply_changes(&values);
        let part_change = changes.iter().find(|c| c.offset == 329).unwrap();
        assert_eq!(part_change.bytes.len(), 20);
        assert_eq!(&part_change.bytes[..7], b"NEWPART");
        assert!(part_change.bytes[7..].iter().all(|&b| b == b' '));
    }

    #[test]
    fn noop_apply_produces_no_changes() {
        let mut ed = editor();
        let mut values = FieldValues::new();
        values.insert("TimingTckMtb".into(), "5".into()); // already 5

        let changes = ed.apply_changes(&values);
        assert!(changes.is_empty());
    }

    #[test]
    fn crc_repair_runs_after_field_writes() {
        let mut ed = editor();
        let mut values = FieldValues::new();
        values.insert("Density".into(), "5".into()); // 8 Gb dies

        let changes = ed.apply_changes(&values);
        assert!(changes.iter().any(|c| c.offset == 4));
        assert!(changes.iter().any(|c| c.offset == 126));
        assert!(crc::verify(ed.data(), &crc::DDR4_BLOCKS).iter().all(|r| r.ok));
    }

    #[test]
    fn manufacturer_choice_applies_both_bytes() {
        let mut ed = editor();
        let mut values = FieldValues::new();
        values.insert("ModuleManufacturer".into(), "80AD".into()); // SK Hynix

        let changes = ed.apply_changes(&values);
        let mfr = changes.iter().find(|c| c.offset == 320).unwrap();
        assert_eq!(mfr.bytes, vec![0x80, 0xAD]);
    }

    #[test]
    fn composite_timing_writes_split_bytes() {
        let mut ed = editor();
        let mut values = FieldValues::new();
        values.insert("TimingTras".into(), "600".into()); // 0x258
        let changes = ed.apply_changes(&values);
        assert!(changes.iter().any(|c| c.offset == 28 && c.bytes == vec![0x58]));
        assert!(changes.iter().any(|c| c.offset == 27 && c.bytes == vec![0x02]));
    }

    #[test]
    fn xmp_fields_appear_only_for_enabled_profiles() {
        let mut data = image();
        data[384..387].copy_from_slice(b"XMP");
        data[0x182] = 0b01; // only profile 1
        crc::fix(&mut data, &crc::DDR4_BLOCKS);

        let mut ed = Ddr4Editor::new();
        ed.load_data(&data);
        let fields = ed.edit_fields();
        assert!(fields.iter().any(|f| f.id == "XMP1_Voltage"));
        assert!(!fields.iter().any(|f| f.id == "XMP2_Voltage"));
    }

    #[test]
    fn xmp_voltage_validation_and_encoding() {
        let mut data = image();
        data[384..387].copy_from_slice(b"XMP");
        data[0x182] = 0b01;
        crc::fix(&mut data, &crc::DDR4_BLOCKS);
        let mut ed = Ddr4Editor::new();
        ed.load_data(&data);

        let mut values = FieldValues::new();
        values.insert("XMP1_Voltage".into(), "300".into());
        assert!(ed.validate_fields(&values).contains_key("XMP1_Voltage"));
        assert!(ed.apply_changes(&values).is_empty());

        let mut values = FieldValues::new();
        values.insert("XMP1_Voltage".into(), "135".into()); // 1.35 V
        let changes = ed.apply_changes(&values);
        let v = changes.iter().find(|c| c.offset == 0x189).unwrap();
        assert_eq!(v.bytes, vec![0x80 | 35]);
    }

}
