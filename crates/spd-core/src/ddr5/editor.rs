//! DDR5 edit facade.

use tracing::debug;

use crate::codec::extract_bits;
use crate::crc::{self, DDR5_BLOCKS};
use crate::edit::{
    parse_bcd, parse_hex_u16, parse_serial_hex, ByteChange, ChangeRecorder, ChoiceItem,
    EditCategory, EditField, EditFieldKind, FieldValues, SpdEditor, ValidationErrors,
};
use crate::manufacturers;

pub struct Ddr5Editor {
    data: Vec<u8>,
}

impl Ddr5Editor {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    fn byte(&self, index: usize) -> u8 {
        self.data.get(index).copied().unwrap_or(0)
    }

    fn manufacturer_choices() -> Vec<ChoiceItem> {
        manufacturers::choices()
            .into_iter()
            .map(|(display, id)| ChoiceItem::new(display, format!("{id:04X}")))
            .collect()
    }

    fn module_fields(&self, fields: &mut Vec<EditField>) {
        if self.data.len() > 513 {
            // Code byte first, continuation second in the DDR5 layout.
            let id = u16::from(self.byte(512)) | (u16::from(self.byte(513)) << 8);
            fields.push(
                EditField::new(
                    "ModuleManufacturer",
                    "Module Manufacturer",
                    format!("{id:04X}"),
                    EditFieldKind::Choice,
                    EditCategory::MemoryModule,
                )
                .tooltip("Bytes 512-513: JEDEC Manufacturer ID")
                .choices(Self::manufacturer_choices()),
            );
        }

        if self.data.len() > 550 {
            let codec = crate::codec::FieldCodec::new(&self.data);
            fields.push(
                EditField::new(
                    "ModulePartNumber",
                    "Module Part Number",
                    codec.ascii_string(521, 550).trim_end().to_string(),
                    EditFieldKind::Text,
                    EditCategory::MemoryModule,
                )
                .tooltip("Bytes 521-550: Module Part Number (ASCII, space-padded to 30 bytes)")
                .max_length(30),
            );
        }

        if self.data.len() > 520 {
            let serial: String =
                self.data[517..=520].iter().map(|b| format!("{b:02X}")).collect();
            fields.push(
                EditField::new(
                    "ModuleSerialNumber",
                    "Serial Number",
                    serial,
                    EditFieldKind::Text,
                    EditCategory::MemoryModule,
                )
                .tooltip("Bytes 517-520: Serial Number (4 bytes as 8 hex characters)")
                .max_length(8),
            );
        }

        if self.data.len() > 516 {
            fields.push(
                EditField::new(
                    "ManufacturingYear",
                    "Manufacturing Year",
                    format!("{:02X}", self.byte(515)),
                    EditFieldKind::Text,
                    EditCategory::MemoryModule,
                )
                .tooltip("Byte 515: Year (BCD, 00-99 = 2000-2099)")
                .max_length(2),
            );
            fields.push(
                EditField::new(
                    "ManufacturingWeek",
                    "Manufacturing Week",
                    format!("{:02X}", self.byte(516)),
                    EditFieldKind::Text,
                    EditCategory::MemoryModule,
                )
                .tooltip("Byte 516: Week (BCD, 01-52)")
                .max_length(2),
            );
        }

        if self.data.len() > 553 {
            let id = u16::from(self.byte(552)) | (u16::from(self.byte(553)) << 8);
            fields.push(
                EditField::new(
                    "DramManufacturer",
                    "DRAM Manufacturer",
                    format!("{id:04X}"),
                    EditFieldKind::Choice,
                    EditCategory::DramComponents,
                )
                .tooltip("Bytes 552-553: JEDEC DRAM Manufacturer ID")
                .choices(Self::manufacturer_choices()),
            );
        }
    }

    fn timing_fields(&self, fields: &mut Vec<EditField>) {
        if self.data.len() <= 241 {
            return;
        }

        let pairs: [(&str, &str, usize, usize); 4] = [
            ("TimingTck", "tCK (Clock Period)", 20, 235),
            ("TimingTrcd", "tRCD", 21, 236),
            ("TimingTrp", "tRP", 25, 240),
            ("TimingTras", "tRAS", 26, 241),
        ];

        for (id, label, mtb, ftb) in pairs {
            fields.push(
                EditField::new(
                    format!("{id}Mtb"),
                    format!("{label} MTB"),
                    self.byte(mtb).to_string(),
                    EditFieldKind::Text,
                    EditCategory::Timing,
                )
                .tooltip(format!("Byte {mtb}: medium timebase count")),
            );
            fields.push(
                EditField::new(
                    format!("{id}Ftb"),
                    format!("{label} FTB"),
                    (self.byte(ftb) as i8).to_string(),
                    EditFieldKind::Text,
                    EditCategory::Timing,
                )
                .tooltip(format!("Byte {ftb}: fine timebase correction (signed)")),
            );
        }
    }

    fn module_config_fields(&self, fields: &mut Vec<EditField>) {
        if self.data.len() <= 14 {
            return;
        }

        fields.push(
            EditField::new(
                "ModuleRanks",
                "Number of Ranks",
                (u32::from(extract_bits(self.byte(12), 3, 3)) + 1).to_string(),
                EditFieldKind::Numeric,
                EditCategory::ModuleConfig,
            )
            .tooltip("Byte 12, bits 5-3: package ranks per channel (1-8)"),
        );

        let width_code = extract_bits(self.byte(12), 0, 3);
        let width = match width_code {
            0 => 4,
            1 => 8,
            2 => 16,
            3 => 32,
            _ => 0,
        };
        fields.push(
            EditField::new(
                "DeviceWidth",
                "Device Width (bits)",
                width.to_string(),
                EditFieldKind::Numeric,
                EditCategory::ModuleConfig,
            )
            .tooltip("Byte 12, bits 2-0: I/O width (4, 8, 16, 32)"),
        );

        let bus = match extract_bits(self.byte(13), 0, 3) {
            0 => 32,
            1 => 64,
            _ => 0,
        };
        fields.push(
            EditField::new(
                "PrimaryBusWidth",
                "Primary Bus Width (bits)",
                bus.to_string(),
                EditFieldKind::Numeric,
                EditCategory::ModuleConfig,
            )
            .tooltip("Byte 13, bits 2-0: primary bus width per channel (32, 64)"),
        );

        fields.push(
            EditField::new(
                "ThermalSensor",
                "Thermal Sensor",
                if self.byte(14) & 0x80 != 0 { "True" } else { "False" },
                EditFieldKind::Flag,
                EditCategory::ModuleConfig,
            )
            .tooltip("Byte 14, bit 7: on-die thermal sensor"),
        );
    }

    fn apply_fields(rec: &mut ChangeRecorder<'_>, values: &FieldValues) {
        if let Some(id) = values.get("ModuleManufacturer").and_then(|v| parse_hex_u16(v)) {
            rec.set_bytes(512, &[id as u8, (id >> 8) as u8]);
        }
        if let Some(id) = values.get("DramManufacturer").and_then(|v| parse_hex_u16(v)) {
            rec.set_bytes(552, &[id as u8, (id >> 8) as u8]);
        }

        if let Some(part) = values.get("ModulePartNumber") {
            let mut bytes = [b' '; 30];
            for (slot, ch) in bytes.iter_mut().zip(part.chars()) {
                if ch.is_ascii() && !ch.is_ascii_control() {
                    *slot = ch as u8;
                }
            }
            rec.set_bytes(521, &bytes);
        }

        if let Some(serial) = values.get("ModuleSerialNumber") {
            if let Some(bytes) = parse_serial_hex(serial) {
                rec.set_bytes(517, &bytes);
            }
        }

        if let Some(year) = values.get("ManufacturingYear").and_then(|v| parse_bcd(v)) {
            rec.set_byte(515, year);
        }
        if let Some(week) = values.get("ManufacturingWeek").and_then(|v| parse_bcd(v)) {
            rec.set_byte(516, week);
        }

        let timing_pairs: [(&str, usize, usize); 4] = [
            ("TimingTck", 20, 235),
            ("TimingTrcd", 21, 236),
            ("TimingTrp", 25, 240),
            ("TimingTras", 26, 241),
        ];
        for (id, mtb, ftb) in timing_pairs {
            if let Some(ticks) = values
                .get(&format!("{id}Mtb"))
                .and_then(|v| v.trim().parse::<u8>().ok())
            {
                rec.set_byte(mtb, ticks);
            }
            if let Some(fc) = values
                .get(&format!("{id}Ftb"))
                .and_then(|v| v.trim().parse::<i8>().ok())
            {
                rec.set_byte(ftb, fc as u8);
            }
        }

        if let Some(ranks) = values
            .get("ModuleRanks")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|r| (1..=8).contains(r))
        {
            rec.set_bits(12, 0x38, ((ranks - 1) as u8) << 3);
        }

        if let Some(width) = values.get("DeviceWidth").and_then(|v| v.trim().parse::<u32>().ok()) {
            let code = match width {
                4 => Some(0u8),
                8 => Some(1),
                16 => Some(2),
                32 => Some(3),
                _ => None,
            };
            if let Some(code) = code {
                rec.set_bits(12, 0x07, code);
            }
        }

        if let Some(bus) = values.get("PrimaryBusWidth").and_then(|v| v.trim().parse::<u32>().ok())
        {
            let code = match bus {
                32 => Some(0u8),
                64 => Some(1),
                _ => None,
            };
            if let Some(code) = code {
                rec.set_bits(13, 0x07, code);
            }
        }

        if let Some(text) = values.get("ThermalSensor") {
            let present = text.eq_ignore_ascii_case("true");
            rec.set_bits(14, 0x80, if present { 0x80 } else { 0x00 });
        }
    }
}

impl Default for Ddr5Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl SpdEditor for Ddr5Editor {
    fn load_data(&mut self, data: &[u8]) {
        self.data = data.to_vec();
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn edit_fields(&self) -> Vec<EditField> {
        let mut fields = Vec::new();
        if self.data.len() < 512 {
            return fields;
        }

        self.module_fields(&mut fields);
        self.timing_fields(&mut fields);
        self.module_config_fields(&mut fields);
        fields
    }

    fn validate_fields(&self, values: &FieldValues) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        for (id, min, max) in [("ManufacturingYear", 0u8, 99u8), ("ManufacturingWeek", 1, 52)] {
            if let Some(text) = values.get(id) {
                if !text.trim().is_empty()
                    && !text.trim().parse::<u8>().is_ok_and(|v| (min..=max).contains(&v))
                {
                    errors.insert(id.into(), format!("Invalid BCD value ({min:02}-{max:02})"));
                }
            }
        }

        if let Some(text) = values.get("ModulePartNumber") {
            if text.len() > 30 {
                errors.insert(
                    "ModulePartNumber".into(),
                    "Part number is limited to 30 characters".into(),
                );
            }
        }

        if let Some(text) = values.get("ModuleSerialNumber") {
            if !text.trim().is_empty()
                && parse_serial_hex(text).is_none()
            {
                errors.insert(
                    "ModuleSerialNumber".into(),
                    "Serial number must be up to 8 hex characters (even length)".into(),
                );
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
                && !text
                    .trim()
                    .parse::<u32>()
                    .is_ok_and(|v| matches!(v, 4 | 8 | 16 | 32))
            {
                errors.insert("DeviceWidth".into(), "Device width must be 4, 8, 16, or 32".into());
            }
        }

        if let Some(text) = values.get("PrimaryBusWidth") {
            if !text.trim().is_empty()
                && !text.trim().parse::<u32>().is_ok_and(|v| matches!(v, 32 | 64))
            {
                errors.insert(
                    "PrimaryBusWidth".into(),
                    "Primary bus width must be 32 or 64".into(),
                );
            }
        }

        errors
    }

    fn apply_changes(&mut self, values: &FieldValues) -> Vec<ByteChange> {
        let errors = self.validate_fields(values);
        if !errors.is_empty() {
            debug!(errors = errors.len(), "apply aborted by validation");
            return Vec::new();
        }

        let mut rec = ChangeRecorder::new(&mut self.data);
        Self::apply_fields(&mut rec, values);

        let block = &DDR5_BLOCKS[0];
        if rec.data().len() >= block.data_start + block.data_len
            && rec.data().len() >= block.stored_at + 2
        {
            let calculated =
                crc::compute(&rec.data()[block.data_start..block.data_start + block.data_len]);
            rec.set_bytes(block.stored_at, &calculated.to_le_bytes());
        }

        rec.into_changes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc;
    use crate::edit::FieldValues;

    fn image() -> Vec<u8> {
        let mut data = vec![0u8; 1024];
        data[2] = 0x12;
        data[3] = 0x02;
        data[4] = 0x04;
        data[6] = 0b0010_0000;
        data[20] = 0x65;
        data[21] = 0x01;
        data[234] = 0;
        data[235] = 0b0000_0010;
        data[512] = 0xCE;
        data[513] = 0x80;
        data[521..529].copy_from_slice(b"M323R2GA");
        crc::fix(&mut data, &crc::DDR5_BLOCKS);
        data
    }

    fn editor() -> Ddr5Editor {
        let mut ed = Ddr5Editor::new();
        ed.load_data(&image());
        ed
    }

    #[test]
    fn fields_project_with_ddr5_offsets() {
        let ed = editor();
        let fields = ed.edit_fields();

        let mfr = fields.iter().find(|f| f.id == "ModuleManufacturer").unwrap();
        assert_eq!(mfr.value, "80CE");

        let part = fields.iter().find(|f| f.id == "ModulePartNumber").unwrap();
        assert_eq!(part.value, "M323R2GA");
        assert_eq!(part.max_length, Some(30));

        assert!(fields.iter().any(|f| f.id == "TimingTckMtb"));
        assert!(fields.iter().any(|f| f.id == "ThermalSensor"));
    }

    #[test]
    fn buffer_below_512_projects_nothing() {
        let mut ed = Ddr5Editor::new();
        ed.load_data(&vec![0u8; 256]);
        assert!(ed.edit_fields().is_empty());
    }

    #[test]
    fn manufacturer_write_is_lsb_first() {
        let mut ed = editor();
        let mut values = FieldValues::new();
        values.insert("ModuleManufacturer".into(), "80AD".into()); // SK Hynix

        let changes = ed.apply_changes(&values);
        let mfr = changes.iter().find(|c| c.offset == 512).unwrap();
        assert_eq!(mfr.bytes, vec![0xAD, 0x80]);
        // module-manufacturer bytes live outside the CRC-covered block
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn covered_byte_write_repairs_crc() {
        let mut ed = editor();
        let mut values = FieldValues::new();
        values.insert("TimingTckMtb".into(), "0x".into());
        assert!(ed.apply_changes(&values).is_empty()); // unparseable -> no-op

        let mut values = FieldValues::new();
        values.insert("TimingTckMtb".into(), "102".into());
        let changes = ed.apply_changes(&values);
        assert!(changes.iter().any(|c| c.offset == 20));
        assert!(changes.iter().any(|c| c.offset == 510));
        assert!(crc::verify(ed.data(), &crc::DDR5_BLOCKS).iter().all(|r| r.ok));
    }

    #[test]
    fn validation_rejects_out_of_range_and_apply_is_all_or_nothing() {
        let mut ed = editor();
        let mut values = FieldValues::new();
        values.insert("ModuleRanks".into(), "9".into());
        values.insert("TimingTckMtb".into(), "100".into()); // valid sibling

        assert!(ed.validate_fields(&values).contains_key("ModuleRanks"));
        let before = ed.data().to_vec();
        assert!(ed.apply_changes(&values).is_empty());
        assert_eq!(ed.data(), &before[..]);
    }

    #[test]
    fn part_number_padded_to_thirty_bytes() {
        let mut ed = editor();
        let mut values = FieldValues::new();
        values.insert("ModulePartNumber".into(), "NEWMODULE".into());

        let changes = ed.apply_changes(&values);
        let part = changes.iter().find(|c| c.offset == 521).unwrap();
        assert_eq!(part.bytes.len(), 30);
        assert_eq!(&part.bytes[..9], b"NEWMODULE");
        assert!(part.bytes[9..].iter().all(|&b| b == b' '));
    }
}
