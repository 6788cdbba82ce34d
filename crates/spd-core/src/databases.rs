//! External lookup databases: register/buffer models and reconstructed DRAM
//! part numbers.
//!
//! JEDEC does not store either in the SPD image, so the engine reconstructs
//! them from decode parameters through these tables. The set ships with
//! built-in defaults, can be replaced once at startup from a TOML file, and
//! is immutable for the rest of the process. A miss always degrades to a
//! sentinel, never an error.

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Register clock driver / data buffer identified by the SPD (type, revision)
/// pair at bytes 133-134.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterModelEntry {
    pub device_type: u8,
    pub revision: u8,
    pub manufacturer: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// DRAM component part number keyed by decode parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DramPartNumberEntry {
    pub part_number: String,
    pub manufacturer: String,
    #[serde(default)]
    pub die_density_gb: Option<u32>,
    #[serde(default)]
    pub device_width: Option<u32>,
    #[serde(default)]
    pub die_count: Option<u32>,
    #[serde(default)]
    pub multi_load_stack: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub die_info: Option<String>,
}

/// Decode parameters used to match a DRAM part number.
#[derive(Debug, Clone, Copy)]
pub struct DramPartQuery<'a> {
    pub manufacturer: &'a str,
    pub die_density_mb: u32,
    pub device_width: u32,
    pub die_count: u32,
    pub multi_load_stack: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupDatabases {
    #[serde(default)]
    pub register_models: Vec<RegisterModelEntry>,
    #[serde(default)]
    pub dram_part_numbers: Vec<DramPartNumberEntry>,
}

impl LookupDatabases {
    /// Load a database set from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.as_ref().display()))?;
        let db: LookupDatabases = toml::from_str(&content).context("parsing lookup databases")?;
        Ok(db)
    }

    /// Register model for an SPD (type, revision) pair.
    pub fn register_model(&self, device_type: u8, revision: u8) -> Option<&RegisterModelEntry> {
        self.register_models
            .iter()
            .find(|e| e.device_type == device_type && e.revision == revision)
    }

    /// First part-number entry matching the decode parameters.
    ///
    /// Density matching follows the SPD encoding: for multi-load stacks the
    /// SPD density field covers the whole device (die count x per-die), for
    /// monolithic and 3DS parts it covers a single die.
    pub fn dram_part_number(&self, query: &DramPartQuery<'_>) -> Option<&DramPartNumberEntry> {
        self.dram_part_numbers.iter().find(|entry| {
            if !entry.manufacturer.eq_ignore_ascii_case(query.manufacturer) {
                return false;
            }

            if let Some(entry_gb) = entry.die_density_gb {
                let spd_gb = query.die_density_mb / 1024;
                let expected_gb = match (query.multi_load_stack, entry.die_count) {
                    (true, Some(dies)) if dies > 1 => entry_gb * dies,
                    _ => entry_gb,
                };
                if spd_gb != expected_gb {
                    return false;
                }
            }

            if entry.device_width.is_some_and(|w| w != query.device_width) {
                return false;
            }
            if entry.die_count.is_some_and(|d| d != query.die_count) {
                return false;
            }
            if entry
                .multi_load_stack
                .is_some_and(|m| m != query.multi_load_stack)
            {
                return false;
            }
            true
        })
    }
}

/// Built-in defaults covering the register drivers and DRAM dies seen most
/// often in field dumps.
fn builtin() -> LookupDatabases {
    LookupDatabases {
        register_models: vec![
            RegisterModelEntry {
                device_type: 0x32,
                revision: 0x86,
                manufacturer: "Montage Technology".into(),
                model: "M88DR4RCD02-PH1".into(),
                notes: Some("RDIMM Micron/Samsung".into()),
            },
            RegisterModelEntry {
                device_type: 0xB3,
                revision: 0x80,
                manufacturer: "IDT (Renesas)".into(),
                model: "4RCD0232KC1ATG8".into(),
                notes: Some("LRDIMM Samsung".into()),
            },
        ],
        dram_part_numbers: vec![
            DramPartNumberEntry {
                part_number: "K4AAG045WC-BCWE".into(),
                manufacturer: "Samsung".into(),
                die_density_gb: Some(16),
                device_width: Some(4),
                die_count: Some(1),
                multi_load_stack: Some(false),
                die_info: Some("C-die".into()),
            },
            DramPartNumberEntry {
                part_number: "K4A8G085WB-BCTD".into(),
                manufacturer: "Samsung".into(),
                die_density_gb: Some(8),
                device_width: Some(8),
                die_count: Some(1),
                multi_load_stack: Some(false),
                die_info: Some("B-die".into()),
            },
            DramPartNumberEntry {
                part_number: "H5AN8G8NDJR-XNC".into(),
                manufacturer: "SK Hynix".into(),
                die_density_gb: Some(8),
                device_width: Some(8),
                die_count: Some(1),
                multi_load_stack: Some(false),
                die_info: Some("D-die".into()),
            },
            DramPartNumberEntry {
                part_number: "H5ANAG4NCJR-XNC".into(),
                manufacturer: "SK Hynix".into(),
                die_density_gb: Some(16),
                device_width: Some(4),
                die_count: Some(1),
                multi_load_stack: Some(false),
                die_info: Some("C-die".into()),
            },
            DramPartNumberEntry {
                part_number: "MT40A2G4WE-083E".into(),
                manufacturer: "Micron Technology".into(),
                die_density_gb: Some(8),
                device_width: Some(4),
                die_count: Some(2),
                multi_load_stack: Some(true),
                die_info: Some("E-die".into()),
            },
            DramPartNumberEntry {
                part_number: "MT40A8G4CLU-083H".into(),
                manufacturer: "Micron Technology".into(),
                die_density_gb: Some(16),
                device_width: Some(4),
                die_count: Some(2),
                multi_load_stack: Some(false),
                die_info: Some("E-die".into()),
            },
        ],
    }
}

static SHARED: OnceLock<LookupDatabases> = OnceLock::new();

/// Install a database set loaded by the caller. Must happen before the first
/// decode; later calls are ignored and report `false`.
pub fn install(databases: LookupDatabases) -> bool {
    SHARED.set(databases).is_ok()
}

/// Process-wide database set: the installed one, or the built-in defaults.
pub fn shared() -> &'static LookupDatabases {
    SHARED.get_or_init(builtin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_model_lookup_hits_and_misses() {
        let db = builtin();
        let hit = db.register_model(0x32, 0x86).expect("known pair");
        assert_eq!(hit.model, "M88DR4RCD02-PH1");
        assert!(db.register_model(0x00, 0x00).is_none());
    }

    #[test]
    fn part_number_matches_monolithic_die_density() {
        let db = builtin();
        let query = DramPartQuery {
            manufacturer: "Samsung",
            die_density_mb: 16 * 1024,
            device_width: 4,
            die_count: 1,
            multi_load_stack: false,
        };
        let entry = db.dram_part_number(&query).expect("Samsung 16Gb x4");
        assert_eq!(entry.part_number, "K4AAG045WC-BCWE");
    }

    #[test]
    fn part_number_scales_density_for_multi_load_stacks() {
        let db = builtin();
        // SPD reports the whole-device density for dual-die multi-load parts.
        let query = DramPartQuery {
            manufacturer: "Micron Technology",
            die_density_mb: 16 * 1024,
            device_width: 4,
            die_count: 2,
            multi_load_stack: true,
        };
        let entry = db.dram_part_number(&query).expect("dual-die DDP");
        assert_eq!(entry.part_number, "MT40A2G4WE-083E");
    }

    #[test]
    fn mismatch_returns_none() {
        let db = builtin();
        let query = DramPartQuery {
            manufacturer: "Nanya Technology",
            die_density_mb: 8 * 1024,
            device_width: 8,
            die_count: 1,
            multi_load_stack: false,
        };
        assert!(db.dram_part_number(&query).is_none());
    }

    #[test]
    fn toml_round_trip() {
        let db = builtin();
        let text = toml::to_string(&db).expect("serialize");
        let parsed: LookupDatabases = toml::from_str(&text).expect("parse");
        assert_eq!(parsed.register_models.len(), db.register_models.len());
        assert_eq!(parsed.dram_part_numbers.len(), db.dram_part_numbers.len());
    }
}
