//! SPD session - high-level orchestrator around one loaded dump.
//!
//! Owns the current buffer, dispatches to the generation-specific decoder and
//! editor through the factory, and notifies an observer about lifecycle
//! events. Front ends talk to this instead of wiring the modules themselves.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{info, instrument};

use crate::decode::DecodeOutput;
use crate::detect::{self, ForcedMemoryType, MemoryType};
use crate::edit::{ByteChange, EditField, FieldValues, ValidationErrors};
use crate::events::{SpdEvent, SpdObserver, TracingObserver};
use crate::transport::SpdTransport;

pub struct SpdSession<O: SpdObserver> {
    buffer: Option<Vec<u8>>,
    forced: ForcedMemoryType,
    observer: Arc<O>,
}

impl SpdSession<TracingObserver> {
    /// Session with the default tracing observer.
    pub fn new() -> Self {
        Self::with_observer(Arc::new(TracingObserver))
    }
}

impl Default for SpdSession<TracingObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: SpdObserver> SpdSession<O> {
    pub fn with_observer(observer: Arc<O>) -> Self {
        Self { buffer: None, forced: ForcedMemoryType::Auto, observer }
    }

    /// Override auto-detection for corrupted dumps.
    pub fn force_memory_type(&mut self, forced: ForcedMemoryType) {
        self.forced = forced;
    }

    pub fn buffer(&self) -> Option<&[u8]> {
        self.buffer.as_deref()
    }

    pub fn memory_type(&self) -> MemoryType {
        match &self.buffer {
            Some(data) => detect::resolve_memory_type(data, self.forced),
            None => MemoryType::Unknown,
        }
    }

    /// Load a dump from raw bytes. Replaces any previous buffer.
    pub fn load_bytes(&mut self, data: Vec<u8>) -> MemoryType {
        let memory_type = detect::resolve_memory_type(&data, self.forced);
        self.observer.on_event(&SpdEvent::DumpLoaded { len: data.len(), memory_type });
        self.buffer = Some(data);
        memory_type
    }

    /// Load a dump from a file.
    #[instrument(skip(self))]
    pub fn load_file<P: AsRef<Path> + std::fmt::Debug>(&mut self, path: P) -> Result<MemoryType> {
        let data = std::fs::read(&path)?;
        info!(len = data.len(), "Dump file loaded");
        Ok(self.load_bytes(data))
    }

    /// Read a dump from a hardware transport.
    pub fn read_from(&mut self, transport: &dyn SpdTransport) -> Result<MemoryType> {
        let data = transport.read_dump()?;
        Ok(self.load_bytes(data))
    }

    /// Decode the current buffer. `None` when no buffer is loaded or the
    /// generation is unsupported.
    pub fn decode(&self) -> Option<DecodeOutput> {
        let data = self.buffer.as_deref()?;
        let decoder = detect::create_decoder(data, self.forced)?;
        let output = decoder.populate();
        self.observer.on_event(&SpdEvent::DecodeCompleted {
            module: output.module.len(),
            dram: output.dram.len(),
            timings: output.timings.len(),
        });
        Some(output)
    }

    /// Editable fields projected from the current buffer.
    pub fn edit_fields(&self) -> Vec<EditField> {
        match self.buffer.as_deref() {
            Some(data) => detect::create_editor(data, self.forced)
                .map(|editor| editor.edit_fields())
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Validate a batch of proposed values without applying them.
    pub fn validate(&self, values: &FieldValues) -> ValidationErrors {
        match self.buffer.as_deref() {
            Some(data) => detect::create_editor(data, self.forced)
                .map(|editor| editor.validate_fields(values))
                .unwrap_or_default(),
            None => ValidationErrors::new(),
        }
    }

    /// Apply a batch of field values. On success the session buffer is
    /// replaced with the editor's patched copy so decode and edit state never
    /// diverge; on validation failure nothing changes and the list is empty.
    pub fn apply(&mut self, values: &FieldValues) -> Vec<ByteChange> {
        let Some(data) = self.buffer.as_deref() else {
            return Vec::new();
        };
        let Some(mut editor) = detect::create_editor(data, self.forced) else {
            return Vec::new();
        };

        let errors = editor.validate_fields(values);
        if !errors.is_empty() {
            self.observer.on_event(&SpdEvent::ValidationFailed { errors: errors.len() });
            return Vec::new();
        }

        let changes = editor.apply_changes(values);
        if !changes.is_empty() {
            self.buffer = Some(editor.data().to_vec());
            self.observer.on_event(&SpdEvent::ChangesApplied { changes: changes.len() });
        }
        changes
    }

    /// Write the current buffer back through a hardware transport.
    pub fn write_back(&self, transport: &dyn SpdTransport) -> Result<()> {
        let data = self.buffer.as_deref().ok_or_else(|| anyhow!("no dump loaded"))?;
        transport.write_dump(data)?;
        self.observer.on_event(&SpdEvent::WriteCompleted { len: data.len() });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc;
    use crate::events::NullObserver;
    use crate::transport::MockTransport;

    fn ddr4_image() -> Vec<u8> {
        let mut data = vec![0u8; 512];
        data[2] = 0x0C;
        data[4] = 0x04;
        data[5] = 0b0001_0010;
        data[12] = 0b0000_1001;
        data[13] = 0b0000_0011;
        data[18] = 5;
        data[320] = 0x80;
        data[321] = 0xCE;
        crc::fix(&mut data, &crc::DDR4_BLOCKS);
        data
    }

    fn session() -> SpdSession<NullObserver> {
        SpdSession::with_observer(Arc::new(NullObserver))
    }

    #[test]
    fn load_detects_type_and_decode_works() {
        let mut s = session();
        assert_eq!(s.memory_type(), MemoryType::Unknown);

        let t = s.load_bytes(ddr4_image());
        assert_eq!(t, MemoryType::Ddr4);

        let output = s.decode().expect("decoder available");
        assert!(!output.module.is_empty());
    }

    #[test]
    fn forced_type_overrides_detection() {
        let mut s = session();
        let mut data = ddr4_image();
        data[2] = 0xFF;
        s.force_memory_type(ForcedMemoryType::Ddr4);
        assert_eq!(s.load_bytes(data), MemoryType::Ddr4);
        assert!(s.decode().is_some());
    }

    #[test]
    fn apply_updates_session_buffer_and_fields_regenerate() {
        let mut s = session();
        s.load_bytes(ddr4_image());

        let mut values = FieldValues::new();
        values.insert("TimingTckMtb".into(), "6".into());
        let changes = s.apply(&values);
        assert!(!changes.is_empty());
        assert_eq!(s.buffer().unwrap()[18], 6);

        // Edit fields are rebuilt from the patched buffer.
        let fields = s.edit_fields();
        let tck = fields.iter().find(|f| f.id == "TimingTckMtb").unwrap();
        assert_eq!(tck.value, "6");

        // Checksum was repaired along the way.
        assert!(crc::verify(s.buffer().unwrap(), &crc::DDR4_BLOCKS).iter().all(|r| r.ok));
    }

    #[test]
    fn failed_validation_leaves_buffer_untouched() {
        let mut s = session();
        s.load_bytes(ddr4_image());
        let before = s.buffer().unwrap().to_vec();

        let mut values = FieldValues::new();
        values.insert("Density".into(), "99".into());
        assert!(s.apply(&values).is_empty());
        assert_eq!(s.buffer().unwrap(), &before[..]);
    }

    #[test]
    fn transport_round_trip() {
        let transport = MockTransport::new(ddr4_image());
        let mut s = session();
        s.read_from(&transport).unwrap();
        assert_eq!(s.memory_type(), MemoryType::Ddr4);

        let mut values = FieldValues::new();
        values.insert("TimingTckMtb".into(), "7".into());
        s.apply(&values);
        s.write_back(&transport).unwrap();

        let written = transport.read_dump().unwrap();
        assert_eq!(written[18], 7);
        assert!(crc::verify(&written, &crc::DDR4_BLOCKS).iter().all(|r| r.ok));
    }

    #[test]
    fn unsupported_buffer_decodes_to_none() {
        let mut s = session();
        s.load_bytes(vec![0u8; 100]);
        assert!(s.decode().is_none());
        assert!(s.edit_fields().is_empty());
    }
}
