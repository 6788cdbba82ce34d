//! spd-core: DRAM Serial Presence Detect decode/edit engine.
//!
//! Decodes raw SPD EEPROM dumps for two memory generations (DDR4, DDR5) into
//! structured attribute and timing collections, and supports round-trip
//! editing: editable field projection, validation, minimal byte patches, and
//! checksum repair.
//!
//! # Architecture
//!
//! - **Codec**: bit-field extraction and timebase arithmetic
//! - **Crc**: CRC-16/CCITT verify/repair over per-generation block layouts
//! - **Detect**: memory-type sniffing and the decoder/editor factory
//! - **Ddr4 / Ddr5**: generation-specific decode and edit facades
//! - **Transport**: byte source/sink abstraction (hardware drivers plug in)
//! - **Session**: high-level orchestrator owning the loaded dump
//! - **Events**: observer pattern for UI decoupling
//!
//! # Example
//!
//! ```no_run
//! use spd_core::session::SpdSession;
//!
//! let mut session = SpdSession::new();
//! session.load_file("dump.bin").expect("readable dump");
//! if let Some(output) = session.decode() {
//!     for attr in &output.module {
//!         println!("{}: {}", attr.label, attr.value);
//!     }
//! }
//! ```

pub mod codec;
pub mod constants;
pub mod crc;
pub mod databases;
pub mod decode;
pub mod ddr4;
pub mod ddr5;
pub mod detect;
pub mod edit;
pub mod events;
pub mod manufacturers;
pub mod package;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use decode::{Attribute, ByteRange, DecodeOutput, SpdDecoder, TimingRow};
pub use detect::{
    create_decoder, create_editor, detect_memory_type, ForcedMemoryType, MemoryType,
};
pub use edit::{ByteChange, EditField, FieldValues, SpdEditor, ValidationErrors};
pub use events::{NullObserver, SpdEvent, SpdObserver, TracingObserver};
pub use session::SpdSession;
pub use transport::{MockTransport, SpdTransport, TransportError};
