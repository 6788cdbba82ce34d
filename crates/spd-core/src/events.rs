//! Event system for UI decoupling.
//!
//! Front ends subscribe to session events without tight coupling to the
//! engine. The observer is an optional observability hook; decode results
//! never depend on it.

use crate::detect::MemoryType;

/// Log level for forwarded diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Events emitted by an SPD session.
#[derive(Debug, Clone)]
pub enum SpdEvent {
    /// A dump was loaded (file, raw bytes, or transport).
    DumpLoaded { len: usize, memory_type: MemoryType },
    /// Decode finished with the given collection sizes.
    DecodeCompleted { module: usize, dram: usize, timings: usize },
    /// Edit batch rejected by validation.
    ValidationFailed { errors: usize },
    /// Edit batch applied as byte patches.
    ChangesApplied { changes: usize },
    /// A stored checksum was rewritten.
    CrcRepaired,
    /// Dump written back to a transport.
    WriteCompleted { len: usize },
    /// Free-form diagnostic.
    Log { level: LogLevel, message: String },
}

/// Observer trait for receiving session events.
pub trait SpdObserver: Send + Sync {
    fn on_event(&self, event: &SpdEvent);
}

/// No-op observer that discards all events.
pub struct NullObserver;

impl SpdObserver for NullObserver {
    fn on_event(&self, _event: &SpdEvent) {}
}

/// Observer that forwards events to `tracing`.
pub struct TracingObserver;

impl SpdObserver for TracingObserver {
    fn on_event(&self, event: &SpdEvent) {
        match event {
            SpdEvent::DumpLoaded { len, memory_type } => {
                tracing::info!(len, memory_type = %memory_type, "Dump loaded");
            }
            SpdEvent::DecodeCompleted { module, dram, timings } => {
                tracing::info!(module, dram, timings, "Decode completed");
            }
            SpdEvent::ValidationFailed { errors } => {
                tracing::warn!(errors, "Edit batch rejected");
            }
            SpdEvent::ChangesApplied { changes } => {
                tracing::info!(changes, "Changes applied");
            }
            SpdEvent::CrcRepaired => {
                tracing::info!("CRC repaired");
            }
            SpdEvent::WriteCompleted { len } => {
                tracing::info!(len, "Dump written");
            }
            SpdEvent::Log { level, message } => match level {
                LogLevel::Debug => tracing::debug!("{message}"),
                LogLevel::Info => tracing::info!("{message}"),
                LogLevel::Warn => tracing::warn!("{message}"),
                LogLevel::Error => tracing::error!("{message}"),
            },
        }
    }
}
