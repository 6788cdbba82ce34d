//! SPD transport trait.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Device not connected")]
    NotConnected,

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Block {block} is write-protected")]
    ProtectedBlock { block: u8 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Abstract EEPROM transport.
///
/// This trait enables:
/// - Hardware implementations (serial/I2C readers)
/// - Mock implementation for unit testing
pub trait SpdTransport: Send + Sync {
    /// Read the full SPD image from the device.
    fn read_dump(&self) -> Result<Vec<u8>, TransportError>;

    /// Write a full SPD image back to the device.
    fn write_dump(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Toggle reversible software write protection for one EEPROM block.
    fn set_block_protection(&self, block: u8, protected: bool) -> Result<(), TransportError>;

    /// Current protection state of one block.
    fn block_protection(&self, block: u8) -> Result<bool, TransportError>;

    /// Whether the device is still reachable.
    fn is_connected(&self) -> bool;
}
