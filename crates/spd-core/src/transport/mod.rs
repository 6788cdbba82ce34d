//! Hardware transport abstraction.
//!
//! The engine treats the EEPROM reader purely as a byte source/sink; the
//! trait boundary lives here and the real serial/I2C device driver plugs in
//! from outside.

pub mod mock;
pub mod traits;

pub use mock::MockTransport;
pub use traits::{SpdTransport, TransportError};
