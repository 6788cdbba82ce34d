//! Mock SPD transport for testing.

use std::collections::HashSet;
use std::sync::Mutex;

use super::traits::{SpdTransport, TransportError};

/// EEPROM block granularity used for write-protect bookkeeping.
const BLOCK_SIZE: usize = 128;

/// In-memory transport for unit testing session and editor plumbing.
pub struct MockTransport {
    dump: Mutex<Vec<u8>>,
    protected: Mutex<HashSet<u8>>,
    write_log: Mutex<Vec<Vec<u8>>>,
    connected: Mutex<bool>,
}

impl MockTransport {
    pub fn new(dump: Vec<u8>) -> Self {
        Self {
            dump: Mutex::new(dump),
            protected: Mutex::new(HashSet::new()),
            write_log: Mutex::new(Vec::new()),
            connected: Mutex::new(true),
        }
    }

    /// All full-image writes the device accepted.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.write_log.lock().unwrap().clone()
    }

    /// Simulate a cable pull.
    pub fn disconnect(&self) {
        *self.connected.lock().unwrap() = false;
    }

    pub fn reconnect(&self) {
        *self.connected.lock().unwrap() = true;
    }
}

impl SpdTransport for MockTransport {
    fn read_dump(&self) -> Result<Vec<u8>, TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        Ok(self.dump.lock().unwrap().clone())
    }

    fn write_dump(&self, data: &[u8]) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let protected = self.protected.lock().unwrap();
        let blocks = data.len().div_ceil(BLOCK_SIZE);
        for block in 0..blocks {
            if protected.contains(&(block as u8)) {
                return Err(TransportError::ProtectedBlock { block: block as u8 });
            }
        }
        drop(protected);

        *self.dump.lock().unwrap() = data.to_vec();
        self.write_log.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    fn set_block_protection(&self, block: u8, protect: bool) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        let mut protected = self.protected.lock().unwrap();
        if protect {
            protected.insert(block);
        } else {
            protected.remove(&block);
        }
        Ok(())
    }

    fn block_protection(&self, block: u8) -> Result<bool, TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        Ok(self.protected.lock().unwrap().contains(&block))
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_round_trip() {
        let mock = MockTransport::new(vec![0xAB; 512]);
        let dump = mock.read_dump().unwrap();
        assert_eq!(dump.len(), 512);

        let mut modified = dump.clone();
        modified[100] = 0x42;
        mock.write_dump(&modified).unwrap();
        assert_eq!(mock.read_dump().unwrap()[100], 0x42);
        assert_eq!(mock.writes().len(), 1);
    }

    #[test]
    fn protected_block_rejects_writes() {
        let mock = MockTransport::new(vec![0u8; 512]);
        mock.set_block_protection(0, true).unwrap();
        assert!(mock.block_protection(0).unwrap());

        let err = mock.write_dump(&[1u8; 512]).unwrap_err();
        assert!(matches!(err, TransportError::ProtectedBlock { block: 0 }));

        mock.set_block_protection(0, false).unwrap();
        assert!(mock.write_dump(&[1u8; 512]).is_ok());
    }

    #[test]
    fn disconnect_fails_everything() {
        let mock = MockTransport::new(vec![0u8; 512]);
        mock.disconnect();
        assert!(!mock.is_connected());
        assert!(mock.read_dump().is_err());
        assert!(mock.write_dump(&[0u8; 512]).is_err());

        mock.reconnect();
        assert!(mock.read_dump().is_ok());
    }
}
