//! Common error types

use protocol::UsbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No device matching {vendor_id:#06x}:{product_id:#06x} found")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    #[error("Descriptor error: {0}")]
    Descriptor(String),

    #[error("{operation} failed: {source}")]
    Transfer {
        operation: &'static str,
        #[source]
        source: UsbError,
    },

    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Wrap a USB error with the name of the operation that raised it
    pub fn transfer(operation: &'static str, source: UsbError) -> Self {
        Self::Transfer { operation, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_not_found_display() {
        let err = Error::DeviceNotFound {
            vendor_id: 0x03eb,
            product_id: 0x2ff4,
        };
        assert_eq!(err.to_string(), "No device matching 0x03eb:0x2ff4 found");
    }

    #[test]
    fn test_transfer_display() {
        let err = Error::transfer("control transfer", UsbError::Pipe);
        assert_eq!(err.to_string(), "control transfer failed: endpoint stalled");
    }
}
