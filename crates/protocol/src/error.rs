//! Protocol error types

use thiserror::Error;

/// Errors raised while building or parsing protocol values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Device identifier not in `0xVVVV:0xPPPP` form
    #[error("Invalid device id '{input}': {reason}")]
    InvalidUsbId { input: String, reason: String },

    /// Endpoint address with reserved bits set
    #[error("Invalid endpoint address {address:#04x}")]
    InvalidEndpoint { address: u8 },

    /// Transfer direction does not match the operation
    #[error("Wrong direction: {what} must be device-to-host")]
    WrongDirection { what: &'static str },

    /// Zero-length read requested
    #[error("Transfer length must be greater than 0")]
    EmptyTransfer,
}

/// Type alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;
