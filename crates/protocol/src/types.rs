//! USB type definitions
//!
//! Device identifiers, endpoint addresses, interrupt read requests and the
//! error taxonomy shared by the transport and the run loop.

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Direction bit shared by `bmRequestType` and endpoint addresses
pub const DIRECTION_IN: u8 = 0x80;

/// Vendor/product identifier pair
///
/// Written as `0xVVVV:0xPPPP` in configuration files and on the command
/// line, e.g. `0x03eb:0x2ff4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UsbId {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl UsbId {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }

    /// Check a descriptor's identifiers against this pair
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }

    fn parse_hex(input: &str, part: &str, name: &str) -> Result<u16> {
        let invalid = |reason: String| ProtocolError::InvalidUsbId {
            input: input.to_string(),
            reason,
        };

        let hex_part = part
            .strip_prefix("0x")
            .or_else(|| part.strip_prefix("0X"))
            .ok_or_else(|| invalid(format!("{} must start with '0x'", name)))?;

        if hex_part.is_empty() || hex_part.len() > 4 {
            return Err(invalid(format!("{} hex part must be 1-4 digits", name)));
        }

        u16::from_str_radix(hex_part, 16)
            .map_err(|_| invalid(format!("{} is not a valid hex number", name)))
    }
}

impl FromStr for UsbId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 2 {
            return Err(ProtocolError::InvalidUsbId {
                input: s.to_string(),
                reason: "expected VID:PID (e.g. '0x03eb:0x2ff4')".to_string(),
            });
        }

        Ok(Self {
            vendor_id: Self::parse_hex(s, parts[0], "VID")?,
            product_id: Self::parse_hex(s, parts[1], "PID")?,
        })
    }
}

impl TryFrom<String> for UsbId {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<UsbId> for String {
    fn from(id: UsbId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for UsbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}:{:#06x}", self.vendor_id, self.product_id)
    }
}

/// Endpoint address (`bEndpointAddress`)
///
/// Bit 7 is the direction, bits 0-3 the endpoint number. Bits 4-6 are
/// reserved and must be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct EndpointAddress(u8);

impl EndpointAddress {
    pub fn new(address: u8) -> Result<Self> {
        if address & 0x70 != 0 {
            return Err(ProtocolError::InvalidEndpoint { address });
        }
        Ok(Self(address))
    }

    pub fn address(&self) -> u8 {
        self.0
    }

    /// Device-to-host endpoint
    pub fn is_in(&self) -> bool {
        self.0 & DIRECTION_IN != 0
    }

    pub fn number(&self) -> u8 {
        self.0 & 0x0f
    }
}

impl TryFrom<u8> for EndpointAddress {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<EndpointAddress> for u8 {
    fn from(ep: EndpointAddress) -> Self {
        ep.0
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// A bounded-timeout read from an interrupt IN endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptRead {
    pub endpoint: EndpointAddress,
    /// Maximum number of bytes to read
    pub length: usize,
    pub timeout: Duration,
}

impl InterruptRead {
    pub fn new(endpoint: EndpointAddress, length: usize, timeout: Duration) -> Result<Self> {
        if !endpoint.is_in() {
            return Err(ProtocolError::WrongDirection {
                what: "interrupt endpoint",
            });
        }
        if length == 0 {
            return Err(ProtocolError::EmptyTransfer);
        }
        Ok(Self {
            endpoint,
            length,
            timeout,
        })
    }
}

/// Result of one interrupt read attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Bytes received from the endpoint
    Data(Vec<u8>),
    /// Nothing arrived before the timeout elapsed
    Timeout,
}

/// USB error types
///
/// Maps to libusb error codes. See rusb::Error for details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
pub enum UsbError {
    #[error("transfer timed out")]
    Timeout,
    #[error("endpoint stalled")]
    Pipe,
    #[error("device disconnected")]
    NoDevice,
    #[error("entity not found")]
    NotFound,
    #[error("resource busy")]
    Busy,
    #[error("buffer overflow")]
    Overflow,
    #[error("input/output error")]
    Io,
    #[error("invalid parameter")]
    InvalidParam,
    #[error("access denied (insufficient permissions)")]
    Access,
    #[error("operation not supported on this platform")]
    NotSupported,
    #[error("{message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usb_id_parse() {
        let id: UsbId = "0x03eb:0x2ff4".parse().unwrap();
        assert_eq!(id, UsbId::new(0x03eb, 0x2ff4));

        let upper: UsbId = "0X03EB:0X2FF4".parse().unwrap();
        assert_eq!(upper, id);
    }

    #[test]
    fn test_usb_id_parse_invalid() {
        assert!("03eb:2ff4".parse::<UsbId>().is_err());
        assert!("0x03eb".parse::<UsbId>().is_err());
        assert!("0x03eb:0x2ff4:0x1".parse::<UsbId>().is_err());
        assert!("0xGHIJ:0x2ff4".parse::<UsbId>().is_err());
        assert!("0x12345:0x2ff4".parse::<UsbId>().is_err());
        assert!("0x:0x2ff4".parse::<UsbId>().is_err());
    }

    #[test]
    fn test_usb_id_display() {
        assert_eq!(UsbId::new(0x03eb, 0x2ff4).to_string(), "0x03eb:0x2ff4");
    }

    #[test]
    fn test_usb_id_matches() {
        let id = UsbId::new(0x03eb, 0x2ff4);
        assert!(id.matches(0x03eb, 0x2ff4));
        assert!(!id.matches(0x03eb, 0x2ff5));
        assert!(!id.matches(0x1234, 0x2ff4));
    }

    #[test]
    fn test_endpoint_direction() {
        let ep_in = EndpointAddress::new(0x81).unwrap();
        assert!(ep_in.is_in());
        assert_eq!(ep_in.number(), 1);

        let ep_out = EndpointAddress::new(0x02).unwrap();
        assert!(!ep_out.is_in());
        assert_eq!(ep_out.number(), 2);
    }

    #[test]
    fn test_endpoint_reserved_bits() {
        assert_eq!(
            EndpointAddress::new(0x91),
            Err(ProtocolError::InvalidEndpoint { address: 0x91 })
        );
    }

    #[test]
    fn test_interrupt_read_requires_in_endpoint() {
        let out = EndpointAddress::new(0x01).unwrap();
        assert!(InterruptRead::new(out, 8, Duration::from_millis(100)).is_err());

        let ep = EndpointAddress::new(0x81).unwrap();
        assert_eq!(
            InterruptRead::new(ep, 0, Duration::from_millis(100)),
            Err(ProtocolError::EmptyTransfer)
        );
        assert!(InterruptRead::new(ep, 8, Duration::from_millis(100)).is_ok());
    }

    #[test]
    fn test_usb_error_display() {
        assert_eq!(UsbError::Pipe.to_string(), "endpoint stalled");
        let other = UsbError::Other {
            message: "weird".to_string(),
        };
        assert_eq!(other.to_string(), "weird");
    }
}
