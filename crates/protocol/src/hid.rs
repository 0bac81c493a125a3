//! HID class control requests
//!
//! Setup packet layout for class-specific, interface-recipient requests as
//! described in the HID 1.11 specification, section 7.2.

use crate::error::{ProtocolError, Result};
use crate::types::DIRECTION_IN;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `bmRequestType` type field: class
pub const REQUEST_TYPE_CLASS: u8 = 0x20;

/// `bmRequestType` recipient field: interface
pub const RECIPIENT_INTERFACE: u8 = 0x01;

/// Class request, interface recipient, device-to-host
pub const HID_CLASS_IN: u8 = DIRECTION_IN | REQUEST_TYPE_CLASS | RECIPIENT_INTERFACE;

/// HID report type carried in the high byte of `wValue`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Input = 1,
    Output = 2,
    Feature = 3,
}

impl ReportType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Input),
            2 => Some(Self::Output),
            3 => Some(Self::Feature),
            _ => None,
        }
    }
}

/// Compose `wValue` from a report type and report ID
pub fn report_value(report_type: ReportType, report_id: u8) -> u16 {
    ((report_type as u16) << 8) | report_id as u16
}

/// Split `wValue` into report type and report ID
///
/// Returns `None` for the report type when the high byte is not a defined
/// HID report type.
pub fn split_report_value(value: u16) -> (Option<ReportType>, u8) {
    (ReportType::from_u8((value >> 8) as u8), (value & 0xff) as u8)
}

/// Names of the HID class request codes
///
/// Only used to make logs readable. Unknown codes are still sent as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HidClassRequest {
    GetReport,
    GetIdle,
    GetProtocol,
    SetReport,
    SetIdle,
    SetProtocol,
}

impl HidClassRequest {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::GetReport),
            0x02 => Some(Self::GetIdle),
            0x03 => Some(Self::GetProtocol),
            0x09 => Some(Self::SetReport),
            0x0a => Some(Self::SetIdle),
            0x0b => Some(Self::SetProtocol),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetReport => "GET_REPORT",
            Self::GetIdle => "GET_IDLE",
            Self::GetProtocol => "GET_PROTOCOL",
            Self::SetReport => "SET_REPORT",
            Self::SetIdle => "SET_IDLE",
            Self::SetProtocol => "SET_PROTOCOL",
        }
    }
}

/// Control transfer setup parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSetup {
    /// bmRequestType
    pub request_type: u8,
    /// bRequest
    pub request: u8,
    /// wValue
    pub value: u16,
    /// wIndex (interface number for interface-recipient requests)
    pub index: u16,
    /// wLength, the maximum reply size
    pub length: u16,
}

impl ControlSetup {
    /// Class request to an interface, reading from the device
    pub fn hid_class_in(request: u8, value: u16, index: u16, length: u16) -> Self {
        Self {
            request_type: HID_CLASS_IN,
            request,
            value,
            index,
            length,
        }
    }

    pub fn is_device_to_host(&self) -> bool {
        self.request_type & DIRECTION_IN != 0
    }

    /// Check the setup describes a non-empty IN transfer
    pub fn validate_in(&self) -> Result<()> {
        if !self.is_device_to_host() {
            return Err(ProtocolError::WrongDirection {
                what: "control request",
            });
        }
        if self.length == 0 {
            return Err(ProtocolError::EmptyTransfer);
        }
        Ok(())
    }
}

impl fmt::Display for ControlSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = HidClassRequest::from_code(self.request)
            .map(|r| r.name())
            .unwrap_or("UNKNOWN");
        write!(
            f,
            "bmRequestType={:#04x} bRequest={:#04x} ({}) wValue={:#06x} wIndex={} wLength={}",
            self.request_type, self.request, name, self.value, self.index, self.length
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hid_class_in_request_type() {
        assert_eq!(HID_CLASS_IN, 0xA1);
        let setup = ControlSetup::hid_class_in(1, 0x0200, 0, 64);
        assert_eq!(setup.request_type, 0xA1);
        assert!(setup.is_device_to_host());
        assert!(setup.validate_in().is_ok());
    }

    #[test]
    fn test_validate_in_rejects_out() {
        let setup = ControlSetup {
            request_type: 0x21,
            request: 0x09,
            value: 0x0200,
            index: 0,
            length: 8,
        };
        assert!(setup.validate_in().is_err());
    }

    #[test]
    fn test_validate_in_rejects_zero_length() {
        let setup = ControlSetup::hid_class_in(1, 0x0200, 0, 0);
        assert_eq!(setup.validate_in(), Err(ProtocolError::EmptyTransfer));
    }

    #[test]
    fn test_report_value_0x0200() {
        assert_eq!(report_value(ReportType::Output, 0), 0x0200);
        assert_eq!(split_report_value(0x0200), (Some(ReportType::Output), 0));
        assert_eq!(split_report_value(0x0105), (Some(ReportType::Input), 5));
        assert_eq!(split_report_value(0x0700), (None, 0));
    }

    #[test]
    fn test_class_request_names() {
        assert_eq!(HidClassRequest::from_code(1), Some(HidClassRequest::GetReport));
        assert_eq!(HidClassRequest::from_code(2), Some(HidClassRequest::GetIdle));
        assert_eq!(HidClassRequest::from_code(0x42), None);
    }

    #[test]
    fn test_setup_display() {
        let setup = ControlSetup::hid_class_in(2, 0x0200, 0, 64);
        let text = setup.to_string();
        assert!(text.contains("bmRequestType=0xa1"));
        assert!(text.contains("bRequest=0x02 (GET_IDLE)"));
        assert!(text.contains("wValue=0x0200"));
        assert!(text.contains("wLength=64"));
    }
}
