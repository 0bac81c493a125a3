//! Protocol library for hid-probe
//!
//! This crate models the USB and HID wire shapes the probe works with:
//! device identifiers, class control setup packets, report types, endpoint
//! addresses and descriptor snapshots. It performs no I/O.
//!
//! # Example
//!
//! ```
//! use protocol::{ControlSetup, ReportType, report_value};
//!
//! let setup = ControlSetup::hid_class_in(1, report_value(ReportType::Output, 0), 0, 64);
//! assert_eq!(setup.request_type, 0xA1);
//! assert_eq!(setup.value, 0x0200);
//! ```

pub mod descriptor;
pub mod error;
pub mod hid;
pub mod types;

pub use descriptor::{
    ConfigurationSummary, EndpointKind, EndpointSummary, InterfaceSummary, SelectedTarget,
    class_name,
};
pub use error::{ProtocolError, Result};
pub use hid::{
    ControlSetup, HID_CLASS_IN, HidClassRequest, RECIPIENT_INTERFACE, REQUEST_TYPE_CLASS,
    ReportType, report_value, split_report_value,
};
pub use types::{DIRECTION_IN, EndpointAddress, InterruptRead, ReadOutcome, UsbError, UsbId};
