//! Common utilities for hid-probe
//!
//! This crate provides shared functionality for the probe binary: the
//! error type, logging setup, the `HidTransport` seam over libusb device
//! handles, and a scripted mock transport for tests.

pub mod error;
pub mod logging;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod transport;

pub use error::{Error, Result};
pub use logging::setup_logging;
pub use transport::{HidTransport, map_rusb_error};
