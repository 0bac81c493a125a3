//! USB subsystem
//!
//! Locates the target device, selects its first interface and endpoint,
//! prepares it for user-space access and runs the transfers.
//!
//! Everything past device selection is written against
//! [`common::HidTransport`], so the same code drives a real
//! `rusb::DeviceHandle` and the scripted mock used in tests.

pub mod device;
pub mod driver;
pub mod locator;
pub mod poller;
pub mod transfers;

pub use device::HidDevice;
pub use driver::{Preparation, prepare_device};
pub use locator::DeviceLocator;
pub use poller::{PollSummary, Poller, Schedule};
pub use transfers::issue_control;
