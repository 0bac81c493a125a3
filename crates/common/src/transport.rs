//! Transport seam between the probe logic and libusb
//!
//! The run loop, control issuer and driver preparation are written against
//! [`HidTransport`] so they can be driven by a scripted mock in tests. The
//! real implementation forwards to `rusb::DeviceHandle`.

use protocol::{ControlSetup, UsbError};
use rusb::{DeviceHandle, UsbContext};
use std::time::Duration;

/// Synchronous USB operations needed to talk to a HID interface
pub trait HidTransport {
    /// Device-to-host control transfer; returns the number of bytes read
    fn read_control(
        &self,
        setup: &ControlSetup,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, UsbError>;

    /// Interrupt IN transfer; returns the number of bytes read
    fn read_interrupt(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, UsbError>;

    fn reset(&mut self) -> Result<(), UsbError>;

    fn kernel_driver_active(&self, interface: u8) -> Result<bool, UsbError>;

    fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), UsbError>;

    fn set_active_configuration(&mut self, configuration: u8) -> Result<(), UsbError>;

    fn claim_interface(&mut self, interface: u8) -> Result<(), UsbError>;
}

impl<T: UsbContext> HidTransport for DeviceHandle<T> {
    fn read_control(
        &self,
        setup: &ControlSetup,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, UsbError> {
        DeviceHandle::read_control(
            self,
            setup.request_type,
            setup.request,
            setup.value,
            setup.index,
            buf,
            timeout,
        )
        .map_err(map_rusb_error)
    }

    fn read_interrupt(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, UsbError> {
        DeviceHandle::read_interrupt(self, endpoint, buf, timeout).map_err(map_rusb_error)
    }

    fn reset(&mut self) -> Result<(), UsbError> {
        DeviceHandle::reset(self).map_err(map_rusb_error)
    }

    fn kernel_driver_active(&self, interface: u8) -> Result<bool, UsbError> {
        DeviceHandle::kernel_driver_active(self, interface).map_err(map_rusb_error)
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), UsbError> {
        DeviceHandle::detach_kernel_driver(self, interface).map_err(map_rusb_error)
    }

    fn set_active_configuration(&mut self, configuration: u8) -> Result<(), UsbError> {
        DeviceHandle::set_active_configuration(self, configuration).map_err(map_rusb_error)
    }

    fn claim_interface(&mut self, interface: u8) -> Result<(), UsbError> {
        DeviceHandle::claim_interface(self, interface).map_err(map_rusb_error)
    }
}

/// Map rusb::Error to protocol::UsbError
pub fn map_rusb_error(err: rusb::Error) -> UsbError {
    match err {
        rusb::Error::Timeout => UsbError::Timeout,
        rusb::Error::Pipe => UsbError::Pipe,
        rusb::Error::NoDevice => UsbError::NoDevice,
        rusb::Error::NotFound => UsbError::NotFound,
        rusb::Error::Busy => UsbError::Busy,
        rusb::Error::Overflow => UsbError::Overflow,
        rusb::Error::Io => UsbError::Io,
        rusb::Error::InvalidParam => UsbError::InvalidParam,
        rusb::Error::Access => UsbError::Access,
        rusb::Error::NotSupported => UsbError::NotSupported,
        _ => UsbError::Other {
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_rusb_error() {
        assert_eq!(map_rusb_error(rusb::Error::Timeout), UsbError::Timeout);
        assert_eq!(map_rusb_error(rusb::Error::Pipe), UsbError::Pipe);
        assert_eq!(map_rusb_error(rusb::Error::NoDevice), UsbError::NoDevice);
        assert_eq!(map_rusb_error(rusb::Error::NotFound), UsbError::NotFound);
        assert_eq!(
            map_rusb_error(rusb::Error::NotSupported),
            UsbError::NotSupported
        );
    }

    #[test]
    fn test_map_rusb_error_other() {
        assert!(matches!(
            map_rusb_error(rusb::Error::NoMem),
            UsbError::Other { .. }
        ));
    }
}
