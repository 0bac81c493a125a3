//! Kernel driver detachment
//!
//! Takes the target interface away from the operating system so user space
//! can read its interrupt endpoint. The driver is not re-attached on exit
//! and nothing is rolled back when a step fails.

use common::{Error, HidTransport, Result};
use protocol::{SelectedTarget, UsbError};
use tracing::{debug, info};

/// What preparation changed on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preparation {
    pub driver_detached: bool,
}

/// Reset, detach an active kernel driver, then set the configuration
///
/// Detachment is attempted only when the kernel reports a driver bound to
/// the target interface. Platforms without kernel driver support count as
/// "no driver active".
pub fn prepare_device<H: HidTransport + ?Sized>(
    transport: &mut H,
    target: &SelectedTarget,
) -> Result<Preparation> {
    transport
        .reset()
        .map_err(|e| Error::transfer("device reset", e))?;
    debug!("Reset device");

    let active = match transport.kernel_driver_active(target.interface) {
        Ok(active) => active,
        Err(UsbError::NotSupported) => {
            debug!("Kernel driver query not supported on this platform");
            false
        }
        Err(e) => return Err(Error::transfer("kernel driver query", e)),
    };

    if active {
        transport
            .detach_kernel_driver(target.interface)
            .map_err(|e| Error::transfer("kernel driver detach", e))?;
        info!("Detached kernel driver from interface {}", target.interface);
    } else {
        debug!("No kernel driver active on interface {}", target.interface);
    }

    transport
        .set_active_configuration(target.configuration)
        .map_err(|e| Error::transfer("set configuration", e))?;
    debug!("Set configuration {}", target.configuration);

    Ok(Preparation {
        driver_detached: active,
    })
}
