//! USB transfer execution
//!
//! Control and interrupt reads on top of [`HidTransport`], with the error
//! policy of the probe: an interrupt timeout means "no data this cycle",
//! everything else is a failure for the caller to handle.

use common::{Error, HidTransport, Result};
use protocol::{ControlSetup, InterruptRead, ReadOutcome, UsbError};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Issue one device-to-host control transfer and return the reply
///
/// The reply is truncated to the bytes actually received and is never
/// longer than `setup.length`.
pub fn issue_control<H: HidTransport + ?Sized>(
    transport: &H,
    setup: &ControlSetup,
    timeout: Duration,
) -> Result<Vec<u8>> {
    setup.validate_in()?;
    debug!("Control transfer: {}", setup);

    let mut buffer = vec![0u8; setup.length as usize];
    let len = transport
        .read_control(setup, &mut buffer, timeout)
        .map_err(|e| {
            warn!("Control transfer failed: {}", e);
            Error::transfer("control transfer", e)
        })?;
    buffer.truncate(len);

    debug!("Control transfer succeeded: {} bytes", buffer.len());
    Ok(buffer)
}

/// Attempt one bounded-timeout interrupt read
pub fn read_interrupt<H: HidTransport + ?Sized>(
    transport: &H,
    read: &InterruptRead,
) -> Result<ReadOutcome> {
    let mut buffer = vec![0u8; read.length];

    match transport.read_interrupt(read.endpoint.address(), &mut buffer, read.timeout) {
        Ok(len) => {
            buffer.truncate(len);
            trace!("Interrupt IN {}: {} bytes", read.endpoint, len);
            Ok(ReadOutcome::Data(buffer))
        }
        Err(UsbError::Timeout) => {
            trace!("Interrupt IN {} timed out", read.endpoint);
            Ok(ReadOutcome::Timeout)
        }
        Err(e) => {
            warn!("Interrupt read on {} failed: {}", read.endpoint, e);
            Err(Error::transfer("interrupt read", e))
        }
    }
}
