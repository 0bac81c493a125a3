//! Test utilities for hid-probe
//!
//! Provides a scripted [`MockTransport`] that stands in for a USB device
//! handle and records every call made against it.
//!
//! Only built for tests, or with the `test-utils` feature.

use crate::transport::HidTransport;
use protocol::{ControlSetup, UsbError};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

/// A call recorded by [`MockTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    ReadControl(ControlSetup),
    ReadInterrupt {
        endpoint: u8,
        length: usize,
        timeout: Duration,
    },
    Reset,
    KernelDriverActive(u8),
    DetachKernelDriver(u8),
    SetActiveConfiguration(u8),
    ClaimInterface(u8),
}

/// Operations that can be scripted to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOp {
    Reset,
    DetachKernelDriver,
    SetActiveConfiguration,
    ClaimInterface,
}

/// Scripted stand-in for a device handle
///
/// Interrupt reads are served from a queue; once the queue is empty every
/// further read times out.
pub struct MockTransport {
    control_reply: Result<Vec<u8>, UsbError>,
    interrupt_reads: RefCell<VecDeque<Result<Vec<u8>, UsbError>>>,
    kernel_driver: Result<bool, UsbError>,
    failures: Vec<(MockOp, UsbError)>,
    calls: RefCell<Vec<TransportCall>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            control_reply: Ok(Vec::new()),
            interrupt_reads: RefCell::new(VecDeque::new()),
            kernel_driver: Ok(false),
            failures: Vec::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Bytes the device answers every control transfer with
    ///
    /// Replies longer than the caller's buffer are cut to the buffer size,
    /// as libusb does.
    pub fn with_control_reply(mut self, reply: impl Into<Vec<u8>>) -> Self {
        self.control_reply = Ok(reply.into());
        self
    }

    pub fn with_control_error(mut self, error: UsbError) -> Self {
        self.control_reply = Err(error);
        self
    }

    pub fn with_interrupt_reads<I>(self, reads: I) -> Self
    where
        I: IntoIterator<Item = Result<Vec<u8>, UsbError>>,
    {
        self.interrupt_reads.borrow_mut().extend(reads);
        self
    }

    pub fn with_kernel_driver(mut self, active: bool) -> Self {
        self.kernel_driver = Ok(active);
        self
    }

    pub fn with_kernel_driver_error(mut self, error: UsbError) -> Self {
        self.kernel_driver = Err(error);
        self
    }

    pub fn failing(mut self, op: MockOp, error: UsbError) -> Self {
        self.failures.push((op, error));
        self
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.borrow().clone()
    }

    pub fn count_calls(&self, predicate: impl Fn(&TransportCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: TransportCall) {
        self.calls.borrow_mut().push(call);
    }

    fn scripted(&self, op: MockOp) -> Result<(), UsbError> {
        match self.failures.iter().find(|(o, _)| *o == op) {
            Some((_, error)) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl HidTransport for MockTransport {
    fn read_control(
        &self,
        setup: &ControlSetup,
        buf: &mut [u8],
        _timeout: Duration,
    ) -> Result<usize, UsbError> {
        self.record(TransportCall::ReadControl(*setup));
        let reply = self.control_reply.as_ref().map_err(Clone::clone)?;
        let len = reply.len().min(buf.len());
        buf[..len].copy_from_slice(&reply[..len]);
        Ok(len)
    }

    fn read_interrupt(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, UsbError> {
        self.record(TransportCall::ReadInterrupt {
            endpoint,
            length: buf.len(),
            timeout,
        });
        let next = self
            .interrupt_reads
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(UsbError::Timeout));
        let data = next?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn reset(&mut self) -> Result<(), UsbError> {
        self.record(TransportCall::Reset);
        self.scripted(MockOp::Reset)
    }

    fn kernel_driver_active(&self, interface: u8) -> Result<bool, UsbError> {
        self.record(TransportCall::KernelDriverActive(interface));
        self.kernel_driver.clone()
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), UsbError> {
        self.record(TransportCall::DetachKernelDriver(interface));
        self.scripted(MockOp::DetachKernelDriver)
    }

    fn set_active_configuration(&mut self, configuration: u8) -> Result<(), UsbError> {
        self.record(TransportCall::SetActiveConfiguration(configuration));
        self.scripted(MockOp::SetActiveConfiguration)
    }

    fn claim_interface(&mut self, interface: u8) -> Result<(), UsbError> {
        self.record(TransportCall::ClaimInterface(interface));
        self.scripted(MockOp::ClaimInterface)
    }
}
