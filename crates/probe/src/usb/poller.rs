//! Interrupt endpoint polling loop
//!
//! Each iteration prints the control reply, attempts one interrupt read and
//! then waits for the configured interval. Read timeouts are counted and
//! skipped; any other failure ends the loop.

use crate::output::{control_line, interrupt_line};
use crate::usb::transfers::read_interrupt;
use common::{HidTransport, Result};
use protocol::{InterruptRead, ReadOutcome};
use std::io::Write;
use std::time::Duration;

/// How many iterations to run and how long to wait after each
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub iterations: u32,
    /// `None` means no delay between iterations
    pub interval: Option<Duration>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub iterations: u32,
    /// Interrupt reads that returned data
    pub reports: u32,
    pub timeouts: u32,
}

/// Reads one endpoint of an already claimed interface
pub struct Poller<'a, H: HidTransport + ?Sized, W: Write> {
    transport: &'a H,
    read: InterruptRead,
    out: W,
}

impl<'a, H: HidTransport + ?Sized, W: Write> Poller<'a, H, W> {
    pub fn new(transport: &'a H, read: InterruptRead, out: W) -> Self {
        Self {
            transport,
            read,
            out,
        }
    }

    /// Run the loop to completion
    ///
    /// `sleep` is called after every iteration when the schedule has an
    /// interval.
    pub fn run(
        &mut self,
        control_reply: &[u8],
        schedule: &Schedule,
        mut sleep: impl FnMut(Duration),
    ) -> Result<PollSummary> {
        let mut summary = PollSummary::default();

        for _ in 0..schedule.iterations {
            writeln!(self.out, "{}", control_line(control_reply))?;

            match read_interrupt(self.transport, &self.read)? {
                ReadOutcome::Data(data) => {
                    summary.reports += 1;
                    writeln!(self.out, "{}", interrupt_line(self.read.endpoint, &data))?;
                }
                ReadOutcome::Timeout => summary.timeouts += 1,
            }
            self.out.flush()?;
            summary.iterations += 1;

            if let Some(interval) = schedule.interval {
                sleep(interval);
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Error;
    use common::test_utils::{MockTransport, TransportCall};
    use protocol::{EndpointAddress, UsbError};

    fn read() -> InterruptRead {
        InterruptRead::new(
            EndpointAddress::new(0x81).unwrap(),
            8,
            Duration::from_millis(100),
        )
        .unwrap()
    }

    fn run(
        mock: &MockTransport,
        schedule: Schedule,
    ) -> (Result<PollSummary>, Vec<Duration>, String) {
        let mut out = Vec::new();
        let mut sleeps = Vec::new();
        let result = Poller::new(mock, read(), &mut out).run(&[0xAA, 0xBB], &schedule, |d| {
            sleeps.push(d)
        });
        (result, sleeps, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_single_iteration_no_delay() {
        let mock = MockTransport::new();
        let schedule = Schedule {
            iterations: 1,
            interval: None,
        };
        let (result, sleeps, out) = run(&mock, schedule);

        assert_eq!(
            result.unwrap(),
            PollSummary {
                iterations: 1,
                reports: 0,
                timeouts: 1
            }
        );
        assert!(sleeps.is_empty());
        assert_eq!(out, "control [2 bytes]: aa bb\n");
    }

    #[test]
    fn test_thousand_iterations_with_delay() {
        let mock = MockTransport::new()
            .with_interrupt_reads([Ok(vec![0, 0, 4, 0, 0, 0, 0, 0]), Ok(vec![0; 8])]);
        let schedule = Schedule {
            iterations: 1000,
            interval: Some(Duration::from_millis(250)),
        };
        let (result, sleeps, out) = run(&mock, schedule);

        let summary = result.unwrap();
        assert_eq!(summary.iterations, 1000);
        assert_eq!(summary.reports, 2);
        assert_eq!(summary.timeouts, 998);
        assert_eq!(sleeps.len(), 1000);
        assert!(sleeps.iter().all(|d| *d == Duration::from_millis(250)));

        assert_eq!(out.lines().filter(|l| l.starts_with("control")).count(), 1000);
        assert_eq!(out.lines().filter(|l| l.starts_with("interrupt")).count(), 2);
        assert_eq!(
            mock.count_calls(|c| matches!(c, TransportCall::ReadInterrupt { .. })),
            1000
        );
    }

    #[test]
    fn test_timeouts_do_not_abort() {
        let mock = MockTransport::new().with_interrupt_reads([
            Err(UsbError::Timeout),
            Err(UsbError::Timeout),
            Ok(vec![1]),
        ]);
        let schedule = Schedule {
            iterations: 3,
            interval: None,
        };
        let (result, _, out) = run(&mock, schedule);

        assert_eq!(result.unwrap().timeouts, 2);
        assert!(out.ends_with("interrupt 0x81 [1 bytes]: 01\n"));
    }

    #[test]
    fn test_read_error_aborts_loop() {
        let mock = MockTransport::new()
            .with_interrupt_reads([Ok(vec![1]), Err(UsbError::NoDevice), Ok(vec![2])]);
        let schedule = Schedule {
            iterations: 10,
            interval: Some(Duration::from_millis(250)),
        };
        let (result, sleeps, _) = run(&mock, schedule);

        assert!(matches!(
            result,
            Err(Error::Transfer {
                source: UsbError::NoDevice,
                ..
            })
        ));
        assert_eq!(sleeps.len(), 1);
        assert_eq!(
            mock.count_calls(|c| matches!(c, TransportCall::ReadInterrupt { .. })),
            2
        );
    }
}
