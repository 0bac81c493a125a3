//! One probe run against an opened device
//!
//! Prepare (optional), claim the interface, issue the control transfer
//! once, then poll. Kept
//! separate from device lookup so the whole sequence runs against a mock.

use crate::config::RunPlan;
use crate::usb::{PollSummary, Poller, Preparation, issue_control, prepare_device};
use common::{Error, HidTransport, Result};
use protocol::{HidClassRequest, SelectedTarget, split_report_value};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub preparation: Option<Preparation>,
    pub control_reply: Vec<u8>,
    pub poll: PollSummary,
}

pub fn run_session<H, W>(
    transport: &mut H,
    target: &SelectedTarget,
    plan: &RunPlan,
    out: W,
    sleep: impl FnMut(Duration),
) -> Result<SessionReport>
where
    H: HidTransport + ?Sized,
    W: Write,
{
    if target.endpoint != plan.interrupt.endpoint {
        warn!(
            "First endpoint of interface {} is {}, polling {} as configured",
            target.interface, target.endpoint, plan.interrupt.endpoint
        );
    }

    let preparation = if plan.prepare_device {
        let prep = prepare_device(&mut *transport, target)?;
        Some(prep)
    } else {
        None
    };

    // Interface-recipient class requests go to a claimed interface
    transport
        .claim_interface(target.interface)
        .map_err(|e| Error::transfer("claim interface", e))?;
    debug!("Claimed interface {}", target.interface);

    let request_name = HidClassRequest::from_code(plan.control.request)
        .map(|r| r.name())
        .unwrap_or("non-standard request");
    let (report_type, report_id) = split_report_value(plan.control.value);
    info!(
        "Sending bRequest {} ({}), report type {:?}, report id {}",
        plan.control.request, request_name, report_type, report_id
    );
    let control_reply = issue_control(&*transport, &plan.control, plan.control_timeout)?;

    let poll = Poller::new(&*transport, plan.interrupt, out).run(
        &control_reply,
        &plan.schedule,
        sleep,
    )?;

    info!(
        "Polled {} times: {} reports, {} timeouts",
        poll.iterations, poll.reports, poll.timeouts
    );

    Ok(SessionReport {
        preparation,
        control_reply,
        poll,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProbeConfig, Variant};
    use common::test_utils::{MockOp, MockTransport, TransportCall};
    use protocol::{ControlSetup, EndpointAddress, UsbError};

    fn target() -> SelectedTarget {
        SelectedTarget {
            configuration: 1,
            interface: 0,
            endpoint: EndpointAddress::new(0x81).unwrap(),
        }
    }

    fn plan(variant: Variant) -> RunPlan {
        let mut config = ProbeConfig::default();
        config.general.variant = variant;
        config.plan().unwrap()
    }

    #[test]
    fn test_single_variant_sequence() {
        let mut mock = MockTransport::new().with_control_reply(vec![0x01, 0x02]);
        let mut out: Vec<u8> = Vec::new();
        let mut sleeps = 0;

        let report = run_session(&mut mock, &target(), &plan(Variant::Single), &mut out, |_| {
            sleeps += 1
        })
        .unwrap();

        assert_eq!(report.preparation, None);
        assert_eq!(report.control_reply, vec![0x01, 0x02]);
        assert_eq!(report.poll.iterations, 1);
        assert_eq!(sleeps, 0);
        assert_eq!(
            mock.calls(),
            vec![
                TransportCall::ClaimInterface(0),
                TransportCall::ReadControl(ControlSetup::hid_class_in(1, 0x0200, 0, 64)),
                TransportCall::ReadInterrupt {
                    endpoint: 0x81,
                    length: 8,
                    timeout: Duration::from_millis(100),
                },
            ]
        );
    }

    #[test]
    fn test_poll_variant_sequence() {
        let mut mock = MockTransport::new()
            .with_kernel_driver(true)
            .with_control_reply(vec![0; 64]);
        let mut out: Vec<u8> = Vec::new();
        let mut slept = Duration::ZERO;

        let report = run_session(&mut mock, &target(), &plan(Variant::Poll), &mut out, |d| {
            slept += d
        })
        .unwrap();

        assert_eq!(
            report.preparation,
            Some(Preparation {
                driver_detached: true
            })
        );
        assert_eq!(report.poll.iterations, 1000);
        assert_eq!(slept, Duration::from_millis(250) * 1000);

        let calls = mock.calls();
        assert_eq!(
            &calls[..6],
            &[
                TransportCall::Reset,
                TransportCall::KernelDriverActive(0),
                TransportCall::DetachKernelDriver(0),
                TransportCall::SetActiveConfiguration(1),
                TransportCall::ClaimInterface(0),
                TransportCall::ReadControl(ControlSetup::hid_class_in(2, 0x0200, 0, 64)),
            ]
        );
        assert_eq!(
            mock.count_calls(|c| matches!(c, TransportCall::ReadControl(_))),
            1
        );
        assert_eq!(
            mock.count_calls(|c| matches!(c, TransportCall::ClaimInterface(_))),
            1
        );
    }

    #[test]
    fn test_control_failure_skips_polling() {
        let mut mock = MockTransport::new().with_control_error(UsbError::Pipe);
        let mut out: Vec<u8> = Vec::new();

        let result = run_session(&mut mock, &target(), &plan(Variant::Poll), &mut out, |_| {});

        assert!(matches!(
            result,
            Err(Error::Transfer {
                source: UsbError::Pipe,
                ..
            })
        ));
        assert!(out.is_empty());
        assert_eq!(
            mock.count_calls(|c| matches!(c, TransportCall::ReadInterrupt { .. })),
            0
        );
    }

    #[test]
    fn test_claim_failure_stops_before_control() {
        let mut mock = MockTransport::new().failing(MockOp::ClaimInterface, UsbError::Busy);
        let mut out: Vec<u8> = Vec::new();

        let result = run_session(&mut mock, &target(), &plan(Variant::Single), &mut out, |_| {});

        assert!(matches!(
            result,
            Err(Error::Transfer {
                operation: "claim interface",
                source: UsbError::Busy,
            })
        ));
        assert!(out.is_empty());
        assert_eq!(mock.calls(), vec![TransportCall::ClaimInterface(0)]);
    }
}
