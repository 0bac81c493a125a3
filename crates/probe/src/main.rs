//! hid-probe
//!
//! Opens one USB HID device by vendor/product id, sends a class-specific
//! control request and polls its interrupt IN endpoint, printing raw bytes.

mod config;
mod output;
mod session;
mod usb;

use anyhow::{Context, Result};
use clap::Parser;
use common::setup_logging;
use config::{Overrides, ProbeConfig, RunPlan, Variant};
use protocol::UsbId;
use std::io::{self, Write};
use tracing::{debug, info};
use usb::{DeviceLocator, HidDevice};

#[derive(Parser, Debug)]
#[command(name = "hid-probe")]
#[command(
    author,
    version,
    about = "Query a USB HID device with a class control request and poll its interrupt endpoint"
)]
#[command(long_about = "
Opens the first USB device matching a vendor/product id, sends one
class-specific IN control request (bmRequestType 0xA1) and reads the
interrupt IN endpoint, printing raw bytes to stdout.

VARIANTS:
    single  Print the active configuration, send bRequest 1, read once
    poll    Reset, detach the kernel driver, set the configuration,
            send bRequest 2, then read 1000 times every 250 ms

EXAMPLES:
    # Probe the default device (0x03eb:0x2ff4) once
    hid-probe

    # Poll with the kernel driver detached (needs permission to the device)
    hid-probe --variant poll

    # Another device, GET_REPORT instead of the poll default
    hid-probe --variant poll --device 0x16c0:0x27db --request 1

CONFIGURATION:
    The probe looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/hid-probe/probe.toml
    3. /etc/hid-probe/probe.toml
    4. Built-in defaults
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Save default configuration to --config PATH (or the default location) and exit
    #[arg(long)]
    save_config: bool,

    /// Which run shape to execute
    #[arg(long, value_enum)]
    variant: Option<Variant>,

    /// Device to open as VID:PID, e.g. 0x03eb:0x2ff4
    #[arg(short, long, value_name = "VID:PID")]
    device: Option<UsbId>,

    /// bRequest for the control transfer (decimal or 0x-prefixed hex)
    #[arg(short, long, value_parser = parse_u8)]
    request: Option<u8>,

    /// Number of polling iterations
    #[arg(short = 'n', long)]
    iterations: Option<u32>,

    /// Delay after each iteration in milliseconds (0 = none)
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            log_level: self.log_level.clone(),
            variant: self.variant,
            device: self.device,
            request: self.request,
            iterations: self.iterations,
            interval_ms: self.interval_ms,
        }
    }
}

fn parse_u8(s: &str) -> std::result::Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("'{}' is not a valid byte: {}", s, e))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --save-config flag early (before loading config)
    if args.save_config {
        let config = ProbeConfig::default();
        let path = args
            .config
            .as_deref()
            .map(ProbeConfig::expand_path)
            .unwrap_or_else(ProbeConfig::default_path);
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let mut config = if let Some(ref path) = args.config {
        ProbeConfig::load(Some(path.clone())).context("Failed to load configuration")?
    } else {
        ProbeConfig::load_or_default().context("Failed to load configuration")?
    };
    config.apply_overrides(&args.overrides());

    setup_logging(&config.general.log_level).context("Failed to setup logging")?;

    info!("hid-probe v{}", env!("CARGO_PKG_VERSION"));

    let plan = config.plan().context("Invalid configuration")?;
    run(&plan)
}

/// Locate and open the device, then run the session on it
fn run(plan: &RunPlan) -> Result<()> {
    info!("Running {:?} variant against {}", plan.variant, plan.device);

    let context = rusb::Context::new().context("Failed to initialize libusb")?;
    let device = DeviceLocator::new(plan.device)
        .locate(&context)
        .context("Failed to locate device")?;
    let mut hid = HidDevice::open(device).context("Failed to open device")?;
    let target = hid.target();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if plan.show_configuration {
        let active = hid
            .active_configuration()
            .context("Failed to read active configuration")?;
        writeln!(out, "{}", active)?;
    }

    let report =
        session::run_session(hid.handle_mut(), &target, plan, &mut out, std::thread::sleep)?;

    if let Some(prep) = report.preparation {
        debug!("Kernel driver detached: {}", prep.driver_detached);
    }
    debug!(
        "Done: control reply {} bytes, {} of {} reads returned data",
        report.control_reply.len(),
        report.poll.reports,
        report.poll.iterations
    );

    Ok(())
}
