//! USB device abstraction
//!
//! Wraps an opened rusb device together with the interface and endpoint
//! selected from its first configuration.

use common::{Error, Result, map_rusb_error};
use protocol::{
    ConfigurationSummary, EndpointAddress, EndpointKind, EndpointSummary, InterfaceSummary,
    SelectedTarget,
};
use rusb::{ConfigDescriptor, Device, DeviceHandle, UsbContext};
use tracing::debug;

/// Opened HID device
pub struct HidDevice<T: UsbContext> {
    /// Underlying rusb device
    device: Device<T>,
    /// Open handle used for all transfers
    handle: DeviceHandle<T>,
    /// First configuration, first interface, first endpoint
    target: SelectedTarget,
}

impl<T: UsbContext> HidDevice<T> {
    /// Open the device and select its target interface
    ///
    /// Reads the first configuration descriptor (index 0), which does not
    /// require the configuration to be active.
    pub fn open(device: Device<T>) -> Result<Self> {
        let first = device
            .config_descriptor(0)
            .map_err(|e| Error::transfer("read configuration descriptor", map_rusb_error(e)))?;
        let target = summarize_config(&first)?.select_first().ok_or_else(|| {
            Error::Descriptor(
                "first configuration has no interface with an endpoint".to_string(),
            )
        })?;

        let handle = device
            .open()
            .map_err(|e| Error::transfer("open device", map_rusb_error(e)))?;

        debug!(
            "Opened device bus={} addr={}, configuration={} interface={} endpoint={}",
            device.bus_number(),
            device.address(),
            target.configuration,
            target.interface,
            target.endpoint
        );

        Ok(Self {
            device,
            handle,
            target,
        })
    }

    pub fn target(&self) -> SelectedTarget {
        self.target
    }

    pub fn handle_mut(&mut self) -> &mut DeviceHandle<T> {
        &mut self.handle
    }

    /// Snapshot of the currently active configuration
    pub fn active_configuration(&self) -> Result<ConfigurationSummary> {
        let active = self
            .device
            .active_config_descriptor()
            .map_err(|e| Error::transfer("read active configuration", map_rusb_error(e)))?;
        summarize_config(&active)
    }
}

/// Copy the fields of a configuration descriptor tree into a summary
///
/// Every alternate setting is listed as its own interface entry.
pub fn summarize_config(config: &ConfigDescriptor) -> Result<ConfigurationSummary> {
    let mut interfaces = Vec::new();

    for interface in config.interfaces() {
        for alt in interface.descriptors() {
            let endpoints = alt
                .endpoint_descriptors()
                .map(|ep| -> Result<EndpointSummary> {
                    Ok(EndpointSummary {
                        address: EndpointAddress::new(ep.address())?,
                        kind: map_transfer_type(ep.transfer_type()),
                        max_packet_size: ep.max_packet_size(),
                        interval: ep.interval(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            interfaces.push(InterfaceSummary {
                number: alt.interface_number(),
                alternate_setting: alt.setting_number(),
                class: alt.class_code(),
                subclass: alt.sub_class_code(),
                protocol: alt.protocol_code(),
                endpoints,
            });
        }
    }

    Ok(ConfigurationSummary {
        number: config.number(),
        max_power_ma: config.max_power(),
        self_powered: config.self_powered(),
        remote_wakeup: config.remote_wakeup(),
        interfaces,
    })
}

/// Map rusb transfer type to protocol EndpointKind
fn map_transfer_type(transfer_type: rusb::TransferType) -> EndpointKind {
    match transfer_type {
        rusb::TransferType::Control => EndpointKind::Control,
        rusb::TransferType::Isochronous => EndpointKind::Isochronous,
        rusb::TransferType::Bulk => EndpointKind::Bulk,
        rusb::TransferType::Interrupt => EndpointKind::Interrupt,
    }
}
