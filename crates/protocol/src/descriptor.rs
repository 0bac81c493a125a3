//! Descriptor snapshots
//!
//! Plain copies of the configuration, interface and endpoint descriptor
//! fields the tool prints and selects from. Built by the USB layer from
//! rusb descriptors so that selection logic can be tested without hardware.

use crate::types::EndpointAddress;
use std::fmt;

/// Endpoint transfer type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Control,
    Isochronous,
    Bulk,
    Interrupt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSummary {
    pub address: EndpointAddress,
    pub kind: EndpointKind,
    pub max_packet_size: u16,
    /// Polling interval in frames
    pub interval: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceSummary {
    pub number: u8,
    pub alternate_setting: u8,
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
    pub endpoints: Vec<EndpointSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationSummary {
    /// bConfigurationValue
    pub number: u8,
    pub max_power_ma: u16,
    pub self_powered: bool,
    pub remote_wakeup: bool,
    pub interfaces: Vec<InterfaceSummary>,
}

/// The interface and endpoint the tool talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedTarget {
    pub configuration: u8,
    pub interface: u8,
    pub endpoint: EndpointAddress,
}

impl ConfigurationSummary {
    /// First interface of this configuration and its first endpoint
    pub fn select_first(&self) -> Option<SelectedTarget> {
        let interface = self.interfaces.first()?;
        let endpoint = interface.endpoints.first()?;
        Some(SelectedTarget {
            configuration: self.number,
            interface: interface.number,
            endpoint: endpoint.address,
        })
    }
}

/// Human-readable name for a USB interface class code
pub fn class_name(class: u8) -> &'static str {
    match class {
        0x01 => "Audio",
        0x02 => "CDC Communication",
        0x03 => "Human Interface Device",
        0x07 => "Printer",
        0x08 => "Mass Storage",
        0x09 => "Hub",
        0x0a => "CDC Data",
        0x0e => "Video",
        0xfe => "Application Specific",
        0xff => "Vendor Specific",
        _ => "Unknown",
    }
}

impl fmt::Display for EndpointSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.address.is_in() { "IN" } else { "OUT" };
        writeln!(f, "    ENDPOINT {}: {:?} {}", self.address, self.kind, direction)?;
        writeln!(
            f,
            "      wMaxPacketSize : {:#x} ({} bytes)",
            self.max_packet_size, self.max_packet_size
        )?;
        write!(f, "      bInterval      : {:#x}", self.interval)
    }
}

impl fmt::Display for InterfaceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  INTERFACE {}: {}", self.number, class_name(self.class))?;
        writeln!(f, "    bAlternateSetting  : {:#x}", self.alternate_setting)?;
        writeln!(f, "    bNumEndpoints      : {:#x}", self.endpoints.len())?;
        writeln!(f, "    bInterfaceClass    : {:#x}", self.class)?;
        writeln!(f, "    bInterfaceSubClass : {:#x}", self.subclass)?;
        write!(f, "    bInterfaceProtocol : {:#x}", self.protocol)?;
        for endpoint in &self.endpoints {
            write!(f, "\n{}", endpoint)?;
        }
        Ok(())
    }
}

impl fmt::Display for ConfigurationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CONFIGURATION {}: {} mA", self.number, self.max_power_ma)?;
        writeln!(f, "  bNumInterfaces      : {:#x}", self.interfaces.len())?;
        writeln!(f, "  Self Powered        : {}", self.self_powered)?;
        write!(f, "  Remote Wakeup       : {}", self.remote_wakeup)?;
        for interface in &self.interfaces {
            write!(f, "\n{}", interface)?;
        }
        Ok(())
    }
}
