//! Device lookup by vendor/product identifier

use common::{Error, Result, map_rusb_error};
use protocol::UsbId;
use rusb::{Device, UsbContext};
use std::fmt;
use tracing::{debug, warn};

/// Finds the first device carrying a given vendor/product pair
pub struct DeviceLocator {
    id: UsbId,
}

impl DeviceLocator {
    pub fn new(id: UsbId) -> Self {
        Self { id }
    }

    /// Enumerate the bus and return the first matching device
    ///
    /// Devices whose descriptor cannot be read are skipped.
    pub fn locate<T: UsbContext>(&self, context: &T) -> Result<Device<T>> {
        let devices = context
            .devices()
            .map_err(|e| Error::transfer("device enumeration", map_rusb_error(e)))?;

        let descriptors = devices.iter().map(|device| {
            let ids = device
                .device_descriptor()
                .map(|desc| (desc.vendor_id(), desc.product_id()))
                .map_err(|e| {
                    format!("bus={} addr={}: {}", device.bus_number(), device.address(), e)
                });
            (ids, device)
        });

        let device = self.first_match(readable(descriptors))?;
        debug!(
            "Found {} at bus={} addr={}",
            self.id,
            device.bus_number(),
            device.address()
        );
        Ok(device)
    }

    /// Pick the first `(vendor_id, product_id, item)` whose ids match
    ///
    /// There is no disambiguation: with several matches the first one in
    /// enumeration order wins.
    pub fn first_match<D>(
        &self,
        candidates: impl IntoIterator<Item = (u16, u16, D)>,
    ) -> Result<D> {
        let mut matches = candidates
            .into_iter()
            .filter(|(vid, pid, _)| self.id.matches(*vid, *pid))
            .map(|(_, _, item)| item);

        let first = matches.next().ok_or(Error::DeviceNotFound {
            vendor_id: self.id.vendor_id,
            product_id: self.id.product_id,
        })?;

        let others = matches.count();
        if others > 0 {
            warn!("{} devices match {}, using the first one", others + 1, self.id);
        }

        Ok(first)
    }
}

/// Drop devices whose descriptor could not be read
///
/// Each entry pairs the descriptor lookup result with the device it came from.
fn readable<D, E: fmt::Display>(
    devices: impl IntoIterator<Item = (std::result::Result<(u16, u16), E>, D)>,
) -> impl Iterator<Item = (u16, u16, D)> {
    devices.into_iter().filter_map(|(ids, device)| match ids {
        Ok((vendor_id, product_id)) => Some((vendor_id, product_id, device)),
        Err(e) => {
            debug!("Skipping device {}", e);
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: UsbId = UsbId::new(0x03eb, 0x2ff4);

    #[test]
    fn test_first_match_single() {
        let locator = DeviceLocator::new(TARGET);
        let bus = vec![
            (0x1d6b, 0x0002, "root hub"),
            (0x03eb, 0x2ff4, "keyboard"),
            (0x046d, 0xc52b, "receiver"),
        ];
        assert_eq!(locator.first_match(bus).unwrap(), "keyboard");
    }

    #[test]
    fn test_first_match_picks_first_of_many() {
        let locator = DeviceLocator::new(TARGET);
        let bus = vec![
            (0x03eb, 0x2ff4, 1),
            (0x03eb, 0x2ff4, 2),
            (0x03eb, 0x2ff4, 3),
        ];
        assert_eq!(locator.first_match(bus).unwrap(), 1);
    }

    #[test]
    fn test_first_match_requires_both_ids() {
        let locator = DeviceLocator::new(TARGET);
        let bus = vec![(0x03eb, 0x2ff5, ()), (0x03ec, 0x2ff4, ())];
        let err = locator.first_match(bus).unwrap_err();
        assert!(matches!(
            err,
            Error::DeviceNotFound {
                vendor_id: 0x03eb,
                product_id: 0x2ff4
            }
        ));
    }

    #[test]
    fn test_first_match_empty_bus() {
        let locator = DeviceLocator::new(TARGET);
        let bus: Vec<(u16, u16, ())> = Vec::new();
        assert!(locator.first_match(bus).is_err());
    }

    #[test]
    fn test_unreadable_descriptors_skipped() {
        let locator = DeviceLocator::new(TARGET);
        let bus: Vec<(std::result::Result<(u16, u16), &str>, &str)> = vec![
            (Err("bus=1 addr=2: Access denied"), "hub"),
            (Ok((0x03eb, 0x2ff4)), "keyboard"),
        ];
        assert_eq!(locator.first_match(readable(bus)).unwrap(), "keyboard");
    }

    #[test]
    fn test_only_unreadable_devices_is_not_found() {
        let locator = DeviceLocator::new(TARGET);
        let bus: Vec<(std::result::Result<(u16, u16), &str>, ())> =
            vec![(Err("bus=1 addr=3: Pipe error"), ())];
        assert!(matches!(
            locator.first_match(readable(bus)),
            Err(Error::DeviceNotFound { .. })
        ));
    }
}
