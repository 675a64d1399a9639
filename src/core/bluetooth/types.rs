//! Defines shared data structures for the Bluetooth module.

use std::fmt;

use crate::core::bluetooth::gatt::GattDevice;

/// Printable snapshot of a discovered Bluetooth device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    /// The address of the device (MAC address where the platform exposes one)
    pub address: String,
    /// The name of the device, or an empty string when it did not advertise one
    pub name: String,
    /// Whether the device is connected
    pub connected: bool,
}

impl DeviceSummary {
    /// Creates a new DeviceSummary instance
    pub fn new(address: String, name: String, connected: bool) -> Self {
        Self {
            address,
            name,
            connected,
        }
    }

    /// Captures the current state of a device
    pub async fn of<D: GattDevice>(device: &D) -> Self {
        Self::new(device.address(), device.name(), device.is_connected().await)
    }
}

impl fmt::Display for DeviceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Address = {} Name = {} Connected = {}",
            self.address, self.name, self.connected
        )
    }
}
