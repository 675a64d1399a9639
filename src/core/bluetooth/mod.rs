//! Bluetooth functionality for the sensor probe
//! This module handles discovery, GATT lookup, connection and polling of the
//! target sensor.

mod backend;
mod commands;
mod connection;
pub mod constants;
#[cfg(test)]
pub(crate) mod fake;
mod gatt;
mod locator;
mod manager;
mod poller;
mod scanner;
mod types;
mod walker;

// Re-export types that should be publicly accessible
pub use backend::{BluestCatalog, BluestCharacteristic, BluestDevice, BluestService};
pub use commands::{CommandExecutor, SensorMode};
pub use connection::ConnectionManager;
pub use gatt::{DeviceCatalog, GattCharacteristic, GattDevice, GattService};
pub use locator::DeviceLocator;
pub use manager::{BluetoothManager, ProbeReport};
pub use poller::{PollingGroup, SensorPoller};
pub use scanner::BluetoothScanner;
pub use types::DeviceSummary;
pub use walker::GattWalker;
