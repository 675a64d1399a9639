//! Core functionality for the sensor probe
//! This module contains the Bluetooth flow and sensor value decoding

pub mod bluetooth;
pub mod sensor;

// Re-export commonly used types
pub use bluetooth::BluetoothManager;
pub use sensor::{SensorChannel, SensorReading};
