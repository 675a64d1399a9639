//! Constants used throughout the application
//! This module contains the constant values used by the probe,
//! such as UUIDs, poll intervals, and retry bounds.

use uuid::Uuid;

/// The UUID of the sensor configuration service
pub const UUID_CONFIG_SERVICE: Uuid = Uuid::from_u128(0x1c930003_d459_11e7_9296_b8e856369374);

/// The UUID of the calibration characteristic inside the configuration service
pub const UUID_CALIBRATION_CHAR: Uuid = Uuid::from_u128(0x1c930029_d459_11e7_9296_b8e856369374);

/// Number of device list polls before giving up on the target address
pub const DEVICE_POLL_ATTEMPTS: u32 = 15;

/// Delay between device list polls in seconds
pub const DEVICE_POLL_INTERVAL_SECS: u64 = 4;

/// Delay between service list polls in seconds
pub const SERVICE_POLL_INTERVAL_SECS: u64 = 4;

/// Delay between sensor reads in seconds
pub const SENSOR_POLL_INTERVAL_SECS: u64 = 2;

/// Maximum number of connection attempts
pub const MAX_CONNECT_RETRIES: u32 = 1;

/// Delay between connection retries in milliseconds
pub const CONNECT_RETRY_DELAY_MS: u64 = 1000;

/// Divisor applied to raw temperature samples
pub const TEMPERATURE_DIVISOR: i16 = 256;

/// Divisor applied to raw battery samples
pub const BATTERY_DIVISOR: i16 = 100;

/// Settle time after writing a sensor mode, in milliseconds
pub const MODE_SETTLE_DELAY_MS: u64 = 500;
