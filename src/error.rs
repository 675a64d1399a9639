//! Terminal failures of a probe run and their process exit codes

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("No usable Bluetooth adapter: {0}")]
    AdapterUnavailable(String),

    #[error("No sensor found with the provided address: {0}")]
    DeviceNotFound(String),

    #[error("Could not connect device {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("This device does not have the service we are looking for: {0}")]
    ServiceNotFound(Uuid),

    #[error("Characteristic {characteristic} not found in service {service}")]
    CharacteristicNotFound { service: Uuid, characteristic: Uuid },

    #[error("Malformed value: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Interrupted before the probe completed")]
    Interrupted,

    #[error(transparent)]
    Bluetooth(#[from] anyhow::Error),
}

impl ProbeError {
    /// Process exit status reported for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::DeviceNotFound(_) => 3,
            Self::ServiceNotFound(_) => 4,
            Self::CharacteristicNotFound { .. } => 5,
            Self::ConnectionFailed { .. } => 6,
            Self::AdapterUnavailable(_) => 7,
            Self::Config(_) => 8,
            Self::Interrupted => 130,
            Self::Decode(_) | Self::Bluetooth(_) => 1,
        }
    }
}
