//! Sensor mode commands
//! This module contains the mode configuration values that can be written to the sensor

use std::time::Duration;

use anyhow::Result;
use clap::ValueEnum;
use log::info;
use tokio::time::sleep;

use crate::core::bluetooth::constants::MODE_SETTLE_DELAY_MS;
use crate::core::bluetooth::gatt::GattCharacteristic;

/// Sensor sampling modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SensorMode {
    /// Sample only when asked (0x01)
    Manual,
    /// Sample after each wakeup (0x02)
    Wakeup,
    /// Sample after each wakeup and keep the radio up (0x03)
    WakeupPlus,
}

impl SensorMode {
    /// Convert the mode to its byte representation
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Manual => vec![0x01],
            Self::Wakeup => vec![0x02],
            Self::WakeupPlus => vec![0x03],
        }
    }
}

/// Writes mode commands to the mode characteristic
pub struct CommandExecutor<C: GattCharacteristic> {
    mode_characteristic: C,
}

impl<C: GattCharacteristic> CommandExecutor<C> {
    /// Create a new CommandExecutor
    pub fn new(mode_characteristic: C) -> Self {
        Self {
            mode_characteristic,
        }
    }

    /// Switch the sensor to `mode` and give it time to apply the change
    pub async fn set_mode(&self, mode: SensorMode) -> Result<()> {
        let data = mode.to_bytes();
        info!("Sending mode {:?} ({:02x?}) to sensor", mode, data);
        self.mode_characteristic.write_value(&data).await?;
        sleep(Duration::from_millis(MODE_SETTLE_DELAY_MS)).await;
        Ok(())
    }
}
