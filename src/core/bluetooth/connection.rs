//! Bluetooth connection handling for the sensor
//! This module handles connecting to and disconnecting from the device

use anyhow::{anyhow, Result};
use log::{info, warn};
use std::time::Duration;

use crate::core::bluetooth::gatt::GattDevice;

/// Connection manager for the sensor
#[derive(Debug, Clone, Copy)]
pub struct ConnectionManager {
    max_retries: u32,
    retry_delay: u64,
}

impl ConnectionManager {
    pub fn new(max_retries: u32, retry_delay: u64) -> Self {
        Self {
            max_retries: max_retries.max(1),
            retry_delay,
        }
    }

    /// Connect to the device with a fixed number of attempts
    pub async fn connect_with_retry<D: GattDevice>(&self, device: &D) -> Result<()> {
        let mut retry_count = 0;
        let mut last_error = None;

        while retry_count < self.max_retries {
            match self.try_connect(device).await {
                Ok(()) => {
                    info!("Sensor with the provided address connected");
                    return Ok(());
                }
                Err(e) => {
                    warn!("Connection attempt {} failed: {}", retry_count + 1, e);
                    last_error = Some(e);

                    if retry_count < self.max_retries - 1 {
                        info!("Retrying connection in {} ms...", self.retry_delay);
                        tokio::time::sleep(Duration::from_millis(self.retry_delay)).await;
                    }
                }
            }
            retry_count += 1;
        }

        Err(last_error.unwrap_or_else(|| anyhow!("Failed to connect after {} attempts", self.max_retries)))
    }

    async fn try_connect<D: GattDevice>(&self, device: &D) -> Result<()> {
        if device.is_connected().await {
            info!("Device {} already connected.", device.address());
            return Ok(());
        }
        info!("Initiating connection to {}...", device.address());
        device.connect().await
    }

    /// Disconnect from the device
    pub async fn disconnect<D: GattDevice>(&self, device: &D) -> Result<()> {
        if device.is_connected().await {
            info!("Disconnecting from device {}", device.address());
            device.disconnect().await?;
            info!("Successfully disconnected");
        } else {
            info!("Device {} not connected", device.address());
        }
        Ok(())
    }
}
