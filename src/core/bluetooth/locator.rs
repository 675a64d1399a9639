//! Finds the target device in the discovery list

use std::time::Duration;

use log::{info, warn};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::core::bluetooth::gatt::{DeviceCatalog, GattDevice};
use crate::core::bluetooth::types::DeviceSummary;

/// Polls the device list until the target address shows up
#[derive(Debug, Clone, Copy)]
pub struct DeviceLocator {
    attempts: u32,
    interval: Duration,
}

impl DeviceLocator {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Returns the device whose address equals `address`.
    ///
    /// Every device of every poll is printed. Gives up after the configured
    /// number of polls, as soon as the device list is unavailable, or when
    /// `cancel` fires. If one poll lists the address twice the later entry wins.
    pub async fn locate<C: DeviceCatalog>(
        &self,
        catalog: &C,
        address: &str,
        cancel: &CancellationToken,
    ) -> Option<C::Device> {
        for attempt in 0..self.attempts {
            if cancel.is_cancelled() {
                info!("Device lookup cancelled after {} polls", attempt);
                return None;
            }

            let devices = match catalog.list_devices().await {
                Ok(devices) => devices,
                Err(e) => {
                    warn!("Device list unavailable: {}", e);
                    return None;
                }
            };

            let mut sensor = None;
            for device in devices {
                println!("{}", DeviceSummary::of(&device).await);
                if device.address() == address {
                    sensor = Some(device);
                }
            }

            if sensor.is_some() {
                return sensor;
            }

            if attempt + 1 < self.attempts {
                info!(
                    "{} not seen yet (poll {}/{}), retrying in {:?}",
                    address,
                    attempt + 1,
                    self.attempts,
                    self.interval
                );
                tokio::select! {
                    _ = sleep(self.interval) => {}
                    _ = cancel.cancelled() => {
                        info!("Device lookup cancelled");
                        return None;
                    }
                }
            }
        }
        None
    }
}
