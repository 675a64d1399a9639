//! Service and characteristic lookup on a connected device

use std::time::Duration;

use log::{info, warn};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::bluetooth::gatt::{GattCharacteristic, GattDevice, GattService};

#[derive(Debug, Clone, Copy)]
pub struct GattWalker {
    service_poll_interval: Duration,
}

impl GattWalker {
    pub fn new(service_poll_interval: Duration) -> Self {
        Self {
            service_poll_interval,
        }
    }

    /// Fetches the service list until the device exposes any service, then
    /// returns the last service whose UUID matches.
    ///
    /// Services are resolved lazily after connecting, so an empty list is
    /// retried every poll interval until it fills or `cancel` fires.
    pub async fn find_service<D: GattDevice>(
        &self,
        device: &D,
        uuid: Uuid,
        cancel: &CancellationToken,
    ) -> Option<D::Service> {
        println!("Services exposed by device: {}", uuid);
        loop {
            let services = match device.services().await {
                Ok(services) => services,
                Err(e) => {
                    warn!("Service list unavailable: {}", e);
                    return None;
                }
            };

            let mut found = None;
            for service in &services {
                println!("UUID: {}", service.uuid());
                if service.uuid() == uuid {
                    found = Some(service.clone());
                    println!("Match Success");
                }
            }

            if !services.is_empty() {
                return found;
            }

            info!(
                "No services resolved yet, retrying in {:?}",
                self.service_poll_interval
            );
            tokio::select! {
                _ = sleep(self.service_poll_interval) => {}
                _ = cancel.cancelled() => {
                    info!("Service lookup cancelled");
                    return None;
                }
            }
        }
    }

    /// Single pass over the characteristics of `service`; the first match wins.
    /// Every characteristic visited is printed with its descriptors.
    pub async fn find_characteristic<S: GattService>(
        &self,
        service: &S,
        uuid: Uuid,
    ) -> Option<S::Characteristic> {
        println!("Characteristics: {}", uuid);
        let characteristics = match service.characteristics().await {
            Ok(characteristics) => characteristics,
            Err(e) => {
                warn!("Characteristic list of {} unavailable: {}", service.uuid(), e);
                return None;
            }
        };

        for characteristic in characteristics {
            println!("Characteristic: {}", characteristic.uuid());
            println!("Service: {}", characteristic.service_uuid());
            let descriptors = characteristic.descriptors().await.unwrap_or_else(|e| {
                warn!("Descriptors of {} unavailable: {}", characteristic.uuid(), e);
                Vec::new()
            });
            println!("Descriptor Length: {}", descriptors.len());
            for descriptor in &descriptors {
                println!("Descriptor: {}", descriptor);
            }
            if characteristic.uuid() == uuid {
                println!("Match success: {}", uuid);
                return Some(characteristic);
            }
        }
        None
    }
}
