//! bluest implementation of the GATT capability surface

use anyhow::{anyhow, Result};
use bluest::{Adapter, Characteristic, Device, Service};
use log::info;
use uuid::Uuid;

use crate::core::bluetooth::gatt::{DeviceCatalog, GattCharacteristic, GattDevice, GattService};
use crate::core::bluetooth::scanner::{extract_mac_address, BluetoothScanner};

/// Device catalog backed by the default system adapter
pub struct BluestCatalog {
    adapter: Adapter,
    scanner: BluetoothScanner,
}

impl BluestCatalog {
    /// Opens the default adapter and waits until it is powered on
    pub async fn open() -> Result<Self> {
        let adapter = Adapter::default()
            .await
            .ok_or_else(|| anyhow!("No Bluetooth adapter found"))?;
        adapter.wait_available().await?;
        info!("Bluetooth adapter is available.");
        let scanner = BluetoothScanner::new(adapter.clone());
        Ok(Self { adapter, scanner })
    }
}

#[async_trait::async_trait]
impl DeviceCatalog for BluestCatalog {
    type Device = BluestDevice;

    async fn start_discovery(&mut self) -> Result<()> {
        self.scanner.start_scan().await
    }

    async fn stop_discovery(&mut self) -> Result<()> {
        self.scanner.stop_scan().await
    }

    async fn list_devices(&self) -> Result<Vec<BluestDevice>> {
        Ok(self
            .scanner
            .devices()?
            .into_iter()
            .map(|device| BluestDevice::new(self.adapter.clone(), device))
            .collect())
    }
}

/// A bluest device together with the adapter that connects it
#[derive(Clone)]
pub struct BluestDevice {
    adapter: Adapter,
    device: Device,
}

impl BluestDevice {
    pub fn new(adapter: Adapter, device: Device) -> Self {
        Self { adapter, device }
    }
}

#[async_trait::async_trait]
impl GattDevice for BluestDevice {
    type Service = BluestService;

    fn address(&self) -> String {
        let id = self.device.id().to_string();
        extract_mac_address(&id).unwrap_or(id)
    }

    fn name(&self) -> String {
        self.device.name().unwrap_or_default()
    }

    async fn is_connected(&self) -> bool {
        self.device.is_connected().await
    }

    async fn connect(&self) -> Result<()> {
        self.adapter.connect_device(&self.device).await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.adapter.disconnect_device(&self.device).await?;
        Ok(())
    }

    async fn services(&self) -> Result<Vec<BluestService>> {
        let services = self.device.discover_services().await?;
        Ok(services.into_iter().map(BluestService).collect())
    }
}

#[derive(Clone)]
pub struct BluestService(Service);

#[async_trait::async_trait]
impl GattService for BluestService {
    type Characteristic = BluestCharacteristic;

    fn uuid(&self) -> Uuid {
        self.0.uuid()
    }

    async fn characteristics(&self) -> Result<Vec<BluestCharacteristic>> {
        let service_uuid = self.0.uuid();
        let characteristics = self.0.discover_characteristics().await?;
        Ok(characteristics
            .into_iter()
            .map(|characteristic| BluestCharacteristic {
                service_uuid,
                characteristic,
            })
            .collect())
    }
}

#[derive(Clone)]
pub struct BluestCharacteristic {
    service_uuid: Uuid,
    characteristic: Characteristic,
}

#[async_trait::async_trait]
impl GattCharacteristic for BluestCharacteristic {
    fn uuid(&self) -> Uuid {
        self.characteristic.uuid()
    }

    fn service_uuid(&self) -> Uuid {
        self.service_uuid
    }

    async fn descriptors(&self) -> Result<Vec<Uuid>> {
        let descriptors = self.characteristic.discover_descriptors().await?;
        Ok(descriptors.iter().map(|descriptor| descriptor.uuid()).collect())
    }

    async fn read_value(&self) -> Result<Vec<u8>> {
        Ok(self.characteristic.read().await?)
    }

    async fn write_value(&self, value: &[u8]) -> Result<()> {
        self.characteristic.write(value).await?;
        Ok(())
    }
}
