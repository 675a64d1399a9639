//! Capability surface of the platform Bluetooth stack
//! The probe only talks to the stack through these traits, so the discovery
//! and polling flow can run against the bluest backend or an in-memory stack.

use anyhow::Result;
use uuid::Uuid;

/// Device discovery and the visible-device list
#[async_trait::async_trait]
pub trait DeviceCatalog: Send + Sync {
    type Device: GattDevice;

    /// Put the adapter in discovery mode
    async fn start_discovery(&mut self) -> Result<()>;

    /// Leave discovery mode
    async fn stop_discovery(&mut self) -> Result<()>;

    /// Every device seen so far. An error means the list is unavailable.
    async fn list_devices(&self) -> Result<Vec<Self::Device>>;
}

/// A discovered peripheral
#[async_trait::async_trait]
pub trait GattDevice: Clone + Send + Sync + 'static {
    type Service: GattService;

    fn address(&self) -> String;

    fn name(&self) -> String;

    async fn is_connected(&self) -> bool;

    async fn connect(&self) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;

    /// Fetches the full service list of the device
    async fn services(&self) -> Result<Vec<Self::Service>>;
}

/// A primary service on a connected device
#[async_trait::async_trait]
pub trait GattService: Clone + Send + Sync + 'static {
    type Characteristic: GattCharacteristic;

    fn uuid(&self) -> Uuid;

    async fn characteristics(&self) -> Result<Vec<Self::Characteristic>>;
}

/// A characteristic of a service
#[async_trait::async_trait]
pub trait GattCharacteristic: Clone + Send + Sync + 'static {
    fn uuid(&self) -> Uuid;

    /// UUID of the service this characteristic belongs to
    fn service_uuid(&self) -> Uuid;

    async fn descriptors(&self) -> Result<Vec<Uuid>>;

    async fn read_value(&self) -> Result<Vec<u8>>;

    async fn write_value(&self, value: &[u8]) -> Result<()>;
}
