//! In-memory Bluetooth stack for tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use uuid::Uuid;

use crate::core::bluetooth::gatt::{DeviceCatalog, GattCharacteristic, GattDevice, GattService};

#[derive(Debug, Default)]
pub struct CatalogCounters {
    pub start_discovery_calls: AtomicUsize,
    pub stop_discovery_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
}

/// Catalog that replays scripted device listings; the last listing repeats
pub struct FakeCatalog {
    pub counters: Arc<CatalogCounters>,
    listings: Mutex<VecDeque<Option<Vec<FakeDevice>>>>,
    fail_start: bool,
    fail_stop: bool,
}

impl FakeCatalog {
    pub fn new(listings: Vec<Option<Vec<FakeDevice>>>) -> Self {
        Self {
            counters: Arc::new(CatalogCounters::default()),
            listings: Mutex::new(listings.into()),
            fail_start: false,
            fail_stop: false,
        }
    }

    pub fn with_devices(devices: Vec<FakeDevice>) -> Self {
        Self::new(vec![Some(devices)])
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn list_calls(&self) -> usize {
        self.counters.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DeviceCatalog for FakeCatalog {
    type Device = FakeDevice;

    async fn start_discovery(&mut self) -> Result<()> {
        self.counters.start_discovery_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(anyhow!("scan permission denied"));
        }
        Ok(())
    }

    async fn stop_discovery(&mut self) -> Result<()> {
        self.counters.stop_discovery_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            return Err(anyhow!("adapter refused to stop discovery"));
        }
        Ok(())
    }

    async fn list_devices(&self) -> Result<Vec<FakeDevice>> {
        self.counters.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut listings = self.listings.lock().unwrap();
        let listing = if listings.len() > 1 {
            listings.pop_front().flatten()
        } else {
            listings.front().cloned().flatten()
        };
        listing.ok_or_else(|| anyhow!("device list unavailable"))
    }
}

#[derive(Clone)]
pub struct FakeDevice {
    pub address: String,
    pub name: String,
    connected: Arc<AtomicBool>,
    pub connect_calls: Arc<AtomicUsize>,
    pub disconnect_calls: Arc<AtomicUsize>,
    pub service_calls: Arc<AtomicUsize>,
    connect_failures: Arc<AtomicUsize>,
    connect_hangs: Arc<AtomicBool>,
    service_listings: Arc<Mutex<VecDeque<Vec<FakeService>>>>,
}

impl FakeDevice {
    pub fn new(address: &str, name: &str) -> Self {
        Self {
            address: address.to_string(),
            name: name.to_string(),
            connected: Arc::new(AtomicBool::new(false)),
            connect_calls: Arc::new(AtomicUsize::new(0)),
            disconnect_calls: Arc::new(AtomicUsize::new(0)),
            service_calls: Arc::new(AtomicUsize::new(0)),
            connect_failures: Arc::new(AtomicUsize::new(0)),
            connect_hangs: Arc::new(AtomicBool::new(false)),
            service_listings: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Scripted service listings; the last listing repeats
    pub fn with_service_listings(self, listings: Vec<Vec<FakeService>>) -> Self {
        *self.service_listings.lock().unwrap() = listings.into();
        self
    }

    pub fn with_services(self, services: Vec<FakeService>) -> Self {
        self.with_service_listings(vec![services])
    }

    /// The next `count` connection attempts fail
    pub fn failing_connects(self, count: usize) -> Self {
        self.connect_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Connection attempts never complete
    pub fn hanging_connect(self) -> Self {
        self.connect_hangs.store(true, Ordering::SeqCst);
        self
    }

    pub fn connected(self) -> Self {
        self.connected.store(true, Ordering::SeqCst);
        self
    }

    pub fn connect_count(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GattDevice for FakeDevice {
    type Service = FakeService;

    fn address(&self) -> String {
        self.address.clone()
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.connect_hangs.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let remaining = self.connect_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.connect_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(anyhow!("le-connection-abort-by-local"));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn services(&self) -> Result<Vec<FakeService>> {
        self.service_calls.fetch_add(1, Ordering::SeqCst);
        let mut listings = self.service_listings.lock().unwrap();
        let listing = if listings.len() > 1 {
            listings.pop_front()
        } else {
            listings.front().cloned()
        };
        Ok(listing.unwrap_or_default())
    }
}

#[derive(Clone)]
pub struct FakeService {
    pub uuid: Uuid,
    /// Distinguishes services that share a UUID
    pub tag: &'static str,
    characteristics: Vec<FakeCharacteristic>,
}

impl FakeService {
    pub fn new(uuid: Uuid, tag: &'static str) -> Self {
        Self {
            uuid,
            tag,
            characteristics: Vec::new(),
        }
    }

    pub fn with_characteristic(mut self, characteristic: FakeCharacteristic) -> Self {
        let mut characteristic = characteristic;
        characteristic.service_uuid = self.uuid;
        self.characteristics.push(characteristic);
        self
    }
}

#[async_trait::async_trait]
impl GattService for FakeService {
    type Characteristic = FakeCharacteristic;

    fn uuid(&self) -> Uuid {
        self.uuid
    }

    async fn characteristics(&self) -> Result<Vec<FakeCharacteristic>> {
        Ok(self.characteristics.clone())
    }
}

#[derive(Clone)]
pub struct FakeCharacteristic {
    pub uuid: Uuid,
    pub tag: &'static str,
    service_uuid: Uuid,
    descriptors: Vec<Uuid>,
    reads: Arc<Mutex<VecDeque<Result<Vec<u8>, String>>>>,
    pub read_calls: Arc<AtomicUsize>,
    read_hangs: Arc<AtomicBool>,
    pub writes: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl FakeCharacteristic {
    pub fn new(uuid: Uuid, tag: &'static str) -> Self {
        Self {
            uuid,
            tag,
            service_uuid: Uuid::nil(),
            descriptors: Vec::new(),
            reads: Arc::new(Mutex::new(VecDeque::new())),
            read_calls: Arc::new(AtomicUsize::new(0)),
            read_hangs: Arc::new(AtomicBool::new(false)),
            writes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_descriptor(mut self, uuid: Uuid) -> Self {
        self.descriptors.push(uuid);
        self
    }

    /// Scripted read results; the last result repeats
    pub fn with_reads(self, reads: Vec<Result<Vec<u8>, String>>) -> Self {
        *self.reads.lock().unwrap() = reads.into();
        self
    }

    pub fn with_value(self, value: Vec<u8>) -> Self {
        self.with_reads(vec![Ok(value)])
    }

    /// Reads never complete
    pub fn hanging_reads(self) -> Self {
        self.read_hangs.store(true, Ordering::SeqCst);
        self
    }

    pub fn read_count(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn written(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl GattCharacteristic for FakeCharacteristic {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn service_uuid(&self) -> Uuid {
        self.service_uuid
    }

    async fn descriptors(&self) -> Result<Vec<Uuid>> {
        Ok(self.descriptors.clone())
    }

    async fn read_value(&self) -> Result<Vec<u8>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        if self.read_hangs.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let mut reads = self.reads.lock().unwrap();
        let read = if reads.len() > 1 {
            reads.pop_front()
        } else {
            reads.front().cloned()
        };
        match read {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("characteristic is not readable")),
        }
    }

    async fn write_value(&self, value: &[u8]) -> Result<()> {
        self.writes.lock().unwrap().push(value.to_vec());
        Ok(())
    }
}
