//! Bluetooth manager for the sensor probe
//! This module drives one probe run: discover the device, connect, walk the
//! GATT tree, read the calibration value and poll the sensor characteristics.

use std::future::Future;

use log::{error, info, warn};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::ProbeConfig;
use crate::core::bluetooth::commands::{CommandExecutor, SensorMode};
use crate::core::bluetooth::connection::ConnectionManager;
use crate::core::bluetooth::gatt::{DeviceCatalog, GattCharacteristic, GattDevice, GattService};
use crate::core::bluetooth::locator::DeviceLocator;
use crate::core::bluetooth::poller::{PollingGroup, SensorPoller};
use crate::core::bluetooth::types::DeviceSummary;
use crate::core::bluetooth::walker::GattWalker;
use crate::core::sensor::{decode_f64_le, SensorChannel, BATTERY, TEMPERATURE};
use crate::error::ProbeError;

type ServiceOf<C> = <<C as DeviceCatalog>::Device as GattDevice>::Service;
type CharacteristicOf<C> = <ServiceOf<C> as GattService>::Characteristic;

/// What a completed probe run observed
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub device: DeviceSummary,
    pub calibration: f64,
    /// Successful reads per polled channel
    pub polled: Vec<(&'static str, usize)>,
}

/// Manages Bluetooth operations
pub struct BluetoothManager<C: DeviceCatalog> {
    /// Discovery and device list
    catalog: C,
    config: ProbeConfig,
    /// Mode written before polling, if any
    mode: Option<SensorMode>,
    connection_manager: ConnectionManager,
    locator: DeviceLocator,
    walker: GattWalker,
    /// Fired on shutdown; observed by every wait and every poller
    cancel_token: CancellationToken,
}

impl<C: DeviceCatalog> BluetoothManager<C> {
    /// Creates a new BluetoothManager
    pub fn new(catalog: C, config: ProbeConfig, cancel_token: CancellationToken) -> Self {
        let connection_manager =
            ConnectionManager::new(config.connect_retries, config.connect_retry_delay_ms);
        let locator = DeviceLocator::new(config.device_poll_attempts, config.device_poll_interval());
        let walker = GattWalker::new(config.service_poll_interval());
        Self {
            catalog,
            config,
            mode: None,
            connection_manager,
            locator,
            walker,
            cancel_token,
        }
    }

    pub fn with_mode(mut self, mode: Option<SensorMode>) -> Self {
        self.mode = mode;
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Runs discovery around the device lookup.
    /// Failing to start or stop discovery is logged and does not abort the lookup.
    pub async fn find_device(&mut self, address: &str) -> Result<C::Device, ProbeError> {
        let discovery_started = match self.catalog.start_discovery().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to start discovery: {}", e);
                false
            }
        };
        println!("The discovery started: {}", discovery_started);

        let sensor = self
            .locator
            .locate(&self.catalog, address, &self.cancel_token)
            .await;

        if let Err(e) = self.catalog.stop_discovery().await {
            error!("Discovery could not be stopped: {}", e);
        }

        if self.cancel_token.is_cancelled() {
            return Err(ProbeError::Interrupted);
        }
        let sensor = sensor.ok_or_else(|| ProbeError::DeviceNotFound(address.to_string()))?;
        println!("Found device: {}", DeviceSummary::of(&sensor).await);
        Ok(sensor)
    }

    pub async fn connect(&self, device: &C::Device) -> Result<(), ProbeError> {
        self.connection_manager
            .connect_with_retry(device)
            .await
            .map_err(|e| ProbeError::ConnectionFailed {
                address: device.address(),
                reason: e.to_string(),
            })
    }

    /// Full probe run against the device at `address`.
    /// Once a connection was attempted the device is disconnected again
    /// whatever the outcome, including shutdown during connect or setup.
    pub async fn run(&mut self, address: &str) -> Result<ProbeReport, ProbeError> {
        let sensor = self.find_device(address).await?;

        let outcome = match self.until_cancelled(self.connect(&sensor)).await {
            Ok(()) => self.probe_connected(&sensor).await,
            Err(e) => Err(e),
        };

        if let Err(e) = self.connection_manager.disconnect(&sensor).await {
            error!("Failed to disconnect from {}: {}", sensor.address(), e);
        }
        outcome
    }

    /// Runs one setup step, giving up with `Interrupted` once shutdown is requested
    async fn until_cancelled<T>(
        &self,
        step: impl Future<Output = Result<T, ProbeError>>,
    ) -> Result<T, ProbeError> {
        match self.cancel_token.run_until_cancelled(step).await {
            Some(result) => result,
            None => {
                info!("Shutdown requested, abandoning the current step");
                Err(ProbeError::Interrupted)
            }
        }
    }

    async fn probe_connected(&self, sensor: &C::Device) -> Result<ProbeReport, ProbeError> {
        let (calibration, group) = self.until_cancelled(self.prepare(sensor)).await?;

        // pollers observe the token themselves and finish with a read count
        let polled = if group.is_empty() {
            info!("No sensor characteristics configured, skipping polling");
            Vec::new()
        } else {
            info!("Polling {} sensor characteristics until interrupted", group.len());
            group.join().await
        };

        Ok(ProbeReport {
            device: DeviceSummary::of(sensor).await,
            calibration,
            polled,
        })
    }

    /// Service lookup, calibration read, mode write and poller start
    async fn prepare(&self, sensor: &C::Device) -> Result<(f64, PollingGroup), ProbeError> {
        let service_uuid = self.config.config_service_uuid;
        let service = self
            .walker
            .find_service(sensor, service_uuid, &self.cancel_token)
            .await
            .ok_or(ProbeError::ServiceNotFound(service_uuid))?;
        println!("Found service {}", service.uuid());

        let calibration = self.read_calibration(&service).await?;

        if let Some(mode) = self.mode {
            self.apply_mode(&service, mode).await?;
        }

        let group = self.start_polling(&service).await?;
        Ok((calibration, group))
    }

    /// Reads and decodes the calibration characteristic of `service`
    pub async fn read_calibration(&self, service: &ServiceOf<C>) -> Result<f64, ProbeError> {
        let characteristic = self
            .characteristic(service, self.config.calibration_characteristic_uuid)
            .await?;
        println!("Found characteristic {}", characteristic.uuid());

        let raw = characteristic.read_value().await?;
        let calibration = decode_f64_le(&raw)?;
        println!("Calibration value: {}", calibration);
        Ok(calibration)
    }

    async fn apply_mode(&self, service: &ServiceOf<C>, mode: SensorMode) -> Result<(), ProbeError> {
        let Some(uuid) = self.config.mode_characteristic_uuid else {
            warn!("No mode characteristic configured, not applying {:?}", mode);
            return Ok(());
        };
        let characteristic = self.characteristic(service, uuid).await?;
        CommandExecutor::new(characteristic).set_mode(mode).await?;
        Ok(())
    }

    /// Resolves every configured sensor characteristic, then starts one poller per channel
    async fn start_polling(&self, service: &ServiceOf<C>) -> Result<PollingGroup, ProbeError> {
        let channels: [(Option<Uuid>, SensorChannel); 2] = [
            (self.config.temperature_characteristic_uuid, TEMPERATURE),
            (self.config.battery_characteristic_uuid, BATTERY),
        ];

        let mut resolved = Vec::new();
        for (uuid, channel) in channels {
            if let Some(uuid) = uuid {
                resolved.push((self.characteristic(service, uuid).await?, channel));
            }
        }

        let poller = SensorPoller::new(self.config.sensor_poll_interval(), self.cancel_token.clone());
        let mut group = PollingGroup::new();
        for (characteristic, channel) in resolved {
            poller.spawn(&mut group, characteristic, channel);
        }
        Ok(group)
    }

    async fn characteristic(
        &self,
        service: &ServiceOf<C>,
        uuid: Uuid,
    ) -> Result<CharacteristicOf<C>, ProbeError> {
        self.walker
            .find_characteristic(service, uuid)
            .await
            .ok_or(ProbeError::CharacteristicNotFound {
                service: service.uuid(),
                characteristic: uuid,
            })
    }
}
