
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use anyhow::{anyhow, Result};
use bluest::{Adapter, Device};
use futures_util::StreamExt;
use log::{debug, error, info};
use regex::Regex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Background discovery task that records every advertising device by id
pub struct BluetoothScanner {
    adapter: Adapter,
    devices: Arc<Mutex<HashMap<String, Device>>>,
    cancel_token: CancellationToken,
    scan_task_handle: Option<JoinHandle<Result<()>>>,
}

impl BluetoothScanner {
    pub fn new(adapter: Adapter) -> Self {
        Self {
            adapter,
            devices: Arc::new(Mutex::new(HashMap::new())),
            cancel_token: CancellationToken::new(),
            scan_task_handle: None,
        }
    }

    pub async fn start_scan(&mut self) -> Result<()> {
        if self.scan_task_handle.is_some() {
            self.stop_scan().await?;
        }
        self.devices
            .lock()
            .map_err(|_| anyhow!("device table poisoned"))?
            .clear();

        self.cancel_token = CancellationToken::new();
        let cancel_token_for_task = self.cancel_token.clone();
        let adapter_for_task = self.adapter.clone();
        let devices_for_task = self.devices.clone();

        let (started_tx, started_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            Self::internal_scan_task(adapter_for_task, devices_for_task, cancel_token_for_task, started_tx)
                .await
        });

        // the task only keeps running once the adapter accepted the scan
        Self::wait_for_start(started_rx).await?;
        self.scan_task_handle = Some(handle);
        info!("Device scan task started.");
        Ok(())
    }

    /// Resolves to the scan task's startup result
    async fn wait_for_start(started_rx: oneshot::Receiver<Result<()>>) -> Result<()> {
        match started_rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!("Bluetooth scan could not be started: {}", e);
                Err(e)
            }
            Err(_) => Err(anyhow!("Scan task ended before the scan started")),
        }
    }

    /// Records already connected devices, then every advertisement until cancelled.
    /// Whether the scan could be started is reported through `started` first.
    async fn internal_scan_task(
        adapter: Adapter,
        devices: Arc<Mutex<HashMap<String, Device>>>,
        cancel_token: CancellationToken,
        started: oneshot::Sender<Result<()>>,
    ) -> Result<()> {
        let startup = async {
            info!("Checking for connected devices");
            for device in adapter.connected_devices().await? {
                Self::record_device(&devices, device)?;
            }

            info!("Starting bluetooth scan");
            Ok::<_, anyhow::Error>(adapter.scan(&[]).await?)
        }
        .await;

        let mut scan_stream = match startup {
            Ok(stream) => {
                let _ = started.send(Ok(()));
                stream
            }
            Err(e) => {
                let _ = started.send(Err(e));
                return Ok(());
            }
        };

        loop {
            tokio::select! {
                result = scan_stream.next() => {
                    match result {
                        Some(discovered_device) => {
                            debug!(
                                "Found device - Device: {:?}, RSSI: {:?}",
                                discovered_device.device, discovered_device.rssi
                            );
                            Self::record_device(&devices, discovered_device.device)?;
                        }
                        None => {
                            info!("Bluetooth scan stream has ended.");
                            break;
                        }
                    }
                }
                _ = cancel_token.cancelled() => {
                    break;
                }
            }
        }
        Ok(())
    }

    pub async fn stop_scan(&mut self) -> Result<()> {
        info!("Stopping Bluetooth scan.");
        self.cancel_token.cancel();

        let Some(handle) = self.scan_task_handle.take() else {
            info!("No active scan task handle found to wait for.");
            return Ok(());
        };

        info!("Waiting for scan task to finish...");
        match handle.await {
            Ok(Ok(())) => {
                info!("Scan task finished successfully after cancellation.");
                Ok(())
            }
            Ok(Err(e)) => {
                error!("Scan task finished with an error: {:?}", e);
                Err(e)
            }
            Err(e) if e.is_cancelled() => {
                info!("Scan task was cancelled successfully.");
                Ok(())
            }
            Err(e) => Err(anyhow!("Scan task finished with an unexpected join error: {}", e)),
        }
    }

    /// Snapshot of the device table
    pub fn devices(&self) -> Result<Vec<Device>> {
        let devices = self
            .devices
            .lock()
            .map_err(|_| anyhow!("device table poisoned"))?;
        Ok(devices.values().cloned().collect())
    }

    fn record_device(devices: &Arc<Mutex<HashMap<String, Device>>>, device: Device) -> Result<()> {
        let id = device.id().to_string();
        let mut devices = devices.lock().map_err(|_| anyhow!("device table poisoned"))?;
        devices.insert(id, device);
        Ok(())
    }
}

static MAC_ADDRESS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})").ok());

/// Pulls a MAC-style address out of a platform device id.
/// On Linux the id is the address itself, on Windows it is embedded in a longer string.
pub fn extract_mac_address(device_id_str: &str) -> Option<String> {
    MAC_ADDRESS
        .as_ref()?
        .find_iter(device_id_str)
        .last()
        .map(|m| m.as_str().replace('-', ":").to_uppercase())
}
