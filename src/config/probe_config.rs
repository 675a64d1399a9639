use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use crate::core::bluetooth::constants::{
    CONNECT_RETRY_DELAY_MS, DEVICE_POLL_ATTEMPTS, DEVICE_POLL_INTERVAL_SECS, MAX_CONNECT_RETRIES,
    SENSOR_POLL_INTERVAL_SECS, SERVICE_POLL_INTERVAL_SECS, UUID_CALIBRATION_CHAR,
    UUID_CONFIG_SERVICE,
};

const APP_DIR_NAME: &str = "gatt-sensor-probe";
const CONFIG_FILE_NAME: &str = "probe_config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// How many times the device list is polled for the target address
    pub device_poll_attempts: u32,

    /// Seconds between device list polls
    pub device_poll_interval_secs: u64,

    /// Seconds between service list polls while the device exposes no services
    pub service_poll_interval_secs: u64,

    /// Seconds between two reads of a sensor characteristic
    pub sensor_poll_interval_secs: u64,

    /// Connection attempts before giving up
    pub connect_retries: u32,

    pub connect_retry_delay_ms: u64,

    /// Service holding the calibration, sensor and mode characteristics
    pub config_service_uuid: Uuid,

    pub calibration_characteristic_uuid: Uuid,

    /// Polled as `Temperature` when set
    pub temperature_characteristic_uuid: Option<Uuid>,

    /// Polled as `Battery` when set
    pub battery_characteristic_uuid: Option<Uuid>,

    /// Receives the `--mode` byte when set
    pub mode_characteristic_uuid: Option<Uuid>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            device_poll_attempts: DEVICE_POLL_ATTEMPTS,
            device_poll_interval_secs: DEVICE_POLL_INTERVAL_SECS,
            service_poll_interval_secs: SERVICE_POLL_INTERVAL_SECS,
            sensor_poll_interval_secs: SENSOR_POLL_INTERVAL_SECS,
            connect_retries: MAX_CONNECT_RETRIES,
            connect_retry_delay_ms: CONNECT_RETRY_DELAY_MS,
            config_service_uuid: UUID_CONFIG_SERVICE,
            calibration_characteristic_uuid: UUID_CALIBRATION_CHAR,
            temperature_characteristic_uuid: None,
            battery_characteristic_uuid: None,
            mode_characteristic_uuid: None,
        }
    }
}

impl ProbeConfig {
    /// `<config_dir>/gatt-sensor-probe/probe_config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the config from `file_path`.
    /// A missing file is an error when `must_exist` is set, otherwise defaults are used.
    pub async fn load(file_path: &Path, must_exist: bool) -> Result<Self> {
        if !file_path.exists() {
            if must_exist {
                return Err(anyhow!("Config file {:?} does not exist", file_path));
            }
            warn!("Config file not found at {:?}, using default.", file_path);
            return Ok(Self::default());
        }

        let config_json = fs::read_to_string(file_path).await?;
        let config: Self = serde_json::from_str(&config_json)
            .map_err(|e| anyhow!("Invalid config file {:?}: {}", file_path, e))?;

        info!("Config loaded from {:?}", file_path);
        Ok(config)
    }

    /// Saves the config as pretty JSON, creating parent directories as needed.
    pub async fn save(&self, file_path: &Path) -> Result<()> {
        if let Some(config_dir) = file_path.parent() {
            if let Err(e) = fs::create_dir_all(config_dir).await {
                error!("Failed to create config directory {:?}: {}", config_dir, e);
                return Err(e.into());
            }
        }

        let config_json = match serde_json::to_string_pretty(&self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize probe config to JSON: {}", e);
                return Err(e.into());
            }
        };

        fs::write(file_path, config_json).await?;

        info!("Probe config saved to {:?}.", file_path);
        Ok(())
    }

    pub fn device_poll_interval(&self) -> Duration {
        Duration::from_secs(self.device_poll_interval_secs)
    }

    pub fn service_poll_interval(&self) -> Duration {
        Duration::from_secs(self.service_poll_interval_secs)
    }

    pub fn sensor_poll_interval(&self) -> Duration {
        Duration::from_secs(self.sensor_poll_interval_secs)
    }
}
