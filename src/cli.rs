use std::path::PathBuf;

use clap::{ArgAction, Parser};
use uuid::Uuid;

use crate::config::ProbeConfig;
use crate::core::bluetooth::SensorMode;

#[derive(Parser, Debug)]
#[command(name = "gatt-sensor-probe", version)]
#[command(about = "Find a BLE sensor by address, read its calibration value and poll its sensors")]
pub struct Cli {
    /// Address of the target device, e.g. B0:B4:48:C9:4D:83
    #[arg(required_unless_present = "write_config")]
    pub address: Option<String>,

    /// JSON configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Temperature characteristic to poll
    #[arg(long, value_name = "UUID")]
    pub temperature_char: Option<Uuid>,

    /// Battery characteristic to poll
    #[arg(long, value_name = "UUID")]
    pub battery_char: Option<Uuid>,

    /// Sensor mode written before polling starts
    #[arg(long, value_enum)]
    pub mode: Option<SensorMode>,

    /// Write the effective configuration to the config path and exit
    #[arg(long)]
    pub write_config: bool,

    /// More log output: -v for debug, -vv for trace (default info)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Command line values take precedence over the config file
    pub fn apply_overrides(&self, config: &mut ProbeConfig) {
        if let Some(uuid) = self.temperature_char {
            config.temperature_characteristic_uuid = Some(uuid);
        }
        if let Some(uuid) = self.battery_char {
            config.battery_characteristic_uuid = Some(uuid);
        }
    }
}
