use std::process::ExitCode;

use gatt_sensor_probe_lib::app;
use gatt_sensor_probe_lib::core::bluetooth::BluestCatalog;

#[tokio::main]
async fn main() -> ExitCode {
    let status = app::run_from_args(std::env::args_os(), BluestCatalog::open).await;
    ExitCode::from(status)
}
