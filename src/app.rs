//! Command-line entry flow
//! Parses arguments, loads configuration, opens the Bluetooth stack and runs
//! one probe. Returns the process exit status.

use std::ffi::OsString;
use std::future::Future;
use std::path::PathBuf;

use clap::Parser;
use log::{error, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use crate::config::ProbeConfig;
use crate::core::bluetooth::{BluetoothManager, DeviceCatalog};
use crate::error::ProbeError;
use crate::logging;

/// Runs the probe for `args`. `open_catalog` is only called once the
/// arguments are valid and a device address is known.
pub async fn run_from_args<I, T, F, Fut, C>(args: I, open_catalog: F) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<C>>,
    C: DeviceCatalog,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return u8::try_from(e.exit_code()).unwrap_or(1);
        }
    };

    logging::init(cli.verbose);

    match run(cli, open_catalog).await {
        Ok(()) => 0,
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    }
}

async fn run<F, Fut, C>(cli: Cli, open_catalog: F) -> Result<(), ProbeError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<C>>,
    C: DeviceCatalog,
{
    // a named file must exist unless we are about to create it
    let (config_path, must_exist): (Option<PathBuf>, bool) = match &cli.config {
        Some(path) => (Some(path.clone()), !cli.write_config),
        None => (ProbeConfig::default_path(), false),
    };

    let mut config = match &config_path {
        Some(path) => ProbeConfig::load(path, must_exist)
            .await
            .map_err(|e| ProbeError::Config(e.to_string()))?,
        None => ProbeConfig::default(),
    };
    cli.apply_overrides(&mut config);

    if cli.write_config {
        let path = config_path
            .ok_or_else(|| ProbeError::Config("no configuration directory available".into()))?;
        config
            .save(&path)
            .await
            .map_err(|e| ProbeError::Config(e.to_string()))?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let address = cli
        .address
        .ok_or_else(|| ProbeError::Config("no device address given".into()))?;

    let catalog = open_catalog()
        .await
        .map_err(|e| ProbeError::AdapterUnavailable(e.to_string()))?;

    let shutdown = CancellationToken::new();
    let signal_task = spawn_shutdown_listener(shutdown.clone());

    let mut manager = BluetoothManager::new(catalog, config, shutdown).with_mode(cli.mode);
    let result = manager.run(&address).await;
    signal_task.abort();

    let report = result?;
    info!(
        "Probe of {} finished, calibration {}, reads {:?}",
        report.device.address, report.calibration, report.polled
    );
    Ok(())
}

/// Exit status used when a second Ctrl-C forces the process down
const FORCED_EXIT_CODE: i32 = 130;

/// Cancels `shutdown` on the first Ctrl-C and exits the process on the second
fn spawn_shutdown_listener(shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for the interrupt signal: {}", e);
            return;
        }
        info!("Interrupt received, stopping (press Ctrl-C again to exit immediately)");
        shutdown.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Second interrupt received, exiting without cleanup");
            std::process::exit(FORCED_EXIT_CODE);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bluetooth::constants::{UUID_CALIBRATION_CHAR, UUID_CONFIG_SERVICE};
    use crate::core::bluetooth::fake::{FakeCatalog, FakeCharacteristic, FakeDevice, FakeService};
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const ADDRESS: &str = "B0:B4:48:C9:4D:83";

    fn sensor_catalog() -> FakeCatalog {
        let service = FakeService::new(UUID_CONFIG_SERVICE, "config").with_characteristic(
            FakeCharacteristic::new(UUID_CALIBRATION_CHAR, "calibration")
                .with_value(21.5f64.to_le_bytes().to_vec()),
        );
        FakeCatalog::with_devices(vec![FakeDevice::new(ADDRESS, "SensorTag").with_services(vec![service])])
    }

    /// Catalog factory that counts how often the stack was opened
    fn counting_factory(
        opened: Arc<AtomicUsize>,
    ) -> impl FnOnce() -> std::future::Ready<anyhow::Result<FakeCatalog>> {
        move || {
            opened.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(sensor_catalog()))
        }
    }

    async fn saved_default_config(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("probe_config.json");
        ProbeConfig::default().save(&path).await.unwrap();
        path
    }

    #[tokio::test]
    async fn missing_address_exits_without_touching_bluetooth() {
        let opened = Arc::new(AtomicUsize::new(0));

        let status = run_from_args(["gatt-sensor-probe"], counting_factory(opened.clone())).await;

        assert_ne!(status, 0);
        assert_eq!(opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_probe_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let config = saved_default_config(&dir).await;
        let opened = Arc::new(AtomicUsize::new(0));

        let status = run_from_args(
            [
                OsString::from("gatt-sensor-probe"),
                OsString::from(ADDRESS),
                OsString::from("--config"),
                config.into_os_string(),
            ],
            counting_factory(opened.clone()),
        )
        .await;

        assert_eq!(status, 0);
        assert_eq!(opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_explicit_config_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.json");
        let opened = Arc::new(AtomicUsize::new(0));

        let status = run_from_args(
            [
                OsString::from("gatt-sensor-probe"),
                OsString::from(ADDRESS),
                OsString::from("-c"),
                absent.into_os_string(),
            ],
            counting_factory(opened.clone()),
        )
        .await;

        assert_eq!(status, 8);
        assert_eq!(opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn write_config_saves_overrides_and_exits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("probe_config.json");
        let opened = Arc::new(AtomicUsize::new(0));

        let status = run_from_args(
            [
                OsString::from("gatt-sensor-probe"),
                OsString::from("--write-config"),
                OsString::from("--config"),
                path.clone().into_os_string(),
                OsString::from("--battery-char"),
                OsString::from("f000aa71-0451-4000-b000-000000000000"),
            ],
            counting_factory(opened.clone()),
        )
        .await;

        assert_eq!(status, 0);
        assert_eq!(opened.load(Ordering::SeqCst), 0);
        let saved = ProbeConfig::load(&path, true).await.unwrap();
        assert_eq!(
            saved.battery_characteristic_uuid.map(|uuid| uuid.to_string()),
            Some("f000aa71-0451-4000-b000-000000000000".to_string())
        );
    }

    #[tokio::test]
    async fn unavailable_adapter_exits_non_zero() {
        let dir = tempfile::tempdir().unwrap();
        let config = saved_default_config(&dir).await;

        let status = run_from_args(
            [
                OsString::from("gatt-sensor-probe"),
                OsString::from(ADDRESS),
                OsString::from("--config"),
                config.into_os_string(),
            ],
            || async { Err::<FakeCatalog, _>(anyhow!("No Bluetooth adapter found")) },
        )
        .await;

        assert_eq!(status, 7);
    }

    #[tokio::test]
    async fn unknown_device_exits_with_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe_config.json");
        ProbeConfig {
            device_poll_attempts: 1,
            ..ProbeConfig::default()
        }
        .save(&path)
        .await
        .unwrap();

        let status = run_from_args(
            [
                OsString::from("gatt-sensor-probe"),
                OsString::from("00:11:22:33:44:55"),
                OsString::from("--config"),
                path.into_os_string(),
            ],
            || async { Ok(sensor_catalog()) },
        )
        .await;

        assert_eq!(status, 3);
    }
}
