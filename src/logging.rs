use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

/// Targets starting with this prefix log at the requested level,
/// everything else (bluest, platform glue) only at warn and above
const CRATE_TARGET_PREFIX: &str = "gatt_sensor_probe";

/// Writes `[timestamp LEVEL] message` lines to stderr
pub struct ConsoleLogger {
    level: LevelFilter,
}

impl ConsoleLogger {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    /// Maps the `-v` count to a level filter
    pub fn level_for(verbosity: u8) -> LevelFilter {
        match verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn init(verbosity: u8) -> Result<(), SetLoggerError> {
        let level = Self::level_for(verbosity);
        log::set_boxed_logger(Box::new(ConsoleLogger::new(level)))
            .map(|()| log::set_max_level(level))
    }

    fn format(&self, record: &Record) -> String {
        format!(
            "[{} {}] {}",
            Local::now().to_rfc3339(),
            record.level(),
            record.args()
        )
    }
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if metadata.target().starts_with(CRATE_TARGET_PREFIX) {
            metadata.level() <= self.level
        } else {
            metadata.level() <= Level::Warn
        }
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{}", self.format(record));
        }
    }

    fn flush(&self) {}
}

/// Installs the console logger, or env_logger when `RUST_LOG` is set.
/// Safe to call more than once; later calls leave the first logger in place.
pub fn init(verbosity: u8) {
    if std::env::var_os("RUST_LOG").is_some() {
        let _ = env_logger::try_init();
        return;
    }

    if ConsoleLogger::init(verbosity).is_err() {
        let _ = env_logger::builder()
            .filter_level(ConsoleLogger::level_for(verbosity))
            .try_init();
    }
}
