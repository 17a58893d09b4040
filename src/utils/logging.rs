// Logging utilities
// Author: Gabriel Demetrios Lafis

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use super::Config;

const CRATE_PREFIX: &str = "datalexir::";

/// Install the stderr logger at `level`
pub fn init_logging(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(StderrLogger { level })).map(|()| log::set_max_level(level))
}

/// Install the stderr logger at the level named in `config`
pub fn init_logging_from_config(config: &Config) -> Result<(), SetLoggerError> {
    init_logging(config.log_level_filter())
}

/// Coloured, timestamped lines on stderr
struct StderrLogger {
    level: LevelFilter,
}

impl StderrLogger {
    fn label(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[31mERROR\x1B[0m",
            Level::Warn => "\x1B[33mWARN \x1B[0m",
            Level::Info => "\x1B[32mINFO \x1B[0m",
            Level::Debug => "\x1B[34mDEBUG\x1B[0m",
            Level::Trace => "\x1B[90mTRACE\x1B[0m",
        }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // recording::proxy rather than datalexir::recording::proxy
        let target = record.target();
        let target = target.strip_prefix(CRATE_PREFIX).unwrap_or(target);

        eprintln!(
            "[{}] {} {}: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            Self::label(record.level()),
            target,
            record.args()
        );
    }

    fn flush(&self) {}
}
