//! Minimal stderr backend for the `log` facade.
//!
//! Library code only logs through `log` macros; the binaries install this
//! logger so diagnostics land on stderr, away from protocol output.

use std::io::Write;
use std::str::FromStr;

use chrono::Utc;
use log::{LevelFilter, Log, Metadata, Record};

/// Environment variable holding the level filter, e.g. `debug`.
pub const LOG_ENV: &str = "READY_ABOUT_LOG";

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = writeln!(
            std::io::stderr().lock(),
            "{} {:<5} {}: {}",
            Utc::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Installs the stderr logger at `level`. Later calls are ignored.
pub fn init(level: LevelFilter) {
    if log::set_boxed_logger(Box::new(StderrLogger { level })).is_ok() {
        log::set_max_level(level);
    }
}

/// Installs the stderr logger at the level named by `READY_ABOUT_LOG`,
/// `warn` when unset or unreadable.
pub fn init_from_env() {
    init(level_from(std::env::var(LOG_ENV).ok().as_deref()));
}

fn level_from(raw: Option<&str>) -> LevelFilter {
    raw.and_then(|s| LevelFilter::from_str(s).ok())
        .unwrap_or(LevelFilter::Warn)
}
