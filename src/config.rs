//! Runtime settings, built from the command line.

use std::path::PathBuf;
use std::time::Duration;

/// Lower bound for the periodic refresh interval.
pub const MIN_REFRESH_MS: u64 = 250;
pub const DEFAULT_REFRESH_MS: u64 = 2000;
pub const DEFAULT_ROWS: usize = 20;

/// Pause after a kill request so the OS can reap the process.
const KILL_GRACE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct Config {
    /// Periodic refresh of the interactive table.
    pub refresh_interval: Duration,
    /// Upper bound on visible table rows.
    pub max_rows: usize,
    pub kill_grace: Duration,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_millis(DEFAULT_REFRESH_MS),
            max_rows: DEFAULT_ROWS,
            kill_grace: KILL_GRACE,
            log_level: "warn".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    pub fn with_refresh_ms(mut self, ms: u64) -> Self {
        self.refresh_interval = Duration::from_millis(ms.max(MIN_REFRESH_MS));
        self
    }

    pub fn with_rows(mut self, rows: usize) -> Self {
        self.max_rows = rows.max(1);
        self
    }

    pub fn with_logging(mut self, level: impl Into<String>, file: Option<PathBuf>) -> Self {
        self.log_level = level.into();
        self.log_file = file;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_interval_has_a_floor() {
        let config = Config::default().with_refresh_ms(10);
        assert_eq!(config.refresh_interval, Duration::from_millis(MIN_REFRESH_MS));

        let config = Config::default().with_refresh_ms(5000);
        assert_eq!(config.refresh_interval, Duration::from_secs(5));
    }

    #[test]
    fn rows_never_zero() {
        assert_eq!(Config::default().with_rows(0).max_rows, 1);
        assert_eq!(Config::default().with_rows(35).max_rows, 35);
    }
}
