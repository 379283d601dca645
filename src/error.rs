//! Error taxonomy shared by every module.

use std::io;

use thiserror::Error;

/// Failures surfaced by data collection, the terminal, and process control.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Raw mode could not be engaged (no TTY, or the mode call failed).
    #[error("terminal unavailable: {0}")]
    TerminalUnavailable(String),

    /// The process data source could not produce a snapshot.
    #[error("failed to collect process snapshot: {0}")]
    SnapshotFetchFailed(String),

    /// A signal could not be delivered to a process.
    #[error("failed to send {signal} to process {pid}: {source}")]
    TerminationRequestFailed {
        pid: u32,
        signal: &'static str,
        #[source]
        source: io::Error,
    },

    /// The watched process exited or cannot be read.
    #[error("process {0} terminated or is not accessible")]
    ProcessNotFound(u32),

    /// Neither a dedicated nor an integrated GPU could be detected.
    #[error("could not detect GPU: {0}")]
    GpuUnavailable(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
