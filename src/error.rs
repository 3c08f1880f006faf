use std::io;

use thiserror::Error;

/// Errors raised while validating input or sieving.
#[derive(Debug, Error)]
pub enum SieveError {
    #[error("invalid range: end ({end}) is smaller than start ({start})")]
    InvalidRange { start: u64, end: u64 },

    #[error("invalid range: start must be at least 1")]
    StartBelowOne,

    #[error("at least one worker thread is required")]
    NoWorkers,

    #[error("end {end} is too large, the maximum supported bound is {max}")]
    TooLarge { end: u64, max: u64 },

    #[error("could not allocate {what} ({len} entries)")]
    Allocation { what: &'static str, len: u64 },

    #[error("could not spawn worker {id}: {source}")]
    Spawn { id: usize, source: io::Error },

    #[error("worker {id} panicked")]
    WorkerPanicked { id: usize },

    #[error("result collection lock was poisoned by a failed worker")]
    LockPoisoned,
}

impl SieveError {
    /// Configuration errors are rejected before any sieving starts.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            SieveError::InvalidRange { .. }
                | SieveError::StartBelowOne
                | SieveError::NoWorkers
                | SieveError::TooLarge { .. }
        )
    }
}

/// Errors raised while presenting or persisting a finished run.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("could not determine data directory (set XDG_DATA_HOME or HOME, or pass --output)")]
    NoDataDir,
}
