use std::io;
use std::time::Duration;
use thiserror::Error;

/// A trace error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A trace error.
///
/// Any of these is fatal to a pipeline run, per-hop geolocation failures
/// are recorded on the hop instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("trace command `{0}` is unavailable: {1}")]
    TraceUnavailable(String, io::Error),
    #[error("trace did not complete within {0:?}")]
    TraceTimeout(Duration),
    #[error("trace timeout {0:?} is out of range")]
    InvalidTimeout(Duration),
    #[error("trace failed: {0}")]
    TraceFailed(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

