use std::num::ParseIntError;
use std::str::ParseBoolError;

/// Errors raised while loading or validating configuration.
///
/// The credential manager, classifier and intake filter never fail; this is
/// the only error type the crate exposes.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid boolean in {var}: {source}")]
    InvalidBool {
        var: &'static str,
        #[source]
        source: ParseBoolError,
    },
    #[error("Invalid integer in {var}: {source}")]
    InvalidInteger {
        var: &'static str,
        #[source]
        source: ParseIntError,
    },
    #[error("Passphrase timeout interval must be greater than zero")]
    ZeroTimeout,
    #[error("Record cache capacity must be greater than zero")]
    ZeroCacheCapacity,
    #[error("Delivery status thresholds out of order: none={none}, pending={pending}, failed={failed}")]
    UnorderedThresholds { none: i32, pending: i32, failed: i32 },

    #[error("Problem from std::io library: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON processing error: {0}")]
    JsonError(#[from] serde_json::Error),
}
