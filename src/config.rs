//! Core configuration.
//!
//! Every field has an explicit default, so an empty JSON object or an empty
//! environment yields a working configuration.

use std::path::Path;
use std::str::FromStr;

use intake::IntakeConfig;
use log::info;
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_RECORD_CACHE_CAPACITY;
use crate::error::ConfigError;
use crate::keycache::LockPolicy;
use crate::message::StatusThresholds;

pub const ENV_TIMEOUT_ENABLED: &str = "PASSPHRASE_TIMEOUT_ENABLED";
pub const ENV_TIMEOUT_MINUTES: &str = "PASSPHRASE_TIMEOUT_MINUTES";
pub const ENV_ACCEPT_ALL: &str = "ACCEPT_ALL_SMS";
pub const ENV_VERIFYING: &str = "VERIFYING_STATE";
pub const ENV_RECORD_CACHE_SIZE: &str = "RECORD_CACHE_SIZE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub lock: LockPolicy,
    pub intake: IntakeConfig,
    pub status: StatusThresholds,
    pub record_cache_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            lock: LockPolicy::default(),
            intake: IntakeConfig::default(),
            status: StatusThresholds::default(),
            record_cache_capacity: DEFAULT_RECORD_CACHE_CAPACITY,
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by whichever environment variables are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(enabled) = parse_bool(&lookup, ENV_TIMEOUT_ENABLED)? {
            config.lock.timeout_enabled = enabled;
        }
        if let Some(minutes) = parse_number::<u64>(&lookup, ENV_TIMEOUT_MINUTES)? {
            config.lock.timeout_minutes = minutes;
        }
        if let Some(accept_all) = parse_bool(&lookup, ENV_ACCEPT_ALL)? {
            config.intake.accept_all = accept_all;
        }
        if let Some(verifying) = parse_bool(&lookup, ENV_VERIFYING)? {
            config.intake.awaiting_verification = verifying;
        }
        if let Some(capacity) = parse_number::<usize>(&lookup, ENV_RECORD_CACHE_SIZE)? {
            config.record_cache_capacity = capacity;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        info!("[from_json_file] loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock.timeout_minutes == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.record_cache_capacity == 0 {
            return Err(ConfigError::ZeroCacheCapacity);
        }
        if !self.status.is_ordered() {
            return Err(ConfigError::UnorderedThresholds {
                none: self.status.none,
                pending: self.status.pending,
                failed: self.status.failed,
            });
        }
        Ok(())
    }
}

fn parse_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<bool>, ConfigError> {
    lookup(var)
        .map(|raw| {
            raw.trim()
                .to_ascii_lowercase()
                .parse::<bool>()
                .map_err(|source| ConfigError::InvalidBool { var, source })
        })
        .transpose()
}

fn parse_number<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr<Err = std::num::ParseIntError>,
{
    lookup(var)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|source| ConfigError::InvalidInteger { var, source })
        })
        .transpose()
}
