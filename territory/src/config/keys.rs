//! Configuration key access and validation.
//!
//! A type-safe interface for getting and setting configuration values by
//! their dotted key name, used by `territory config get/set`.

use std::str::FromStr;
use thiserror::Error;

use super::parser::{expand_tilde, parse_series, parse_tolerance};
use super::settings::ConfigFile;
use super::writer::path_to_string;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    LandmassSourceUrl,
    LandmassTimeout,
    UnionCoarseTolerance,
    UnionFineTolerance,
    CacheDirectory,
    SitesFile,
    SitesSeries,
    ServerBind,
    ServerPort,
    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|key| key.name() == s.to_lowercase())
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "union.fine_tolerance").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::LandmassSourceUrl => "landmass.source_url",
            ConfigKey::LandmassTimeout => "landmass.timeout",
            ConfigKey::UnionCoarseTolerance => "union.coarse_tolerance",
            ConfigKey::UnionFineTolerance => "union.fine_tolerance",
            ConfigKey::CacheDirectory => "cache.directory",
            ConfigKey::SitesFile => "sites.file",
            ConfigKey::SitesSeries => "sites.series",
            ConfigKey::ServerBind => "server.bind",
            ConfigKey::ServerPort => "server.port",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Get the section name (e.g., "union").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "fine_tolerance").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::LandmassSourceUrl => config.landmass.source_url.clone(),
            ConfigKey::LandmassTimeout => config.landmass.timeout.to_string(),
            ConfigKey::UnionCoarseTolerance => config.union.coarse_tolerance.to_string(),
            ConfigKey::UnionFineTolerance => config.union.fine_tolerance.to_string(),
            ConfigKey::CacheDirectory => path_to_string(&config.cache.directory),
            ConfigKey::SitesFile => path_to_string(&config.sites.file),
            ConfigKey::SitesSeries => config.sites.series.join(","),
            ConfigKey::ServerBind => config.server.bind.clone(),
            ConfigKey::ServerPort => config.server.port.to_string(),
            ConfigKey::LoggingFile => path_to_string(&config.logging.file),
        }
    }

    /// Validate and set the value in a config file.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let fail = |reason: &str| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: reason.to_string(),
        };
        let value = value.trim();

        match self {
            ConfigKey::LandmassSourceUrl => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(fail("must be an http(s) URL"));
                }
                config.landmass.source_url = value.to_string();
            }
            ConfigKey::LandmassTimeout => {
                config.landmass.timeout = value
                    .parse()
                    .ok()
                    .filter(|t| *t > 0)
                    .ok_or_else(|| fail("must be a positive integer (seconds)"))?;
            }
            ConfigKey::UnionCoarseTolerance => {
                config.union.coarse_tolerance = parse_tolerance(value).map_err(fail)?;
            }
            ConfigKey::UnionFineTolerance => {
                config.union.fine_tolerance = parse_tolerance(value).map_err(fail)?;
            }
            ConfigKey::CacheDirectory => {
                if value.is_empty() {
                    return Err(fail("must not be empty"));
                }
                config.cache.directory = expand_tilde(value);
            }
            ConfigKey::SitesFile => {
                if value.is_empty() {
                    return Err(fail("must not be empty"));
                }
                config.sites.file = expand_tilde(value);
            }
            ConfigKey::SitesSeries => {
                config.sites.series = parse_series(value);
            }
            ConfigKey::ServerBind => {
                if value.is_empty() {
                    return Err(fail("must not be empty"));
                }
                config.server.bind = value.to_string();
            }
            ConfigKey::ServerPort => {
                config.server.port = value
                    .parse()
                    .map_err(|_| fail("must be an integer in 0-65535"))?;
            }
            ConfigKey::LoggingFile => {
                if value.is_empty() {
                    return Err(fail("must not be empty"));
                }
                config.logging.file = expand_tilde(value);
            }
        }
        Ok(())
    }

    /// Every supported key, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::LandmassSourceUrl,
            ConfigKey::LandmassTimeout,
            ConfigKey::UnionCoarseTolerance,
            ConfigKey::UnionFineTolerance,
            ConfigKey::CacheDirectory,
            ConfigKey::SitesFile,
            ConfigKey::SitesSeries,
            ConfigKey::ServerBind,
            ConfigKey::ServerPort,
            ConfigKey::LoggingFile,
        ]
    }
}
