//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

use crate::tier::QualityTier;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Raw landmass download settings
    pub landmass: LandmassSettings,
    /// Union simplification settings
    pub union: UnionSettings,
    /// Artifact cache settings
    pub cache: CacheSettings,
    /// Site registry settings
    pub sites: SiteSettings,
    /// HTTP server settings
    pub server: ServerSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Where the raw national boundary comes from.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmassSettings {
    /// URL of the raw boundary FeatureCollection.
    pub source_url: String,
    /// HTTP request timeout in seconds.
    pub timeout: u64,
}

/// Simplification tolerances applied after the union, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnionSettings {
    pub coarse_tolerance: f64,
    pub fine_tolerance: f64,
}

impl UnionSettings {
    /// Tolerance configured for the given tier.
    pub fn tolerance(&self, tier: QualityTier) -> f64 {
        match tier {
            QualityTier::Coarse => self.coarse_tolerance,
            QualityTier::Fine => self.fine_tolerance,
        }
    }
}

/// Artifact cache configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Directory holding every persisted artifact.
    pub directory: PathBuf,
}

/// Site registry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSettings {
    /// JSON file holding site records.
    pub file: PathBuf,
    /// Series allow-list. Empty admits every record.
    pub series: Vec<String>,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    /// Address to bind.
    pub bind: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path.
    pub file: PathBuf,
}
