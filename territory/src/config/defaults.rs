//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use std::path::PathBuf;

use super::settings::*;

/// Raw boundary of the Japanese landmass, one feature per prefecture.
pub const DEFAULT_LANDMASS_URL: &str =
    "https://raw.githubusercontent.com/dataofjapan/land/master/japan.geojson";

/// Timeout for the one-off landmass download, in seconds.
pub const DEFAULT_LANDMASS_TIMEOUT_SECS: u64 = 60;

/// Simplification tolerance for the coarse tier, in degrees.
pub const DEFAULT_COARSE_TOLERANCE: f64 = 0.1;

/// Simplification tolerance for the fine tier, in degrees.
pub const DEFAULT_FINE_TOLERANCE: f64 = 0.01;

/// Default artifact directory (the working directory).
pub const DEFAULT_CACHE_DIRECTORY: &str = ".";

/// Default site registry file.
pub const DEFAULT_SITES_FILE: &str = "sites.json";

/// Series admitted by default.
pub const DEFAULT_SITE_SERIES: &[&str] = &["日本100名城", "続日本100名城"];

/// Default bind address.
pub const DEFAULT_SERVER_BIND: &str = "127.0.0.1";

/// Default HTTP port.
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Environment variable overriding the configured port.
pub const PORT_ENV_VAR: &str = "PORT";

/// Default log file.
pub const DEFAULT_LOG_FILE: &str = "logs/territory.log";

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            landmass: LandmassSettings {
                source_url: DEFAULT_LANDMASS_URL.to_string(),
                timeout: DEFAULT_LANDMASS_TIMEOUT_SECS,
            },
            union: UnionSettings {
                coarse_tolerance: DEFAULT_COARSE_TOLERANCE,
                fine_tolerance: DEFAULT_FINE_TOLERANCE,
            },
            cache: CacheSettings {
                directory: PathBuf::from(DEFAULT_CACHE_DIRECTORY),
            },
            sites: SiteSettings {
                file: PathBuf::from(DEFAULT_SITES_FILE),
                series: DEFAULT_SITE_SERIES.iter().map(|s| s.to_string()).collect(),
            },
            server: ServerSettings {
                bind: DEFAULT_SERVER_BIND.to_string(),
                port: DEFAULT_SERVER_PORT,
            },
            logging: LoggingSettings {
                file: PathBuf::from(DEFAULT_LOG_FILE),
            },
        }
    }
}

impl ServerSettings {
    /// Port to listen on, honouring the `PORT` environment variable.
    pub fn effective_port(&self) -> u16 {
        std::env::var(PORT_ENV_VAR)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(self.port)
    }
}
