//! CLI runner for common setup.
//!
//! Loads configuration, initializes logging and wires the cache, landmass
//! source and site registry that every command shares.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use territory::cache::{ArtifactPaths, DerivedCache};
use territory::config::ConfigFile;
use territory::landmass::{LandmassSource, LandmassUnionBuilder, ReqwestClient};
use territory::logging::{init_logging, split_log_path, LoggingGuard};
use territory::site::{DirtyMarker, JsonSiteRegistry};
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load config (from `config_path` or the default location) and start
    /// logging to the configured file and stdout.
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config = load_config(config_path)?;

        let (log_dir, log_file) = split_log_path(&config.logging.file);
        let logging_guard = init_logging(&log_dir, &log_file, true)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("Territory v{}", territory::VERSION);
        info!("Territory CLI: {} command", command);
        info!(
            cache_dir = %self.config.cache.directory.display(),
            sites = %self.config.sites.file.display(),
            "Using artifact directory"
        );
    }

    /// Build the derived cache and its landmass pipeline.
    pub fn create_cache(&self) -> Result<Arc<DerivedCache>, CliError> {
        let client =
            ReqwestClient::with_timeout(self.config.landmass.timeout).map_err(CliError::HttpClient)?;
        let paths = ArtifactPaths::new(&self.config.cache.directory);
        let source = LandmassSource::new(
            Arc::new(client),
            self.config.landmass.source_url.clone(),
            paths.raw(),
        );
        let builder = LandmassUnionBuilder::new(source, paths.clone(), self.config.union);
        Ok(Arc::new(DerivedCache::new(paths, builder)))
    }

    /// Build the site registry, marking `cache` dirty whenever a site moves.
    pub fn create_registry(&self, cache: &Arc<DerivedCache>) -> Arc<JsonSiteRegistry> {
        let registry = JsonSiteRegistry::new(
            self.config.sites.file.clone(),
            self.config.sites.series.clone(),
        );
        registry.add_observer(Arc::new(DirtyMarker::new(Arc::clone(cache))));
        Arc::new(registry)
    }
}

/// Load configuration without touching logging.
pub fn load_config(config_path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match config_path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

/// Path of the config file in effect.
pub fn effective_config_path(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(territory::config::config_file_path)
}
