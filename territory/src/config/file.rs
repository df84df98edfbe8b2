//! Reading and writing `config.ini`.
//!
//! A missing file is not an error: every setting falls back to its default.

use std::io;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;

/// Why a configuration file could not be used.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A value is present but unusable.
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigFile {
    /// Load `~/.territory/config.ini`.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load `path`, or defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        super::parser::parse_ini(&ini)
    }

    /// Write every setting to `~/.territory/config.ini`.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Write every setting to `path`, creating missing parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        let write_err = |source| ConfigFileError::Write {
            path: path.to_path_buf(),
            source,
        };

        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                std::fs::create_dir_all(parent).map_err(write_err)?
            }
            _ => {}
        }
        std::fs::write(path, super::writer::to_config_string(self)).map_err(write_err)
    }
}

/// `~/.territory`, or `./.territory` when there is no home directory.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".territory")
}

/// `~/.territory/config.ini`.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_constants() {
        let config = ConfigFile::default();

        assert_eq!(config.landmass.source_url, DEFAULT_LANDMASS_URL);
        assert_eq!(config.union.coarse_tolerance, 0.1);
        assert_eq!(config.union.fine_tolerance, 0.01);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.sites.series.len(), 2);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("missing.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.union.coarse_tolerance = 0.25;
        config.cache.directory = PathBuf::from("/var/lib/territory");
        config.sites.series = vec!["Custom".to_string()];
        config.server.port = 8080;

        config.save_to(&path).unwrap();
        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unreadable_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[union\ncoarse_tolerance = 0.1\n").unwrap();

        match ConfigFile::load_from(&path) {
            Err(ConfigFileError::Read { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected read error, got {:?}", other),
        }
    }

    #[test]
    fn test_config_file_path_is_under_config_directory() {
        assert!(config_file_path().starts_with(config_directory()));
        assert!(config_file_path().ends_with("config.ini"));
    }
}
