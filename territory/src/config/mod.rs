//! Configuration for Territory components.
//!
//! The configuration file lives at `~/.territory/config.ini` and is organised
//! in INI sections, one per concern:
//!
//! ```ini
//! [landmass]
//! source_url = https://raw.githubusercontent.com/dataofjapan/land/master/japan.geojson
//! timeout = 60
//!
//! [union]
//! coarse_tolerance = 0.1
//! fine_tolerance = 0.01
//!
//! [cache]
//! directory = .
//! ```
//!
//! Settings structs live in [`settings`], constants in [`defaults`], parsing
//! in `parser`, and serialization in `writer`.
//!
//! Tolerances are read when a union artifact is built. An existing artifact is
//! never rebuilt because the configured tolerance changed; remove it (or run
//! `territory prewarm --clean`) to apply a new value.

mod defaults;
mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{
    CacheSettings, ConfigFile, LandmassSettings, LoggingSettings, ServerSettings, SiteSettings,
    UnionSettings,
};
