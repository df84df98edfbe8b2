//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and the exit code.

use std::fmt;
use std::process;

use territory::cache::{CacheError, GenerationError};
use territory::config::ConfigFileError;
use territory::landmass::LandmassError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to build the HTTP client
    HttpClient(LandmassError),
    /// Generation pipeline failure
    Generation(GenerationError),
    /// Cache maintenance failure
    Cache(CacheError),
    /// Invalid listen address
    Address(String),
    /// HTTP server error
    Serve(std::io::Error),
}

impl CliError {
    /// Exit the process with an error message and code 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Generation(GenerationError::Landmass(_)) => {
                eprintln!();
                eprintln!("The raw landmass could not be loaded. Check that:");
                eprintln!("  1. [landmass] source_url is reachable");
                eprintln!("  2. the cache directory is writable");
                eprintln!("  3. any existing japan.geojson snapshot is a FeatureCollection");
            }
            CliError::Serve(_) => {
                eprintln!();
                eprintln!("Is another process already listening on that port?");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::HttpClient(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Generation(e) => write!(f, "Generation failed: {}", e),
            CliError::Cache(e) => write!(f, "Cache error: {}", e),
            CliError::Address(msg) => write!(f, "Invalid listen address: {}", msg),
            CliError::Serve(e) => write!(f, "HTTP server error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::HttpClient(e) => Some(e),
            CliError::Generation(e) => Some(e),
            CliError::Cache(e) => Some(e),
            CliError::Serve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<GenerationError> for CliError {
    fn from(e: GenerationError) -> Self {
        CliError::Generation(e)
    }
}

impl From<CacheError> for CliError {
    fn from(e: CacheError) -> Self {
        CliError::Cache(e)
    }
}
