//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [landmass] section
    if let Some(section) = ini.section(Some("landmass")) {
        if let Some(v) = section.get("source_url") {
            let v = v.trim();
            if !v.is_empty() {
                config.landmass.source_url = v.to_string();
            }
        }
        if let Some(v) = section.get("timeout") {
            config.landmass.timeout = v.trim().parse().map_err(|_| invalid(
                "landmass",
                "timeout",
                v,
                "must be a positive integer (seconds)",
            ))?;
        }
    }

    // [union] section
    if let Some(section) = ini.section(Some("union")) {
        if let Some(v) = section.get("coarse_tolerance") {
            config.union.coarse_tolerance = parse_tolerance(v)
                .map_err(|reason| invalid("union", "coarse_tolerance", v, reason))?;
        }
        if let Some(v) = section.get("fine_tolerance") {
            config.union.fine_tolerance = parse_tolerance(v)
                .map_err(|reason| invalid("union", "fine_tolerance", v, reason))?;
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.cache.directory = expand_tilde(v);
            }
        }
    }

    // [sites] section
    if let Some(section) = ini.section(Some("sites")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.sites.file = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("series") {
            config.sites.series = parse_series(v);
        }
    }

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("bind") {
            let v = v.trim();
            if !v.is_empty() {
                config.server.bind = v.to_string();
            }
        }
        if let Some(v) = section.get("port") {
            config.server.port = v
                .trim()
                .parse()
                .map_err(|_| invalid("server", "port", v, "must be an integer in 0-65535"))?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a simplification tolerance. Must be finite and strictly positive.
pub(super) fn parse_tolerance(value: &str) -> Result<f64, &'static str> {
    match value.trim().parse::<f64>() {
        Ok(t) if t.is_finite() && t > 0.0 => Ok(t),
        _ => Err("must be a finite number greater than 0 (degrees)"),
    }
}

/// Split a comma separated series list, dropping blanks.
pub(super) fn parse_series(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
