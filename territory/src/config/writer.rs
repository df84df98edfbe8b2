//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[landmass]
; Raw national boundary, a GeoJSON FeatureCollection
source_url = {}
; Download timeout in seconds
timeout = {}

[union]
; Simplification tolerance per tier, in degrees.
; An existing union artifact is not rebuilt when these change.
coarse_tolerance = {}
fine_tolerance = {}

[cache]
; Directory holding every derived artifact
directory = {}

[sites]
; JSON file with site records
file = {}
; Comma separated series allow-list (empty admits all)
series = {}

[server]
bind = {}
; The PORT environment variable takes precedence
port = {}

[logging]
file = {}
"#,
        config.landmass.source_url,
        config.landmass.timeout,
        config.union.coarse_tolerance,
        config.union.fine_tolerance,
        path_to_string(&config.cache.directory),
        path_to_string(&config.sites.file),
        config.sites.series.join(","),
        config.server.bind,
        config.server.port,
        path_to_string(&config.logging.file),
    )
}

/// Render a path, collapsing the home directory back to `~`.
pub(super) fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
