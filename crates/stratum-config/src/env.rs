use std::collections::HashMap;

use crate::merge::{ConfigLayer, FieldSources};

/// Environment variables consulted as fallbacks, with the field they fill.
pub const ENV_FALLBACKS: &[(&str, &str)] = &[
    ("STRATUM_FINDER_PATH", "finder.path"),
    ("STRATUM_FINDER_ARTIFACT_KEY", "finder.artifact_key"),
    ("STRATUM_PLUGINS_DIR", "plugins.directory"),
    ("STRATUM_LOG_LEVEL", "logging.level"),
    ("STRATUM_LOG_FORMAT", "logging.format"),
    ("STRATUM_LOG_DIR", "logging.directory"),
];

/// Snapshot all `STRATUM_*` environment variables.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("STRATUM_"))
        .collect()
}

/// Fill fields that no config file set from their environment variable.
///
/// A field counts as unset when it is missing from `sources` or was only
/// supplied by the embedded defaults. Returns the number of fields filled.
pub fn apply_env_fallbacks(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String>,
) -> usize {
    let mut applied = 0usize;
    for (var, field) in ENV_FALLBACKS {
        let Some(value) = env_vars.get(*var) else {
            continue;
        };
        let set_by_file = sources
            .get(*field)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }
        if set_path(merged, field, toml::Value::String(value.clone())) {
            sources.insert((*field).to_owned(), ConfigLayer::Environment);
            applied = applied.saturating_add(1);
        }
    }
    applied
}

/// Set a dotted path inside a TOML table, creating intermediate tables.
fn set_path(root: &mut toml::Value, path: &str, value: toml::Value) -> bool {
    let mut current = root;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let toml::Value::Table(table) = current else {
            return false;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), value);
            return true;
        }
        current = table
            .entry(segment.to_owned())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }
    false
}
