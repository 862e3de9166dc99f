use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigLayer {
    /// Embedded `defaults.toml`.
    Defaults,
    /// `/etc/stratum/config.toml`.
    System,
    /// `~/.stratum/config.toml`.
    User,
    /// `{workspace}/.stratum/config.toml`.
    Workspace,
    /// A `STRATUM_*` environment variable.
    Environment,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Defaults => "defaults",
            Self::System => "system",
            Self::User => "user",
            Self::Workspace => "workspace",
            Self::Environment => "environment",
        };
        f.write_str(label)
    }
}

/// Dotted field path -> layer that last set it.
pub type FieldSources = HashMap<String, ConfigLayer>;

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Merge `overlay` into `base` and record `layer` for every leaf it sets.
///
/// Only tables present on both sides are merged key by key. Anything else in
/// the overlay, arrays included, replaces what `base` held.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    let toml::Value::Table(overlay_table) = overlay else {
        *base = overlay.clone();
        sources.insert(prefix.to_owned(), layer.clone());
        return;
    };
    if !base.is_table() {
        *base = overlay.clone();
        record_leaves(overlay, prefix, layer, sources);
        return;
    }
    let Some(base_table) = base.as_table_mut() else {
        return;
    };

    for (key, value) in overlay_table {
        let path = join_path(prefix, key);
        let nested = value.is_table() && base_table.get(key).is_some_and(toml::Value::is_table);
        if nested {
            if let Some(existing) = base_table.get_mut(key) {
                deep_merge_tracking(existing, value, &path, layer, sources);
            }
        } else {
            base_table.insert(key.clone(), value.clone());
            record_leaves(value, &path, layer, sources);
        }
    }
}

/// Record `layer` as the source of every leaf below `prefix`.
pub fn record_leaves(
    value: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    match value.as_table() {
        Some(table) => {
            for (key, child) in table {
                record_leaves(child, &join_path(prefix, key), layer, sources);
            }
        },
        None => {
            sources.insert(prefix.to_owned(), layer.clone());
        },
    }
}
