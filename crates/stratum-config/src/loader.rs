//! Layered config loading.
//!
//! `Config::load()` starts from the embedded `defaults.toml`, merges the
//! system, user and workspace files that exist (in that order), fills still
//! unset fields from `STRATUM_*` variables, then deserializes and validates
//! the merged tree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::show::ResolvedConfig;
use crate::types::Config;
use crate::validate;

const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Config files larger than this are rejected unread (64 KB).
const MAX_CONFIG_FILE_SIZE: u64 = 65_536;

const SYSTEM_CONFIG: &str = "/etc/stratum/config.toml";

/// Load the configuration with layered file precedence.
///
/// `workspace_root` adds `{workspace_root}/.stratum/config.toml` as the
/// highest file layer. `home_override` is used as the user's `.stratum`
/// directory instead of `~/.stratum`.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a config file cannot be read or parsed, or
/// if the merged configuration fails validation.
pub fn load(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
) -> ConfigResult<ResolvedConfig> {
    let user_dir = match home_override {
        Some(dir) => dir.to_path_buf(),
        None => user_config_dir()?,
    };
    let mut files = vec![
        (PathBuf::from(SYSTEM_CONFIG), ConfigLayer::System),
        (user_dir.join("config.toml"), ConfigLayer::User),
    ];
    if let Some(root) = workspace_root {
        files.push((
            root.join(".stratum").join("config.toml"),
            ConfigLayer::Workspace,
        ));
    }
    load_layers(&files, &collect_env_vars())
}

/// Merge `files` (lowest priority first) over the defaults, then apply env
/// fallbacks.
pub(crate) fn load_layers(
    files: &[(PathBuf, ConfigLayer)],
    env_vars: &HashMap<String, String>,
) -> ConfigResult<ResolvedConfig> {
    let mut tree = parse_toml(DEFAULTS_TOML, "<defaults>")?;
    let mut field_sources = FieldSources::new();
    record_leaves(&tree, "", &ConfigLayer::Defaults, &mut field_sources);

    let mut loaded_files = Vec::with_capacity(files.len());
    for (path, layer) in files {
        let Some(overlay) = read_layer(path)? else {
            continue;
        };
        deep_merge_tracking(&mut tree, &overlay, "", layer, &mut field_sources);
        info!(path = %path.display(), layer = %layer, "merged config file");
        loaded_files.push(path.display().to_string());
    }

    let filled = apply_env_fallbacks(&mut tree, &mut field_sources, env_vars);
    if filled > 0 {
        debug!(filled, "filled unset fields from environment");
    }

    let config = into_config(tree, "<merged>")?;
    validate::validate(&config)?;
    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Load a single config file without defaults, layering or env fallbacks.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is missing, unreadable, malformed
/// or invalid.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let tree = read_layer(path)?.ok_or_else(|| ConfigError::ReadError {
        path: path.display().to_string(),
        source: std::io::ErrorKind::NotFound.into(),
    })?;
    let config = into_config(tree, &path.display().to_string())?;
    validate::validate(&config)?;
    Ok(config)
}

/// Read one layer. A missing file is not an error.
fn read_layer(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let read_error = |source| ConfigError::ReadError {
        path: path.display().to_string(),
        source,
    };

    let size = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file");
            return Ok(None);
        },
        Err(e) => return Err(read_error(e)),
    };
    if size > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::TooLarge {
            path: path.display().to_string(),
            size,
            limit: MAX_CONFIG_FILE_SIZE,
        });
    }

    let content = std::fs::read_to_string(path).map_err(read_error)?;
    parse_toml(&content, &path.display().to_string()).map(Some)
}

fn parse_toml(content: &str, label: &str) -> ConfigResult<toml::Value> {
    toml::from_str(content).map_err(|source| ConfigError::ParseError {
        path: label.to_owned(),
        source,
    })
}

fn into_config(tree: toml::Value, label: &str) -> ConfigResult<Config> {
    tree.try_into()
        .map_err(|source: toml::de::Error| ConfigError::ParseError {
            path: label.to_owned(),
            source,
        })
}

fn user_config_dir() -> ConfigResult<PathBuf> {
    let dirs = directories::BaseDirs::new().ok_or(ConfigError::NoHomeDir)?;
    Ok(dirs.home_dir().join(".stratum"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, rel: &str, body: &str) -> PathBuf {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn embedded_defaults_match_default_impl() {
        let tree = parse_toml(DEFAULTS_TOML, "<defaults>").unwrap();
        assert_eq!(into_config(tree, "<defaults>").unwrap(), Config::default());
    }

    #[test]
    fn no_files_yields_defaults() {
        let resolved = load_layers(&[], &HashMap::new()).unwrap();
        assert_eq!(resolved.config, Config::default());
        assert!(resolved.loaded_files.is_empty());
        assert_eq!(
            resolved.field_sources.get("finder.artifact_key"),
            Some(&ConfigLayer::Defaults)
        );
    }

    #[test]
    fn later_layers_win() {
        let tmp = tempfile::tempdir().unwrap();
        let user = write(
            tmp.path(),
            "home/config.toml",
            "[finder]\nartifact_key = \"user-finder\"\n[logging]\nlevel = \"debug\"\n",
        );
        let workspace = write(
            tmp.path(),
            "ws/.stratum/config.toml",
            "[finder]\nartifact_key = \"ws-finder\"\n",
        );

        let resolved = load_layers(
            &[(user, ConfigLayer::User), (workspace, ConfigLayer::Workspace)],
            &HashMap::new(),
        )
        .unwrap();

        assert_eq!(resolved.config.finder.artifact_key, "ws-finder");
        assert_eq!(resolved.config.logging.level, "debug");
        assert_eq!(resolved.loaded_files.len(), 2);
        assert_eq!(
            resolved.field_sources.get("finder.artifact_key"),
            Some(&ConfigLayer::Workspace)
        );
    }

    #[test]
    fn env_fills_unset_finder_path() {
        let env = HashMap::from([(
            "STRATUM_FINDER_PATH".to_owned(),
            "/opt/stratum/plugin-service-loader-1.0.jar".to_owned(),
        )]);
        let resolved = load_layers(&[], &env).unwrap();
        assert_eq!(
            resolved.config.finder.path.as_deref(),
            Some("/opt/stratum/plugin-service-loader-1.0.jar")
        );
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let bad = write(tmp.path(), "config.toml", "[finder\nartifact_key = 1");
        let result = load_layers(&[(bad, ConfigLayer::System)], &HashMap::new());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let padding = "#".repeat(70_000);
        let big = write(tmp.path(), "config.toml", &padding);
        let result = load_layers(&[(big, ConfigLayer::User)], &HashMap::new());
        assert!(matches!(result, Err(ConfigError::TooLarge { limit: 65_536, .. })));
    }

    #[test]
    fn load_file_requires_existing_file() {
        let result = load_file(Path::new("/nonexistent/stratum/config.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
        let missing = read_layer(Path::new("/nonexistent/stratum/config.toml")).unwrap();
        assert!(missing.is_none());
    }
}
