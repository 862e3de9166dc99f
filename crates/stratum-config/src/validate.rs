//! Checks applied after all layers are merged.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn one_of(kind: &str, value: &str, allowed: &[&str]) -> String {
    format!(
        "unknown {kind} '{value}'; expected one of: {}",
        allowed.join(", ")
    )
}

/// Check a merged configuration for values the host cannot use.
///
/// # Errors
///
/// Stops at the first offending field.
pub fn validate(config: &Config) -> ConfigResult<()> {
    check_finder(config)?;

    if config.plugins.name.trim().is_empty() {
        return Err(invalid(
            "plugins.name",
            "watch directory name must not be empty",
        ));
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        let message = one_of("level", &config.logging.level, LOG_LEVELS);
        return Err(invalid("logging.level", message));
    }
    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        let message = one_of("format", &config.logging.format, LOG_FORMATS);
        return Err(invalid("logging.format", message));
    }
    if config.logging.directory.is_some() && config.logging.file_prefix.trim().is_empty() {
        return Err(invalid(
            "logging.file_prefix",
            "file prefix must not be empty when logging to a directory",
        ));
    }
    Ok(())
}

fn check_finder(config: &Config) -> ConfigResult<()> {
    let key = config.finder.artifact_key.as_str();
    if key.trim().is_empty() {
        return Err(invalid("finder.artifact_key", "artifact key must not be empty"));
    }
    if key.contains(['/', '\\']) {
        return Err(invalid(
            "finder.artifact_key",
            format!("artifact key is a filename prefix, not a path: '{key}'"),
        ));
    }
    match config.finder.path.as_deref() {
        Some("") => Err(invalid(
            "finder.path",
            "finder path must not be empty when set",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(edit: impl FnOnce(&mut Config)) -> Config {
        let mut config = Config::default();
        edit(&mut config);
        config
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn artifact_key_must_be_a_prefix() {
        let config = with(|c| c.finder.artifact_key = "lib/plugin-service-loader".to_owned());
        let field = match validate(&config) {
            Err(ConfigError::ValidationError { field, .. }) => field,
            other => panic!("expected a validation error, got {other:?}"),
        };
        assert_eq!(field, "finder.artifact_key");
    }

    #[test]
    fn empty_finder_path_rejected() {
        let config = with(|c| c.finder.path = Some(String::new()));
        assert!(validate(&config).is_err());
    }

    #[test]
    fn unknown_log_format_rejected() {
        let config = with(|c| c.logging.format = "xml".to_owned());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn file_logging_needs_a_prefix() {
        let config = with(|c| {
            c.logging.directory = Some("logs".to_owned());
            c.logging.file_prefix = " ".to_owned();
        });
        let field = match validate(&config) {
            Err(ConfigError::ValidationError { field, .. }) => field,
            other => panic!("expected a validation error, got {other:?}"),
        };
        assert_eq!(field, "logging.file_prefix");
    }

    #[test]
    fn level_is_case_insensitive() {
        let config = with(|c| c.logging.level = "DEBUG".to_owned());
        assert!(validate(&config).is_ok());
    }
}
