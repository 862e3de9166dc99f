use serde::Serialize;

use crate::merge::FieldSources;
use crate::types::Config;

/// Output format for [`ResolvedConfig::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowFormat {
    /// TOML, as it would appear in a config file.
    Toml,
    /// Pretty-printed JSON including field sources.
    Json,
}

/// A fully merged configuration plus where each value came from.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// The effective configuration.
    pub config: Config,
    /// Dotted field path -> layer that set it.
    pub field_sources: FieldSources,
    /// Config files that were found and merged, lowest priority first.
    pub loaded_files: Vec<String>,
}

impl ResolvedConfig {
    /// Render the resolved configuration for display.
    #[must_use]
    pub fn render(&self, format: ShowFormat) -> String {
        match format {
            ShowFormat::Toml => toml::to_string_pretty(&self.config)
                .unwrap_or_else(|e| format!("# failed to render config: {e}\n")),
            ShowFormat::Json => serde_json::to_string_pretty(self)
                .unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}")),
        }
    }
}
