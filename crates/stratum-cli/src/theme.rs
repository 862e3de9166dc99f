//! Terminal styling shared by the commands.

use colored::{ColoredString, Colorize};

const RULE_WIDTH: usize = 50;

/// Styles for human-readable output. JSON output never goes through here.
pub(crate) struct Theme;

impl Theme {
    pub(crate) fn header(title: &str) -> String {
        title.bold().cyan().to_string()
    }

    pub(crate) fn success(message: &str) -> String {
        Self::marked("✓".green(), message.normal())
    }

    pub(crate) fn warning(message: &str) -> String {
        Self::marked("!".yellow(), message.yellow())
    }

    pub(crate) fn dimmed(note: &str) -> String {
        note.dimmed().to_string()
    }

    /// An indented `key value` row with the key column padded.
    pub(crate) fn kv(key: &str, value: &str) -> String {
        format!("  {:<12} {value}", key.dimmed())
    }

    pub(crate) fn separator() -> String {
        "━".repeat(RULE_WIDTH).dimmed().to_string()
    }

    fn marked(mark: ColoredString, message: ColoredString) -> String {
        format!("{mark} {message}")
    }
}
