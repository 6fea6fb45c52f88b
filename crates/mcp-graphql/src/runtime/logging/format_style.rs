use serde::Deserialize;

/// Log line layout, mapped onto the tracing-subscriber formatters
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormatStyle {
    /// Human-readable, single-line logs
    #[default]
    Full,
    /// Single-line logs optimized for short line lengths
    Compact,
    /// Newline-delimited JSON objects
    Json,
    /// Multi-line logs including source locations
    Pretty,
}
