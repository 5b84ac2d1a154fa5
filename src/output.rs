//! Output formatting shared by the CLI commands

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default maximum width of a value shown in table output
pub const DEFAULT_VALUE_MAX_LEN: usize = 40;

/// Output format of every CLI command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Pretty table with borders (default)
    #[default]
    Table,
    /// Markdown table format
    Markdown,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON with indentation
    JsonPretty,
}

impl OutputFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty)
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Self::Table | Self::Markdown)
    }

    pub fn all_names() -> &'static [&'static str] {
        &["table", "markdown", "json", "json-pretty"]
    }

    /// Serialize `value` as JSON in this format's layout
    ///
    /// Table formats fall back to pretty JSON.
    pub fn to_json<T: Serialize>(&self, value: &T) -> serde_json::Result<String> {
        match self {
            Self::Json => serde_json::to_string(value),
            _ => serde_json::to_string_pretty(value),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
            Self::JsonPretty => write!(f, "json-pretty"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "pretty" => Ok(Self::Table),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "json-pretty" | "jsonpretty" => Ok(Self::JsonPretty),
            _ => Err(format!(
                "Unknown output format '{}'. Valid formats: {}",
                s,
                Self::all_names().join(", ")
            )),
        }
    }
}

/// Truncate a value to `max_len` characters, marking the cut with "..."
pub fn truncate_value(value: &str, max_len: usize) -> String {
    if value.chars().count() <= max_len {
        value.to_string()
    } else {
        let truncated: String = value.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_value() {
        assert_eq!(truncate_value("subject3", 20), "subject3");
        assert_eq!(
            truncate_value("Square waveform with 10-90 on-off cycle", 20),
            "Square waveform w..."
        );
        assert_eq!(truncate_value("", 20), "");
        assert_eq!(truncate_value("Hello", 3), "...");
    }

    #[test]
    fn test_truncate_value_unicode() {
        assert_eq!(truncate_value("日本語テスト名前これは長い", 10), "日本語テスト名...");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("table").unwrap(), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str("md").unwrap(), OutputFormat::Markdown);
        assert_eq!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from_str("JSON-PRETTY").unwrap(),
            OutputFormat::JsonPretty
        );
        assert!(OutputFormat::from_str("psv").is_err());
    }

    #[test]
    fn test_output_format_display_roundtrip() {
        for name in OutputFormat::all_names() {
            let format = OutputFormat::from_str(name).unwrap();
            assert_eq!(format.to_string(), *name);
        }
    }

    #[test]
    fn test_to_json() {
        let value = serde_json::json!({"subject": "subject3"});
        assert_eq!(
            OutputFormat::Json.to_json(&value).unwrap(),
            r#"{"subject":"subject3"}"#
        );
        assert!(OutputFormat::JsonPretty.to_json(&value).unwrap().contains('\n'));
        assert!(OutputFormat::Json.is_json());
        assert!(OutputFormat::Markdown.is_table());
    }
}
