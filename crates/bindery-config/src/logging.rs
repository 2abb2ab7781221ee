//! Output-format selection for the loader's telemetry stream.
//!
//! A load emits its diagnostics and the final report summary through
//! `tracing`; hosts pick the rendering here. Machine ingestion wants
//! the JSON form, where the one-line report summary stays parseable
//! next to the per-fragment diagnostics. Operators watching a
//! bootstrap interactively want the compact form instead.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Rendering applied to the loader's telemetry output.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event; keeps report summaries parseable.
    #[default]
    Json,
    /// Single-line human-readable output for interactive bootstraps.
    Compact,
}

/// Error produced when a [`LogFormat`] cannot be parsed from text.
pub type LogFormatParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::json("json", LogFormat::Json)]
    #[case::compact("Compact", LogFormat::Compact)]
    #[case::shouting("JSON", LogFormat::Json)]
    fn parses_case_insensitively(#[case] text: &str, #[case] expected: LogFormat) {
        let parsed: LogFormat = text.parse().expect("parse log format");
        assert_eq!(parsed, expected);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let result: Result<LogFormat, LogFormatParseError> = "xml".parse();
        assert!(result.is_err());
    }

    #[test]
    fn serialises_in_snake_case() {
        let json = serde_json::to_string(&LogFormat::Compact).expect("serialise format");
        assert_eq!(json, r#""compact""#);
    }
}
