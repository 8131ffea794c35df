//! Portable theme `config.txt` codec
//!
//! The file looks like JSON but is read line by line: every line with a colon
//! is a `"key": value,` pair with an integer value. Braces and blank lines
//! are structural noise and skipped.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::color;
use crate::constants::theme::{BACKGROUND_COLOR_KEY, PRIMARY_COLOR_KEY};
use crate::error::{IoContext, Result, ThemeError};

/// Parsed contents of a theme config file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeFields {
    /// Every key seen, recognized or not
    pub entries: BTreeMap<String, i64>,
}

impl ThemeFields {
    pub fn primary_color(&self) -> Option<i32> {
        self.color(PRIMARY_COLOR_KEY)
    }

    pub fn background_color(&self) -> Option<i32> {
        self.color(BACKGROUND_COLOR_KEY)
    }

    /// True when neither color key is present
    pub fn is_empty(&self) -> bool {
        self.primary_color().is_none() && self.background_color().is_none()
    }

    fn color(&self, key: &str) -> Option<i32> {
        self.entries.get(key).copied().and_then(color::narrow)
    }
}

/// Parse `config.txt` contents
///
/// `origin` is only used for error messages.
pub fn parse(text: &str, origin: &Path) -> Result<ThemeFields> {
    let mut fields = ThemeFields::default();

    for (index, line) in text.lines().enumerate() {
        let Some((raw_key, raw_value)) = line.split_once(':') else {
            continue;
        };

        let key = strip_quotes(raw_key.trim());
        let value = raw_value
            .trim()
            .trim_end_matches(|c: char| c == ',' || c.is_whitespace());

        let parsed: i64 = value.parse().map_err(|_| {
            ThemeError::format(
                origin,
                format!("line {}: value for '{key}' is not an integer: '{value}'", index + 1),
            )
        })?;

        // Recognized keys must hold a 32-bit color
        if (key == PRIMARY_COLOR_KEY || key == BACKGROUND_COLOR_KEY) && color::narrow(parsed).is_none() {
            return Err(ThemeError::format(
                origin,
                format!("line {}: '{key}' does not fit a 32-bit color: {parsed}", index + 1),
            ));
        }

        fields.entries.insert(key.to_string(), parsed);
    }

    debug!(path = %origin.display(), keys = fields.entries.len(), "Parsed theme config");
    Ok(fields)
}

/// Read and parse a theme config file
pub fn read(path: &Path) -> Result<ThemeFields> {
    let text = fs::read_to_string(path).io_context("Failed to read theme config", path)?;
    parse(&text, path)
}

/// Render the two colors in the canonical `config.txt` shape (no trailing newline)
pub fn serialize(primary_color: i32, background_color: i32) -> String {
    format!(
        "{{\n\t\"{PRIMARY_COLOR_KEY}\": {primary_color},\n\t\"{BACKGROUND_COLOR_KEY}\": {background_color}\n}}"
    )
}

fn strip_quotes(key: &str) -> &str {
    key.strip_prefix('"')
        .and_then(|k| k.strip_suffix('"'))
        .unwrap_or(key)
}
