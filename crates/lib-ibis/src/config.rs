//! Parser options.
//!
//! Options can be built in code or loaded from a JSON or TOML file:
//!
//! ```toml
//! comment_char = "|"
//! duplicate_models = "keep_first"
//! collect_warnings = true
//! ```

use crate::error::{ParseError, ParseResult};
use crate::tokenizer::DEFAULT_COMMENT_CHAR;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do when a file defines the same `[Model]` name twice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The later definition replaces the earlier one.
    #[default]
    Replace,
    /// The first definition wins; later ones are parsed and discarded.
    KeepFirst,
}

/// Options controlling how `.ibs` text is parsed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Comment delimiter in effect at the start of the file.
    #[serde(default = "default_comment_char")]
    pub comment_char: char,

    /// Duplicate `[Model]` handling.
    #[serde(default)]
    pub duplicate_models: DuplicatePolicy,

    /// Keep warnings on the parser after a load. They are logged either way.
    #[serde(default = "default_true")]
    pub collect_warnings: bool,
}

fn default_comment_char() -> char {
    DEFAULT_COMMENT_CHAR
}

fn default_true() -> bool {
    true
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            comment_char: DEFAULT_COMMENT_CHAR,
            duplicate_models: DuplicatePolicy::default(),
            collect_warnings: true,
        }
    }
}

impl ParseOptions {
    /// Load options from a file: JSON if the extension is `.json`, TOML otherwise.
    pub fn load(path: &Path) -> ParseResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ParseError::io(path, e))?;

        let options: ParseOptions = if path.extension().map_or(false, |e| e == "json") {
            serde_json::from_str(&content).map_err(|e| ParseError::invalid_config(path, e))?
        } else {
            // Assume TOML
            toml::from_str(&content).map_err(|e| ParseError::invalid_config(path, e))?
        };

        options.validate(path)?;
        Ok(options)
    }

    fn validate(&self, path: &Path) -> ParseResult<()> {
        if self.comment_char.is_alphanumeric() || self.comment_char.is_whitespace() {
            return Err(ParseError::invalid_config(
                path,
                format!("comment_char '{}' must be a symbol", self.comment_char),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let options: ParseOptions = toml::from_str("").unwrap();
        assert_eq!(options, ParseOptions::default());
    }

    #[test]
    fn test_toml_options() {
        let options: ParseOptions = toml::from_str(
            r##"
comment_char = "#"
duplicate_models = "keep_first"
collect_warnings = false
"##,
        )
        .unwrap();
        assert_eq!(options.comment_char, '#');
        assert_eq!(options.duplicate_models, DuplicatePolicy::KeepFirst);
        assert!(!options.collect_warnings);
    }

    #[test]
    fn test_json_options() {
        let options: ParseOptions =
            serde_json::from_str(r#"{"duplicate_models": "replace"}"#).unwrap();
        assert_eq!(options.duplicate_models, DuplicatePolicy::Replace);
        assert_eq!(options.comment_char, '|');
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = ParseOptions::load(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }

    #[test]
    fn test_alphanumeric_comment_char_rejected() {
        let options = ParseOptions {
            comment_char: 'x',
            ..Default::default()
        };
        assert!(options.validate(Path::new("opts.toml")).is_err());
    }
}
