// Chunk: docs/chunks/buffer_config - Deserializable buffer configuration

//! Construction-time configuration for [`Document`](crate::Document).
//!
//! Every field has a default, so a partial JSON (or any other serde format)
//! description is enough:
//!
//! ```
//! use lite_text_buffer::{BufferConfig, TrackerKind};
//!
//! let config: BufferConfig = serde_json::from_str(r#"{ "tracker": "list" }"#).unwrap();
//! assert_eq!(config.tracker, TrackerKind::List);
//! assert!(config.copy_on_write);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{BufferError, Result};

/// Gap sizing for [`GapTextStore`](crate::GapTextStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    /// Edits at the gap that would leave fewer free slots reallocate.
    pub low_watermark: usize,
    /// Edits at the gap that would leave more free slots reallocate; also the
    /// slack given to a freshly placed gap.
    pub high_watermark: usize,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            low_watermark: 50,
            high_watermark: 300,
        }
    }
}

/// Which line tracker implementation a document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerKind {
    /// Differential AVL tree: O(log n) queries and edits.
    #[default]
    Tree,
    /// Sorted line table: O(log n) queries, O(n) edits.
    List,
}

/// Configuration for building a [`Document`](crate::Document).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    pub gap: GapConfig,
    /// Start from an unmodifiable snapshot and allocate the gap buffer on the
    /// first edit.
    pub copy_on_write: bool,
    pub tracker: TrackerKind,
    /// Legal line delimiters; `None` selects `\r`, `\n` and `\r\n`.
    pub line_delimiters: Option<Vec<String>>,
    /// Answer `line_information(number_of_lines())` with an empty region at
    /// the end of the buffer when the last line is not empty, instead of
    /// failing. Kept for clients that still expect the old behaviour.
    pub legacy_last_line_region: bool,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            gap: GapConfig::default(),
            copy_on_write: true,
            tracker: TrackerKind::Tree,
            line_delimiters: None,
            legacy_last_line_region: false,
        }
    }
}

impl BufferConfig {
    /// Checks the configuration for values no buffer can be built from.
    pub fn validate(&self) -> Result<()> {
        if self.gap.low_watermark > self.gap.high_watermark {
            return Err(BufferError::InvalidConfig(format!(
                "low watermark {} exceeds high watermark {}",
                self.gap.low_watermark, self.gap.high_watermark
            )));
        }
        if let Some(delimiters) = &self.line_delimiters {
            if delimiters.is_empty() {
                return Err(BufferError::InvalidConfig(
                    "at least one line delimiter is required".to_string(),
                ));
            }
            if delimiters.iter().any(String::is_empty) {
                return Err(BufferError::InvalidConfig(
                    "line delimiters must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = BufferConfig::default();
        assert_eq!(config.gap.low_watermark, 50);
        assert_eq!(config.gap.high_watermark, 300);
        assert!(config.copy_on_write);
        assert!(!config.legacy_last_line_region);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: BufferConfig = serde_json::from_str(
            r#"{ "gap": { "high_watermark": 64 }, "line_delimiters": ["\n"] }"#,
        )
        .unwrap();
        assert_eq!(
            config.gap,
            GapConfig {
                low_watermark: 50,
                high_watermark: 64
            }
        );
        assert_eq!(config.line_delimiters, Some(vec!["\n".to_string()]));
        assert_eq!(config.tracker, TrackerKind::Tree);
    }

    #[test]
    fn test_validate_rejects_inverted_watermarks() {
        let config = BufferConfig {
            gap: GapConfig {
                low_watermark: 10,
                high_watermark: 5,
            },
            ..BufferConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BufferError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_delimiters() {
        let config = BufferConfig {
            line_delimiters: Some(vec![]),
            ..BufferConfig::default()
        };
        assert!(config.validate().is_err());

        let config = BufferConfig {
            line_delimiters: Some(vec!["\n".to_string(), String::new()]),
            ..BufferConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
