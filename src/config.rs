//! Engine configuration
//!
//! Settings can be built in code or loaded from a TOML file:
//!
//! ```toml
//! snippet_tag = "section"
//! strict_blocks = true
//! invalid_link = "#error"
//! max_depth = 32
//! content_type = "html"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::compiler::ContentType;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Settings shared by every render of an engine
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Container element for snippets declared without a tag
    pub snippet_tag: String,
    /// Treat an unterminated trailing `{block}` as a compile error
    pub strict_blocks: bool,
    /// Text printed in place of a link that cannot be resolved
    pub invalid_link: String,
    /// Maximum nesting of block calls and template renders
    pub max_depth: usize,
    /// Escaping context a template starts in
    pub content_type: ContentType,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snippet_tag: "div".to_string(),
            strict_blocks: false,
            invalid_link: "#".to_string(),
            max_depth: 64,
            content_type: ContentType::Html,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string; missing keys keep their defaults
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_snippet_tag(mut self, tag: impl Into<String>) -> Self {
        self.snippet_tag = tag.into();
        self
    }

    pub fn with_strict_blocks(mut self, strict: bool) -> Self {
        self.strict_blocks = strict;
        self
    }

    pub fn with_invalid_link(mut self, text: impl Into<String>) -> Self {
        self.invalid_link = text.into();
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.snippet_tag, "div");
        assert!(!config.strict_blocks);
        assert_eq!(config.invalid_link, "#");
        assert_eq!(config.max_depth, 64);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_str("snippet_tag = \"section\"\nstrict_blocks = true").unwrap();
        assert_eq!(config.snippet_tag, "section");
        assert!(config.strict_blocks);
        assert_eq!(config.max_depth, 64);
    }

    #[test]
    fn test_content_type_from_toml() {
        let config = EngineConfig::from_str("content_type = \"xml\"").unwrap();
        assert_eq!(config.content_type, ContentType::Xml);
    }

    #[test]
    fn test_invalid_toml() {
        let result = EngineConfig::from_str("max_depth = \"deep\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::default()
            .with_snippet_tag("span")
            .with_invalid_link("about:blank")
            .with_max_depth(8);
        assert_eq!(config.snippet_tag, "span");
        assert_eq!(config.invalid_link, "about:blank");
        assert_eq!(config.max_depth, 8);
    }
}
