//! Site configuration (_config.yml)

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{BuildError, BuildResult};

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,

    // Directory
    pub content_dir: String,
    pub template_dir: String,
    pub asset_dir: String,
    pub output_dir: String,

    // Writing
    pub content_extension: String,
    /// chrono format string used for `formattedDate`
    pub date_format: String,
    pub excerpt_length: usize,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    /// Strip `<script>` elements from rendered post bodies
    pub sanitize: bool,

    /// Treat any per-document failure as a failed build
    pub strict: bool,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            description: String::new(),

            content_dir: "content".to_string(),
            template_dir: "templates".to_string(),
            asset_dir: "assets".to_string(),
            output_dir: "dist".to_string(),

            content_extension: "md".to_string(),
            date_format: "%B %d, %Y".to_string(),
            excerpt_length: 200,
            highlight: HighlightConfig::default(),
            listing: ListingConfig::default(),
            sanitize: false,

            strict: false,
            extra: IndexMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> BuildResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        serde_yaml::from_str(&content).map_err(|source| BuildError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Syntax highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    /// Name of a theme bundled with syntect
    pub theme: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            theme: "base16-ocean.dark".to_string(),
        }
    }
}

/// Post listing configuration for the index and category pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub read_more: bool,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self { read_more: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.output_dir, "dist");
        assert_eq!(config.content_extension, "md");
        assert_eq!(config.excerpt_length, 200);
        assert!(!config.strict);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: Field Notes
output_dir: public
highlight:
  theme: InspiredGitHub
listing:
  read_more: false
github: someone
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "Field Notes");
        assert_eq!(config.output_dir, "public");
        assert_eq!(config.content_dir, "content");
        assert_eq!(config.highlight.theme, "InspiredGitHub");
        assert!(config.highlight.enable);
        assert!(!config.listing.read_more);
        assert_eq!(
            config.extra.get("github").and_then(|v| v.as_str()),
            Some("someone")
        );
    }
}
