//! Post model

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::PathBuf;

/// A blog post ready for rendering
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// File name without the content extension
    pub slug: String,

    /// Post title
    pub title: String,

    /// Publication date (build time when missing or unparsable)
    pub date: DateTime<Local>,

    /// `date` rendered with the configured format
    pub formatted_date: String,

    /// Normalized category slugs, never empty
    pub categories: Vec<String>,

    /// Plain-text summary
    pub excerpt: String,

    /// Rendered HTML body
    pub content: String,

    /// Output file name, relative to the output root
    pub html_file: String,

    /// Source file path
    pub source: PathBuf,

    /// Remaining front-matter fields, passed through unvalidated
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Post {
    /// Create a post with the identity fields set
    pub fn new(slug: String, title: String, date: DateTime<Local>, source: PathBuf) -> Self {
        let html_file = format!("{}.html", slug);
        Self {
            slug,
            title,
            date,
            formatted_date: String::new(),
            categories: Vec::new(),
            excerpt: String::new(),
            content: String::new(),
            html_file,
            source,
            extra: IndexMap::new(),
        }
    }

    /// Whether the post is filed under the given category slug
    pub fn has_category(&self, slug: &str) -> bool {
        self.categories.iter().any(|c| c == slug)
    }

    /// URL path of the post page
    pub fn url(&self) -> String {
        format!("/{}", self.html_file)
    }
}
