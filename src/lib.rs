//! postwright: a static blog generator
//!
//! Markdown posts with a front-matter header are rendered into one HTML page
//! each, plus a homepage listing every post and one page per category. Pages
//! are produced from three placeholder templates (`post.html`, `index.html`
//! and `category.html`).

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod taxonomy;
pub mod templates;

pub use error::{BuildError, BuildResult, DocumentError, DocumentFailure};
pub use generator::BuildReport;

use std::path::{Path, PathBuf};

/// A site rooted at a directory
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Markdown sources
    pub content_dir: PathBuf,
    /// Page templates
    pub template_dir: PathBuf,
    /// Static assets copied verbatim
    pub asset_dir: PathBuf,
    /// Output directory
    pub output_dir: PathBuf,
}

impl Site {
    /// Open a site, reading `_config.yml` if it exists
    pub fn new<P: AsRef<Path>>(base_dir: P) -> BuildResult<Self> {
        let base_dir = base_dir.as_ref();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a site from an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        Self {
            content_dir: base_dir.join(&config.content_dir),
            template_dir: base_dir.join(&config.template_dir),
            asset_dir: base_dir.join(&config.asset_dir),
            output_dir: base_dir.join(&config.output_dir),
            config,
            base_dir,
        }
    }

    /// Build the static site
    pub async fn build(&self) -> BuildResult<BuildReport> {
        commands::build::run(self).await
    }

    /// Remove the output directory
    pub fn clean(&self) -> BuildResult<()> {
        commands::clean::run(self)
    }
}
