//! Content loader - turns the content directory into posts

use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

use super::markdown::{extract_excerpt, ProcessOptions};
use super::{FrontMatter, MarkdownProcessor, Post};
use crate::error::{BuildError, BuildResult, DocumentError, DocumentFailure};
use crate::taxonomy::{self, CategoryRegistry};
use crate::Site;

/// A post plus what the build still has to act on
#[derive(Debug)]
pub struct LoadedPost {
    pub post: Post,
    /// Categories the registry did not know about
    pub discovered: Vec<String>,
    /// Set when the body failed the safety screen and was replaced
    pub violation: Option<DocumentError>,
}

/// Loads posts from the content directory
#[derive(Clone)]
pub struct ContentLoader {
    content_dir: PathBuf,
    extension: String,
    date_format: String,
    excerpt_length: usize,
    options: ProcessOptions,
    processor: Arc<MarkdownProcessor>,
    build_time: DateTime<Local>,
}

impl ContentLoader {
    /// Create a loader for a site, stamping undated posts with `build_time`
    pub fn new(site: &Site, build_time: DateTime<Local>) -> Self {
        let config = &site.config;
        let theme = config
            .highlight
            .enable
            .then_some(config.highlight.theme.as_str());

        Self {
            content_dir: site.content_dir.clone(),
            extension: config.content_extension.trim_start_matches('.').to_string(),
            date_format: config.date_format.clone(),
            excerpt_length: config.excerpt_length,
            options: ProcessOptions {
                sanitize: config.sanitize,
            },
            processor: Arc::new(MarkdownProcessor::with_theme(theme)),
            build_time,
        }
    }

    /// Content files to build, sorted by file name
    ///
    /// Only direct children ending in the content extension are considered;
    /// names starting with `_` are drafts or partials and are skipped.
    pub fn list_sources(&self) -> BuildResult<Vec<PathBuf>> {
        let entries =
            fs::read_dir(&self.content_dir).map_err(|e| BuildError::io(&self.content_dir, e))?;

        let mut sources = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| BuildError::io(&self.content_dir, e))?.path();
            if path.is_file() && self.slug_for(&path).is_some() {
                sources.push(path);
            }
        }

        sources.sort();
        Ok(sources)
    }

    /// Load every post, in listing order
    ///
    /// Documents are read and rendered concurrently. I/O failures abort the
    /// whole load; document-level problems are returned per entry.
    pub async fn load_posts(
        &self,
        registry: &CategoryRegistry,
    ) -> BuildResult<Vec<Result<LoadedPost, DocumentFailure>>> {
        let sources = self.list_sources()?;
        let registry = Arc::new(registry.clone());
        let mut tasks = JoinSet::new();

        for (index, path) in sources.iter().enumerate() {
            let loader = self.clone();
            let registry = Arc::clone(&registry);
            let path = path.clone();
            tasks.spawn_blocking(move || {
                let raw = fs::read_to_string(&path).map_err(|e| BuildError::io(&path, e))?;
                let loaded = loader
                    .load_post(&path, &raw, &registry)
                    .map_err(|error| DocumentFailure {
                        source: path.clone(),
                        error,
                    });
                Ok::<_, BuildError>((index, loaded))
            });
        }

        let mut slots: Vec<Option<Result<LoadedPost, DocumentFailure>>> =
            sources.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, loaded) = joined??;
            slots[index] = Some(loaded);
        }

        Ok(slots.into_iter().flatten().collect())
    }

    /// Build a post from the raw text of one content file
    pub fn load_post(
        &self,
        path: &Path,
        raw: &str,
        registry: &CategoryRegistry,
    ) -> Result<LoadedPost, DocumentError> {
        let slug = self
            .slug_for(path)
            .ok_or(DocumentError::MissingField("slug"))?;
        let (fm, body) = FrontMatter::parse(raw)?;

        let title = fm
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(DocumentError::MissingField("title"))?
            .to_string();

        let date = match fm.parse_date() {
            Some(date) => date,
            None => {
                if fm.date.is_some() {
                    tracing::warn!("Unparsable date in {:?}, using build time", path);
                }
                self.build_time
            }
        };

        let normalized = taxonomy::normalize(fm.categories.as_ref(), registry);
        let rendered = self.processor.process(body, self.options);
        if let Some(violation) = &rendered.violation {
            tracing::warn!("{:?}: {}", path, violation);
        }

        let excerpt = fm
            .excerpt
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| extract_excerpt(body, self.excerpt_length));

        let mut post = Post::new(slug, title, date, path.to_path_buf());
        post.formatted_date = date.format(&self.date_format).to_string();
        post.categories = normalized.categories;
        post.excerpt = excerpt;
        post.content = rendered.html;
        post.extra = fm.extra;

        Ok(LoadedPost {
            post,
            discovered: normalized.discovered,
            violation: rendered.violation,
        })
    }

    /// Slug for a content file, or None if the file is not a post
    fn slug_for(&self, path: &Path) -> Option<String> {
        let name = path.file_name()?.to_str()?;
        if name.starts_with('_') {
            return None;
        }
        let slug = name.strip_suffix(&format!(".{}", self.extension))?;
        (!slug.is_empty()).then(|| slug.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn loader() -> ContentLoader {
        let site = Site::with_config("/site", crate::config::SiteConfig::default());
        let build_time = Local.with_ymd_and_hms(2030, 6, 15, 12, 0, 0).unwrap();
        ContentLoader::new(&site, build_time)
    }

    #[test]
    fn test_load_post_fields() {
        let raw = "---\ntitle: First Post\ndate: 2024-03-01\ncategories: [Web Security, Cloud Native]\nauthor: ada\n---\n\nHello *world*.\n";
        let loaded = loader()
            .load_post(Path::new("/site/content/first.md"), raw, &CategoryRegistry::seeded())
            .unwrap();

        let post = loaded.post;
        assert_eq!(post.slug, "first");
        assert_eq!(post.html_file, "first.html");
        assert_eq!(post.title, "First Post");
        assert_eq!(post.formatted_date, "March 01, 2024");
        assert_eq!(post.categories, vec!["web-security", "cloud-native"]);
        assert_eq!(post.excerpt, "Hello world.");
        assert!(post.content.contains("<em>world</em>"));
        assert_eq!(post.extra.get("author").and_then(|v| v.as_str()), Some("ada"));
        assert_eq!(loaded.discovered, vec!["cloud-native"]);
        assert!(loaded.violation.is_none());
    }

    #[test]
    fn test_missing_date_uses_build_time() {
        let raw = "---\ntitle: Undated\ndate: someday\n---\nBody";
        let loaded = loader()
            .load_post(Path::new("undated.md"), raw, &CategoryRegistry::seeded())
            .unwrap();
        assert_eq!(loaded.post.formatted_date, "June 15, 2030");
        assert_eq!(loaded.post.categories, vec!["uncategorized"]);
    }

    #[test]
    fn test_front_matter_excerpt_wins() {
        let raw = "---\ntitle: T\nexcerpt: Hand written\n---\nDerived text";
        let loaded = loader()
            .load_post(Path::new("t.md"), raw, &CategoryRegistry::seeded())
            .unwrap();
        assert_eq!(loaded.post.excerpt, "Hand written");
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let raw = "---\ndate: 2024-01-01\n---\nBody";
        let err = loader()
            .load_post(Path::new("untitled.md"), raw, &CategoryRegistry::seeded())
            .unwrap_err();
        assert!(matches!(err, DocumentError::MissingField("title")));
    }

    #[test]
    fn test_unsafe_body_is_degraded_not_rejected() {
        let raw = "---\ntitle: Bad\n---\n<script>alert(1)</script>";
        let loaded = loader()
            .load_post(Path::new("bad.md"), raw, &CategoryRegistry::seeded())
            .unwrap();
        assert!(loaded.post.content.contains(r#"class="error""#));
        assert!(loaded.violation.is_some());
    }

    #[test]
    fn test_slug_filtering() {
        let loader = loader();
        assert_eq!(loader.slug_for(Path::new("a/hello.md")), Some("hello".to_string()));
        assert_eq!(loader.slug_for(Path::new("a/_draft.md")), None);
        assert_eq!(loader.slug_for(Path::new("a/notes.txt")), None);
        assert_eq!(loader.slug_for(Path::new("a/.md")), None);
    }
}
