//! Generator module - renders posts into the output tree

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use walkdir::WalkDir;

use crate::content::Post;
use crate::error::{BuildError, BuildResult, DocumentFailure};
use crate::taxonomy::{self, CategoryRegistry, CategoryStat};
use crate::templates::{
    category_links, category_nav, post_listings, Context, Html, ListingOptions, Template,
    TemplateEngine, Value,
};
use crate::Site;

pub const POST_TEMPLATE: &str = "post.html";
pub const INDEX_TEMPLATE: &str = "index.html";
pub const CATEGORY_TEMPLATE: &str = "category.html";

/// Directory under the output root holding category pages
pub const CATEGORY_DIR: &str = "category";

/// Directory under the output root receiving the static assets
pub const ASSET_OUTPUT_DIR: &str = "assets";

/// Outcome of a build that was not aborted
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Every page written, in write order
    pub pages: Vec<PathBuf>,
    /// Number of posts rendered
    pub posts: usize,
    /// Number of category pages written
    pub categories: usize,
    /// Categories registered during this build
    pub discovered_categories: usize,
    /// Number of asset files copied
    pub assets: usize,
    /// Per-document problems, in listing order
    pub failures: Vec<DocumentFailure>,
}

impl BuildReport {
    /// Documents rendered with a replacement body
    pub fn degraded(&self) -> impl Iterator<Item = &DocumentFailure> {
        self.failures.iter().filter(|f| f.error.is_degraded())
    }

    /// Documents left out of the site
    pub fn skipped(&self) -> impl Iterator<Item = &DocumentFailure> {
        self.failures.iter().filter(|f| !f.error.is_degraded())
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

struct PageTemplates {
    post: std::sync::Arc<Template>,
    index: std::sync::Arc<Template>,
    category: std::sync::Arc<Template>,
}

/// Renders sorted posts into the output directory
pub struct Generator<'a> {
    site: &'a Site,
    templates: TemplateEngine,
    listing: ListingOptions,
    build_time: DateTime<Local>,
}

impl<'a> Generator<'a> {
    /// Create a new generator
    pub fn new(site: &'a Site, build_time: DateTime<Local>) -> Self {
        Self {
            site,
            templates: TemplateEngine::new(&site.template_dir),
            listing: ListingOptions {
                show_read_more: site.config.listing.read_more,
                ..ListingOptions::default()
            },
            build_time,
        }
    }

    /// Write post pages, the homepage, category pages and assets
    ///
    /// `posts` must already be sorted. Written pages are recorded in `report`.
    pub fn generate(
        &mut self,
        posts: &[Post],
        registry: &CategoryRegistry,
        report: &mut BuildReport,
    ) -> BuildResult<()> {
        // All three page types must be renderable before anything is written
        let templates = PageTemplates {
            post: self.templates.load_template(POST_TEMPLATE)?,
            index: self.templates.load_template(INDEX_TEMPLATE)?,
            category: self.templates.load_template(CATEGORY_TEMPLATE)?,
        };

        let output_dir = &self.site.output_dir;
        fs::create_dir_all(output_dir).map_err(|e| BuildError::io(output_dir, e))?;

        let base = self.base_context(posts, registry);

        self.generate_post_pages(&templates.post, posts, &base, report)?;
        report.posts = posts.len();
        tracing::info!("Generated {} post pages", posts.len());

        self.generate_index_page(&templates.index, posts, &base, report)?;
        tracing::info!("Generated homepage");

        let stats = taxonomy::distribution(registry, posts);
        self.generate_category_pages(&templates.category, posts, &stats, &base, report)?;
        report.categories = stats.len();
        tracing::info!("Generated {} category pages", stats.len());

        report.assets = self.copy_assets()?;
        tracing::info!("Copied {} assets", report.assets);

        Ok(())
    }

    /// Values shared by every page
    fn base_context(&self, posts: &[Post], registry: &CategoryRegistry) -> Context {
        let config = &self.site.config;

        let mut site = Context::new();
        site.insert("title", config.title.as_str());
        site.insert("description", config.description.as_str());

        let mut build = Context::new();
        build.insert("date", self.build_time.to_rfc3339());
        build.insert("year", self.build_time.format("%Y").to_string());

        let mut context = Context::new();
        context.insert("site", site);
        context.insert("build", build);
        context.insert(
            "CATEGORY_NAV",
            category_nav(&taxonomy::navigation(registry, posts)),
        );
        context
    }

    /// Generate one page per post
    fn generate_post_pages(
        &self,
        template: &Template,
        posts: &[Post],
        base: &Context,
        report: &mut BuildReport,
    ) -> BuildResult<()> {
        for post in posts {
            let context = post_context(post, base);
            report
                .pages
                .push(self.write_page(template, &context, Path::new(&post.html_file))?);
        }
        Ok(())
    }

    /// Generate the homepage listing every post
    fn generate_index_page(
        &self,
        template: &Template,
        posts: &[Post],
        base: &Context,
        report: &mut BuildReport,
    ) -> BuildResult<()> {
        let mut context = base.clone();
        context.insert("POST_LISTINGS", post_listings(posts, self.listing));
        context.insert("POST_COUNT", posts.len());

        report
            .pages
            .push(self.write_page(template, &context, Path::new("index.html"))?);
        Ok(())
    }

    /// Generate one page per category, in distribution order
    fn generate_category_pages(
        &self,
        template: &Template,
        posts: &[Post],
        stats: &[CategoryStat],
        base: &Context,
        report: &mut BuildReport,
    ) -> BuildResult<()> {
        for stat in stats {
            let category_posts = posts.iter().filter(|p| p.has_category(&stat.slug));

            let mut category = Context::new();
            category.insert("slug", stat.slug.as_str());
            category.insert("name", stat.meta.name.as_str());
            category.insert("description", stat.meta.description.as_str());
            category.insert("color", stat.meta.color.as_str());
            category.insert("count", stat.count);

            let mut context = base.clone();
            context.insert("CATEGORY_NAME", stat.meta.name.as_str());
            context.insert("CATEGORY_SLUG", stat.slug.as_str());
            context.insert("category", category);
            context.insert("POST_LISTINGS", post_listings(category_posts, self.listing));
            context.insert("POST_COUNT", stat.count);

            let relative = Path::new(CATEGORY_DIR).join(format!("{}.html", stat.slug));
            report.pages.push(self.write_page(template, &context, &relative)?);
        }
        Ok(())
    }

    /// Copy the asset directory into `<output>/assets`, returning the file count
    fn copy_assets(&self) -> BuildResult<usize> {
        let source_dir = &self.site.asset_dir;
        if !source_dir.is_dir() {
            tracing::info!("No asset directory at {:?}, skipping", source_dir);
            return Ok(0);
        }

        let dest_dir = self.site.output_dir.join(ASSET_OUTPUT_DIR);
        let mut copied = 0;

        for entry in WalkDir::new(source_dir).follow_links(true) {
            let entry = entry?;
            let path = entry.path();
            let relative = path.strip_prefix(source_dir).unwrap_or(path);
            let dest = dest_dir.join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&dest).map_err(|e| BuildError::io(&dest, e))?;
            } else {
                fs::copy(path, &dest).map_err(|e| BuildError::io(path, e))?;
                tracing::debug!("Copied: {:?} -> {:?}", path, dest);
                copied += 1;
            }
        }

        Ok(copied)
    }

    /// Render a template and write the result below the output directory
    fn write_page(
        &self,
        template: &Template,
        context: &Context,
        relative: &Path,
    ) -> BuildResult<PathBuf> {
        let html = template.render(context);
        let output_path = self.site.output_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
        }
        fs::write(&output_path, html).map_err(|e| BuildError::io(&output_path, e))?;
        tracing::debug!("Generated: {:?} ({})", output_path, template.name());
        Ok(output_path)
    }
}

/// Template data for a single post page
pub fn post_context(post: &Post, base: &Context) -> Context {
    let mut meta = Context::new();
    for (key, value) in &post.extra {
        meta.insert(key, Value::from(value));
    }

    let mut context = base.clone();
    context.insert("title", post.title.as_str());
    context.insert("slug", post.slug.as_str());
    context.insert("date", post.date.to_rfc3339());
    context.insert("formattedDate", post.formatted_date.as_str());
    context.insert("excerpt", post.excerpt.as_str());
    context.insert("content", Html(post.content.clone()));
    context.insert("htmlFile", post.html_file.as_str());
    context.insert("categories", post.categories.join(", "));
    context.insert("CATEGORY_LINKS", category_links(post));
    context.insert("meta", meta);
    context
}

/// Newest first; posts with equal dates keep their relative order
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}
