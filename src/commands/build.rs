//! Build the static site

use chrono::{DateTime, Local};

use crate::content::loader::ContentLoader;
use crate::content::Post;
use crate::error::{BuildResult, DocumentFailure};
use crate::generator::{sort_posts, BuildReport, Generator};
use crate::taxonomy::CategoryRegistry;
use crate::Site;

/// Posts ready for rendering, with everything learned while loading them
pub struct Collected {
    /// Sorted newest first
    pub posts: Vec<Post>,
    pub registry: CategoryRegistry,
    pub discovered: usize,
    pub failures: Vec<DocumentFailure>,
}

/// Load, enrich and sort every post
///
/// Discovered categories are merged into the registry only after all
/// documents have been processed, in listing order.
pub async fn collect(site: &Site, build_time: DateTime<Local>) -> BuildResult<Collected> {
    let mut registry = CategoryRegistry::seeded();
    let loader = ContentLoader::new(site, build_time);
    let loaded = loader.load_posts(&registry).await?;

    let mut posts = Vec::with_capacity(loaded.len());
    let mut failures = Vec::new();
    let mut discovered = 0;

    for entry in loaded {
        match entry {
            Ok(loaded) => {
                discovered += registry.merge(&loaded.discovered);
                if let Some(error) = loaded.violation {
                    failures.push(DocumentFailure {
                        source: loaded.post.source.clone(),
                        error,
                    });
                }
                posts.push(loaded.post);
            }
            Err(failure) => {
                tracing::warn!("Skipping {}", failure);
                failures.push(failure);
            }
        }
    }

    sort_posts(&mut posts);

    Ok(Collected {
        posts,
        registry,
        discovered,
        failures,
    })
}

/// Generate the static site
pub async fn run(site: &Site) -> BuildResult<BuildReport> {
    let start = std::time::Instant::now();
    let build_time = Local::now();

    tracing::info!("Starting build in {:?}", site.base_dir);

    let collected = collect(site, build_time).await?;
    tracing::info!("Processed {} posts", collected.posts.len());

    let mut report = BuildReport {
        discovered_categories: collected.discovered,
        failures: collected.failures,
        ..Default::default()
    };

    let mut generator = Generator::new(site, build_time);
    generator.generate(&collected.posts, &collected.registry, &mut report)?;

    tracing::info!(
        "Build completed in {:.2}s: {} pages written",
        start.elapsed().as_secs_f64(),
        report.pages.len()
    );

    Ok(report)
}
