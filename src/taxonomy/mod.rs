//! Category taxonomy: normalization, registry and aggregate views
//!
//! The registry starts from a fixed seed and grows as posts reference new
//! categories. Normalization never touches the registry directly; it reports
//! what it has not seen and the build merges those discoveries afterwards.

use indexmap::IndexMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;

use crate::content::Post;

/// Category used when a post has none
pub const UNCATEGORIZED: &str = "uncategorized";

/// Color given to categories without curated metadata
pub const DEFAULT_COLOR: &str = "#6b7280";

/// Characters escaped in a category URL path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Display metadata for a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryMeta {
    pub name: String,
    pub description: String,
    pub color: String,
}

impl CategoryMeta {
    fn curated(name: &str, description: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            color: color.to_string(),
        }
    }

    /// Metadata derived from the slug alone
    pub fn inferred(slug: &str) -> Self {
        Self {
            name: display_name(slug),
            description: format!("Posts about {}", slug),
            color: DEFAULT_COLOR.to_string(),
        }
    }
}

/// Known categories and their metadata
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    entries: IndexMap<String, CategoryMeta>,
}

impl CategoryRegistry {
    /// An empty registry
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// The registry seeded with the well-known categories
    pub fn seeded() -> Self {
        let mut registry = Self::empty();
        for (slug, meta) in [
            (
                "web-security",
                CategoryMeta::curated(
                    "Web Security",
                    "Web application security techniques and vulnerabilities",
                    "#ef4444",
                ),
            ),
            (
                "tools",
                CategoryMeta::curated("Tools", "Security tools and automation scripts", "#3b82f6"),
            ),
            (
                "methodology",
                CategoryMeta::curated(
                    "Methodology",
                    "Testing methodologies and approaches",
                    "#10b981",
                ),
            ),
            (
                "bug-bounty",
                CategoryMeta::curated(
                    "Bug Bounty",
                    "Bug bounty program tips and writeups",
                    "#f59e0b",
                ),
            ),
        ] {
            registry.entries.insert(slug.to_string(), meta);
        }
        for slug in ["penetration-testing", "code-review", "red-teaming"] {
            registry
                .entries
                .insert(slug.to_string(), CategoryMeta::inferred(slug));
        }
        registry
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.entries.contains_key(slug)
    }

    pub fn get(&self, slug: &str) -> Option<&CategoryMeta> {
        self.entries.get(slug)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Metadata for a slug, inferred when the slug is unknown
    pub fn meta(&self, slug: &str) -> CategoryMeta {
        self.get(slug)
            .cloned()
            .unwrap_or_else(|| CategoryMeta::inferred(slug))
    }

    /// Register newly discovered categories, returning how many were new
    pub fn merge<I, S>(&mut self, discovered: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for slug in discovered {
            let slug = slug.as_ref();
            if self.contains(slug) {
                continue;
            }
            tracing::info!("New category detected: {:?}", slug);
            self.entries
                .insert(slug.to_string(), CategoryMeta::inferred(slug));
            added += 1;
        }
        added
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::seeded()
    }
}

/// Output of [`normalize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Deduplicated category slugs, never empty
    pub categories: Vec<String>,
    /// Slugs absent from the registry that was consulted
    pub discovered: Vec<String>,
}

/// Normalize raw front-matter categories
///
/// Anything other than a YAML sequence yields `["uncategorized"]`. Tags are
/// lower-cased, trimmed and have whitespace runs replaced by a hyphen.
pub fn normalize(raw: Option<&serde_yaml::Value>, registry: &CategoryRegistry) -> Normalized {
    let Some(serde_yaml::Value::Sequence(items)) = raw else {
        return Normalized::uncategorized();
    };

    let mut categories: Vec<String> = Vec::new();
    for item in items {
        let tag = match item {
            serde_yaml::Value::String(s) => s.clone(),
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        let slug = normalize_tag(&tag);
        if !slug.is_empty() && !categories.contains(&slug) {
            categories.push(slug);
        }
    }

    if categories.is_empty() {
        return Normalized::uncategorized();
    }

    let discovered = categories
        .iter()
        .filter(|slug| !registry.contains(slug.as_str()))
        .cloned()
        .collect();

    Normalized {
        categories,
        discovered,
    }
}

impl Normalized {
    fn uncategorized() -> Self {
        Self {
            categories: vec![UNCATEGORIZED.to_string()],
            discovered: Vec::new(),
        }
    }
}

/// Lower-case, trim and hyphenate one tag
///
/// The result is used as a single file name under `category/`, so path
/// separators become hyphens and leading dots or hyphens are dropped.
pub fn normalize_tag(tag: &str) -> String {
    let slug: String = tag
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    slug.trim_start_matches(['.', '-']).to_string()
}

/// `bug-bounty` -> `Bug Bounty`
pub fn display_name(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// URL of a category page
pub fn category_url(slug: &str) -> String {
    format!("/category/{}.html", utf8_percent_encode(slug, SEGMENT))
}

/// Post count for one category
#[derive(Debug, Clone, Serialize)]
pub struct CategoryStat {
    pub slug: String,
    pub count: usize,
    pub meta: CategoryMeta,
}

/// Category entry for site navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub slug: String,
    pub name: String,
    pub count: usize,
    pub url: String,
}

/// Count posts per category, most used first
///
/// Ties keep the order in which categories were first encountered.
pub fn distribution(registry: &CategoryRegistry, posts: &[Post]) -> Vec<CategoryStat> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for post in posts {
        for category in &post.categories {
            *counts.entry(category.as_str()).or_insert(0) += 1;
        }
    }

    let mut stats: Vec<CategoryStat> = counts
        .into_iter()
        .map(|(slug, count)| CategoryStat {
            slug: slug.to_string(),
            count,
            meta: registry.meta(slug),
        })
        .collect();

    // sort_by is stable
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

/// Navigation entries, one per category in distribution order
pub fn navigation(registry: &CategoryRegistry, posts: &[Post]) -> Vec<NavEntry> {
    distribution(registry, posts)
        .into_iter()
        .map(|stat| NavEntry {
            url: category_url(&stat.slug),
            slug: stat.slug,
            name: stat.meta.name,
            count: stat.count,
        })
        .collect()
}
