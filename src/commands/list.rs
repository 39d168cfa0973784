//! List site content

use anyhow::Result;
use chrono::Local;

use super::build::collect;
use crate::taxonomy;
use crate::Site;

/// List site content by type
pub async fn run(site: &Site, content_type: &str) -> Result<()> {
    let collected = collect(site, Local::now()).await?;

    match content_type {
        "post" | "posts" => {
            println!("Posts ({}):", collected.posts.len());
            for post in &collected.posts {
                println!(
                    "  {} - {} [{}]",
                    post.date.format("%Y-%m-%d"),
                    post.title,
                    post.categories.join(", ")
                );
            }
        }
        "category" | "categories" => {
            let nav = taxonomy::navigation(&collected.registry, &collected.posts);
            println!("Categories ({}):", nav.len());
            for entry in nav {
                println!("  {} ({}) {}", entry.name, entry.count, entry.url);
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, category",
                content_type
            );
        }
    }

    for failure in &collected.failures {
        println!("  ! {}", failure);
    }

    Ok(())
}
