//! HTML fragments built from posts and categories
//!
//! These produce [`Html`] values, so every post field is escaped here before
//! it is spliced into markup.

use super::{escape_html, Html};
use crate::content::Post;
use crate::taxonomy::{category_url, NavEntry};

/// What each listing entry shows besides the title and date
#[derive(Debug, Clone, Copy)]
pub struct ListingOptions {
    pub show_categories: bool,
    pub show_excerpt: bool,
    pub show_read_more: bool,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            show_categories: true,
            show_excerpt: true,
            show_read_more: false,
        }
    }
}

/// Summary blocks for a list of posts
pub fn post_listings<'a, I>(posts: I, options: ListingOptions) -> Html
where
    I: IntoIterator<Item = &'a Post>,
{
    let mut html = String::new();

    for (index, post) in posts.into_iter().enumerate() {
        let href = escape_html(&post.url());

        html.push_str(&format!(
            r#"<article class="post-preview" data-animate="fade-up" style="--index: {};">"#,
            index
        ));
        html.push_str(&format!(
            r#"<h2><a href="{}" class="post-link">{}</a></h2>"#,
            href,
            escape_html(&post.title)
        ));
        html.push_str(&format!(
            r#"<div class="post-meta"><time datetime="{}">{}</time>"#,
            escape_html(&post.date.to_rfc3339()),
            escape_html(&post.formatted_date)
        ));
        if options.show_categories && !post.categories.is_empty() {
            html.push_str(&format!(
                r#"<span class="categories">{}</span>"#,
                category_links(post).0
            ));
        }
        html.push_str("</div>");

        if options.show_excerpt && !post.excerpt.is_empty() {
            html.push_str(&format!(
                r#"<p class="excerpt">{}</p>"#,
                escape_html(&post.excerpt)
            ));
        }
        if options.show_read_more {
            html.push_str(&format!(
                r#"<a href="{}" class="read-more">Read more →</a>"#,
                href
            ));
        }
        html.push_str("</article>\n");
    }

    Html(html)
}

/// Links to the category pages of one post
pub fn category_links(post: &Post) -> Html {
    Html(
        post.categories
            .iter()
            .map(|slug| {
                format!(
                    r#"<a href="{}" class="category-tag">{}</a>"#,
                    escape_html(&category_url(slug)),
                    escape_html(slug)
                )
            })
            .collect(),
    )
}

/// Category navigation list
pub fn category_nav(entries: &[NavEntry]) -> Html {
    if entries.is_empty() {
        return Html::default();
    }

    let mut html = String::from(r#"<ul class="category-nav">"#);
    for entry in entries {
        html.push_str(&format!(
            r#"<li><a href="{}">{}</a><span class="category-count">{}</span></li>"#,
            escape_html(&entry.url),
            escape_html(&entry.name),
            entry.count
        ));
    }
    html.push_str("</ul>");
    Html(html)
}
