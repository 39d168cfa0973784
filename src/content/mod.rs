//! Content module - front-matter, markdown processing and post loading

mod frontmatter;
pub mod loader;
pub mod markdown;
mod post;

pub use frontmatter::{parse_date_string, FrontMatter};
pub use markdown::{extract_excerpt, MarkdownProcessor, ProcessOptions, Rendered};
pub use post::Post;
