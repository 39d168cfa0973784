//! Placeholder templates
//!
//! A template is plain HTML with `{{path}}` tokens, where `path` is one or more
//! dot-separated identifiers. Templates are compiled once into literal and
//! placeholder segments and rendered against a [`Context`] in a single pass.
//!
//! Every value in a context is either [`Value::Text`], which is HTML-escaped
//! on output, or [`Value::Html`], a trusted fragment inserted verbatim.
//! Tokens that do not resolve to one of those are left in the output as-is.

mod listing;

pub use listing::{category_links, category_nav, post_listings, ListingOptions};

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{BuildError, BuildResult};

/// A trusted, already rendered HTML fragment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Html(pub String);

/// A value that can be substituted into a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Plain text, escaped before interpolation
    Text(String),
    /// Trusted HTML, never escaped
    Html(String),
    /// Nested record, reachable through dotted paths
    Map(IndexMap<String, Value>),
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Text(n.to_string())
    }
}

impl From<Html> for Value {
    fn from(html: Html) -> Self {
        Value::Html(html.0)
    }
}

impl From<Context> for Value {
    fn from(context: Context) -> Self {
        Value::Map(context.values)
    }
}

impl From<&serde_yaml::Value> for Value {
    /// Front-matter values become text; mappings become nested records
    fn from(value: &serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Value::Text(String::new()),
            serde_yaml::Value::Bool(b) => Value::Text(b.to_string()),
            serde_yaml::Value::Number(n) => Value::Text(n.to_string()),
            serde_yaml::Value::String(s) => Value::Text(s.clone()),
            serde_yaml::Value::Sequence(items) => Value::Text(
                items
                    .iter()
                    .filter_map(|item| match Value::from(item) {
                        Value::Text(s) => Some(s),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            serde_yaml::Value::Mapping(map) => Value::Map(
                map.iter()
                    .filter_map(|(k, v)| Some((k.as_str()?.to_string(), Value::from(v))))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Value::from(&tagged.value),
        }
    }
}

/// Data record a template is rendered against
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: IndexMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value under a top-level key
    pub fn insert<V: Into<Value>>(&mut self, key: &str, value: V) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Resolve a dotted path to a value
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.values.get(segments.next()?)?;
        for segment in segments {
            match current {
                Value::Map(map) => current = map.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A compiled template
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Split a template source into literal text and placeholders
    pub fn compile(name: &str, source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find("{{") {
            let after = &rest[open + 2..];
            // A token is path characters immediately followed by `}}`
            let len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
                .unwrap_or(after.len());
            let path = &after[..len];

            if after[len..].starts_with("}}") && is_placeholder_path(path) {
                literal.push_str(&rest[..open]);
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(path.to_string()));
                rest = &after[len + 2..];
            } else {
                // Not a token here; retry from the next brace
                literal.push_str(&rest[..open + 1]);
                rest = &rest[open + 1..];
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            name: name.to_string(),
            segments,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render against a context
    pub fn render(&self, context: &Context) -> String {
        let mut out = String::with_capacity(
            self.segments
                .iter()
                .map(|s| match s {
                    Segment::Literal(text) => text.len(),
                    Segment::Placeholder(path) => path.len() + 4,
                })
                .sum(),
        );

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(path) => match context.get(path) {
                    Some(Value::Text(text)) => out.push_str(&escape_html(text)),
                    Some(Value::Html(html)) => out.push_str(html),
                    Some(Value::Map(_)) | None => {
                        out.push_str("{{");
                        out.push_str(path);
                        out.push_str("}}");
                    }
                },
            }
        }

        out
    }
}

/// Compile and render a template source in one step
pub fn render_str(source: &str, context: &Context) -> String {
    Template::compile("inline", source).render(context)
}

fn is_placeholder_path(path: &str) -> bool {
    !path.is_empty()
        && path.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// Loads templates from a directory and keeps them for the rest of the build
pub struct TemplateEngine {
    template_dir: PathBuf,
    cache: HashMap<String, Arc<Template>>,
}

impl TemplateEngine {
    pub fn new<P: AsRef<Path>>(template_dir: P) -> Self {
        Self {
            template_dir: template_dir.as_ref().to_path_buf(),
            cache: HashMap::new(),
        }
    }

    /// Load and compile a template, reusing the cached copy if there is one
    pub fn load_template(&mut self, name: &str) -> BuildResult<Arc<Template>> {
        if let Some(template) = self.cache.get(name) {
            return Ok(Arc::clone(template));
        }

        let path = self.template_dir.join(name);
        let source = fs::read_to_string(&path).map_err(|source| BuildError::TemplateNotFound {
            name: name.to_string(),
            source,
        })?;

        let template = Arc::new(Template::compile(name, &source));
        tracing::debug!("Loaded template {:?}", path);
        self.cache.insert(name.to_string(), Arc::clone(&template));
        Ok(template)
    }
}

/// Escape the five HTML-significant characters
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}
