//! Markdown rendering with syntax highlighting and content-safety screening

use lazy_static::lazy_static;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::error::DocumentError;
use crate::templates::escape_html;

/// Fragment substituted for a body that failed content-safety screening
pub const UNSAFE_CONTENT_FRAGMENT: &str = r#"<div class="error">Error processing content: Potential security issue detected in markdown</div>"#;

lazy_static! {
    static ref UNSAFE_PATTERNS: Vec<(&'static str, Regex)> = [
        "(?i)<script[^>]*>",
        "(?i)javascript:",
        r"(?i)onload\s*=",
        r"(?i)onerror\s*=",
    ]
    .into_iter()
    .map(|p| (p, Regex::new(p).expect("unsafe pattern is a valid regex")))
    .collect();
    static ref SCRIPT_ELEMENT: Regex =
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid regex");
    static ref EXCERPT_MARKERS: Regex = Regex::new(r"[#*`\[\]]").expect("valid regex");
}

/// Per-call rendering options
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    /// Strip `<script>` elements from the produced HTML
    pub sanitize: bool,
}

/// Result of processing one document body
#[derive(Debug, Clone)]
pub struct Rendered {
    pub html: String,
    /// Set when the body was rejected by the safety screen
    pub violation: Option<DocumentError>,
}

/// Markdown processor with syntax highlighting
pub struct MarkdownProcessor {
    syntax_set: SyntaxSet,
    theme: Option<Theme>,
}

impl MarkdownProcessor {
    /// Create a new processor using the default highlight theme
    pub fn new() -> Self {
        Self::with_theme(Some("base16-ocean.dark"))
    }

    /// Create with a named syntect theme, or without highlighting
    pub fn with_theme(theme: Option<&str>) -> Self {
        let theme = theme.map(|name| {
            let mut theme_set = ThemeSet::load_defaults();
            match theme_set.themes.remove(name) {
                Some(theme) => theme,
                None => {
                    tracing::warn!("Unknown highlight theme {:?}, using base16-ocean.dark", name);
                    theme_set
                        .themes
                        .remove("base16-ocean.dark")
                        .unwrap_or_default()
                }
            }
        });

        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    /// Screen, then render markdown to HTML
    ///
    /// A body that matches one of the unsafe patterns is not converted; the
    /// returned HTML is [`UNSAFE_CONTENT_FRAGMENT`] instead.
    pub fn process(&self, markdown: &str, options: ProcessOptions) -> Rendered {
        if let Some(violation) = detect_unsafe_content(markdown) {
            return Rendered {
                html: UNSAFE_CONTENT_FRAGMENT.to_string(),
                violation: Some(violation),
            };
        }

        let mut html = self.render(markdown);
        if options.sanitize {
            html = strip_script_elements(&html);
        }

        Rendered {
            html,
            violation: None,
        }
    }

    /// Render markdown to HTML without screening
    pub fn render(&self, markdown: &str) -> String {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut code_block: Option<(Option<String>, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(|lang| lang.to_string()),
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, code)) = code_block.take() {
                        let highlighted = self.highlight_code(&code, lang.as_deref());
                        events.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                Event::Text(text) if code_block.is_some() => {
                    if let Some((_, code)) = code_block.as_mut() {
                        code.push_str(&text);
                    }
                }
                _ if code_block.is_some() => {}
                // Preserve single line breaks
                Event::SoftBreak => events.push(Event::HardBreak),
                event => events.push(event),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("plaintext");
        let class = escape_html(lang);

        let Some(theme) = &self.theme else {
            return format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                class,
                escape_html(code)
            );
        };

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        match highlighted_html_for_string(code, &self.syntax_set, syntax, theme) {
            Ok(highlighted) => format!(
                r#"<figure class="highlight language-{}">{}</figure>"#,
                class, highlighted
            ),
            Err(e) => {
                tracing::debug!("Highlighting failed for {}: {}", lang, e);
                format!(
                    r#"<pre><code class="language-{}">{}</code></pre>"#,
                    class,
                    escape_html(code)
                )
            }
        }
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove `<script>...</script>` elements from rendered HTML
///
/// Bodies containing a script tag never reach rendering, so through
/// [`MarkdownProcessor::process`] this is a second line behind the screen.
pub fn strip_script_elements(html: &str) -> String {
    SCRIPT_ELEMENT.replace_all(html, "").into_owned()
}

/// Check a raw body against the unsafe-markup heuristics
pub fn detect_unsafe_content(markdown: &str) -> Option<DocumentError> {
    UNSAFE_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(markdown))
        .map(|(pattern, _)| DocumentError::ContentSafety { pattern })
}

/// Plain-text excerpt from the first non-blank paragraph
///
/// Truncation counts characters, not words, and appends `...` when the
/// paragraph is longer than `max_length`.
pub fn extract_excerpt(markdown: &str, max_length: usize) -> String {
    let markdown = markdown.replace("\r\n", "\n");
    let Some(paragraph) = markdown.split("\n\n").find(|p| !p.trim().is_empty()) else {
        return String::new();
    };

    let plain = EXCERPT_MARKERS.replace_all(paragraph, "").replace('\n', " ");
    let plain = plain.trim();

    if plain.chars().count() > max_length {
        let truncated: String = plain.chars().take(max_length).collect();
        format!("{}...", truncated)
    } else {
        plain.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let processor = MarkdownProcessor::new();
        let html = processor.render("# Hello World\n\nThis is a test.");
        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_soft_breaks_preserved() {
        let processor = MarkdownProcessor::new();
        let html = processor.render("line one\nline two");
        assert!(html.contains("line one<br />"));
    }

    #[test]
    fn test_gfm_table_and_strikethrough() {
        let processor = MarkdownProcessor::new();
        let html = processor.render("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn test_render_code_block() {
        let processor = MarkdownProcessor::new();
        let html = processor.render("```rust\nfn main() {}\n```");
        assert!(html.contains(r#"class="highlight language-rust""#));
        assert!(html.contains("main"));
        assert!(!html.contains("```"));
    }

    #[test]
    fn test_unknown_language_falls_back_to_plain_text() {
        let processor = MarkdownProcessor::new();
        let html = processor.render("```nosuchlang\n<tag> & stuff\n```");
        assert!(html.contains("language-nosuchlang"));
        assert!(html.contains("&lt;tag&gt;"));
    }

    #[test]
    fn test_code_block_without_highlighting() {
        let processor = MarkdownProcessor::with_theme(None);
        let html = processor.render("    indented <code>\n");
        assert!(html.contains(r#"<pre><code class="language-plaintext">indented &lt;code&gt;"#));
    }

    #[test]
    fn test_script_tag_is_rejected() {
        let processor = MarkdownProcessor::new();
        let rendered = processor.process("Hi <script>alert(1)</script>", ProcessOptions::default());
        assert_eq!(rendered.html, UNSAFE_CONTENT_FRAGMENT);
        assert!(matches!(
            rendered.violation,
            Some(DocumentError::ContentSafety { .. })
        ));
    }

    #[test]
    fn test_unsafe_patterns_are_case_insensitive() {
        assert!(detect_unsafe_content("[x](JavaScript:void(0))").is_some());
        assert!(detect_unsafe_content(r#"<img src=x OnError = "boom">"#).is_some());
        assert!(detect_unsafe_content("<body onload=go()>").is_some());
        assert!(detect_unsafe_content("<SCRIPT src=x>").is_some());
    }

    #[test]
    fn test_ordinary_prose_is_safe() {
        let processor = MarkdownProcessor::new();
        let rendered = processor.process(
            "Scripts and descriptions are fine, as is talking about errors.",
            ProcessOptions::default(),
        );
        assert!(rendered.violation.is_none());
        assert!(rendered.html.contains("<p>"));
    }

    #[test]
    fn test_strip_script_elements() {
        let html = "<p>a</p><script type=\"x\">evil()</script><p>b</p><SCRIPT>\nx\n</script >";
        assert_eq!(strip_script_elements(html), "<p>a</p><p>b</p>");
        assert_eq!(strip_script_elements("<p>plain</p>"), "<p>plain</p>");
    }

    #[test]
    fn test_sanitize_through_process() {
        let processor = MarkdownProcessor::new();
        let body = "Escaped `</script>` markup and *emphasis*.";
        let plain = processor.process(body, ProcessOptions::default());
        let sanitized = processor.process(body, ProcessOptions { sanitize: true });
        assert!(sanitized.violation.is_none());
        assert_eq!(sanitized.html, plain.html);
        assert!(sanitized.html.contains("&lt;/script&gt;"));

        // A script body is caught by the screen whether or not sanitizing is on
        let rejected = processor.process("<script>x()</script>", ProcessOptions { sanitize: true });
        assert_eq!(rejected.html, UNSAFE_CONTENT_FRAGMENT);
    }

    #[test]
    fn test_rendered_clone_keeps_violation() {
        let processor = MarkdownProcessor::new();
        let rendered = processor.process("[x](javascript:alert(1))", ProcessOptions::default());
        let copy = rendered.clone();
        assert_eq!(copy.violation, rendered.violation);
        assert_eq!(
            copy.violation,
            Some(DocumentError::ContentSafety {
                pattern: "(?i)javascript:"
            })
        );
    }

    #[test]
    fn test_extract_excerpt_strips_markers() {
        let excerpt = extract_excerpt("# Title\n\nSome *bold* text here.", 200);
        assert_eq!(excerpt, "Title");
        for c in ['#', '*', '`', '[', ']'] {
            assert!(!excerpt.contains(c));
        }

        let excerpt = extract_excerpt("\n\nSome *bold* `code` [link]\nnext line", 200);
        assert_eq!(excerpt, "Some bold code link next line");
    }

    #[test]
    fn test_extract_excerpt_truncates_by_chars() {
        let body = "é".repeat(250);
        let excerpt = extract_excerpt(&body, 200);
        assert_eq!(excerpt.chars().count(), 203);
        assert!(excerpt.ends_with("..."));

        assert_eq!(extract_excerpt("short", 5), "short");
        assert_eq!(extract_excerpt("", 200), "");
    }
}
