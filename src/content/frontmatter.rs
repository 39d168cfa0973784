//! Front-matter parsing

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Front-matter data from a post
///
/// `date` and `categories` are kept as raw YAML values: dates may be written
/// unquoted, and categories are validated by the taxonomy rather than here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<serde_yaml::Value>,
    pub categories: Option<serde_yaml::Value>,
    pub excerpt: Option<String>,

    /// Additional custom fields
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str), DocumentError> {
        let content = content.trim_start_matches('\u{feff}').trim_start();

        if content.starts_with("---") {
            return Self::parse_yaml(content);
        }

        if content.starts_with(";;;") || content.starts_with('{') {
            return Self::parse_json(content);
        }

        Ok((FrontMatter::default(), content))
    }

    fn parse_yaml(content: &str) -> Result<(Self, &str), DocumentError> {
        let rest = content[3..].trim_start_matches(['\n', '\r']);

        let Some(end_pos) = rest.find("\n---") else {
            return Ok((FrontMatter::default(), content));
        };

        let yaml_content = &rest[..end_pos];
        let remaining = rest[end_pos + 4..].trim_start_matches(['-']);
        let remaining = remaining.trim_start_matches(['\n', '\r']);

        if yaml_content.trim().is_empty() {
            return Ok((FrontMatter::default(), remaining));
        }

        // A leading `---` may just be a markdown thematic break
        if !looks_like_yaml(yaml_content) {
            return Ok((FrontMatter::default(), content));
        }

        let fm = serde_yaml::from_str::<FrontMatter>(yaml_content)
            .map_err(|e| DocumentError::FrontMatter(e.to_string()))?;
        Ok((fm, remaining))
    }

    fn parse_json(content: &str) -> Result<(Self, &str), DocumentError> {
        // ;;; delimited block
        if let Some(rest) = content.strip_prefix(";;;") {
            let end_pos = rest
                .find(";;;")
                .ok_or_else(|| DocumentError::FrontMatter("unterminated ;;; block".into()))?;
            let fm = from_json(&rest[..end_pos])?;
            let remaining = rest[end_pos + 3..].trim_start_matches(['\n', '\r']);
            return Ok((fm, remaining));
        }

        // Leading JSON object, find the matching closing brace
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        for (i, c) in content.char_indices() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let fm = from_json(&content[..=i])?;
                        let remaining = content[i + 1..].trim_start_matches(['\n', '\r']);
                        return Ok((fm, remaining));
                    }
                }
                _ => {}
            }
        }

        Err(DocumentError::FrontMatter("unterminated JSON object".into()))
    }

    /// The `date` field rendered as a string, if it is a scalar
    pub fn date_string(&self) -> Option<String> {
        match self.date.as_ref()? {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Parse the date field into a DateTime
    pub fn parse_date(&self) -> Option<DateTime<Local>> {
        self.date_string().and_then(|s| parse_date_string(&s))
    }
}

fn from_json(json: &str) -> Result<FrontMatter, DocumentError> {
    serde_json::from_str(json).map_err(|e| DocumentError::FrontMatter(e.to_string()))
}

/// Whether a `---` block has at least one `key:` line
fn looks_like_yaml(block: &str) -> bool {
    block.lines().any(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return false;
        }
        let Some((key, value)) = trimmed.split_once(':') else {
            return false;
        };
        !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            && !matches!(key, "http" | "https" | "ftp")
            && (value.is_empty() || value.starts_with(' '))
    })
}

/// Parse a date string in various formats
pub fn parse_date_string(s: &str) -> Option<DateTime<Local>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }

    const DATETIME_FORMATS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    Local.from_local_datetime(&naive).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Hello World
date: 2024-01-15 10:30:00
categories:
  - Web Security
author: ghost
---

This is the content.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title, Some("Hello World".to_string()));
        assert!(fm.categories.as_ref().unwrap().is_sequence());
        assert_eq!(
            fm.extra.get("author").and_then(|v| v.as_str()),
            Some("ghost")
        );
        assert!(remaining.starts_with("This is the content."));
    }

    #[test]
    fn test_parse_json_frontmatter() {
        let content = r#"{"title": "Test {Post}", "categories": ["a", "b"]}

This is content.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title, Some("Test {Post}".to_string()));
        assert!(remaining.contains("This is content."));
    }

    #[test]
    fn test_parse_semicolon_json_frontmatter() {
        let content = ";;;\n{\"title\": \"Semi\"}\n;;;\nBody";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title, Some("Semi".to_string()));
        assert_eq!(remaining, "Body");
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let content = "---\ntitle: [unclosed\n---\nBody";
        let err = FrontMatter::parse(content).unwrap_err();
        assert!(matches!(err, DocumentError::FrontMatter(_)));
    }

    #[test]
    fn test_no_frontmatter() {
        let (fm, remaining) = FrontMatter::parse("Just text").unwrap();
        assert!(fm.title.is_none());
        assert_eq!(remaining, "Just text");
    }

    #[test]
    fn test_markdown_separator_not_yaml() {
        let content = "---\n\nSome prose with a link https://example.com\n\n---\nMore.";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert!(fm.title.is_none());
        assert!(remaining.contains("Some prose"));
    }

    #[test]
    fn test_parse_date() {
        let fm = FrontMatter {
            date: Some(serde_yaml::Value::String("2024-01-15".to_string())),
            ..Default::default()
        };
        let dt = fm.parse_date().unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-01-15");

        let fm = FrontMatter {
            date: Some(serde_yaml::Value::String("2024-03-01T12:00:00Z".to_string())),
            ..Default::default()
        };
        assert!(fm.parse_date().is_some());
    }

    #[test]
    fn test_unparsable_date() {
        assert!(parse_date_string("last tuesday").is_none());
        assert!(parse_date_string("").is_none());
    }
}
