//! Error types for the build pipeline
//!
//! [`BuildError`] aborts a build. [`DocumentError`] is scoped to a single
//! source document and ends up in the [`crate::generator::BuildReport`].

use std::path::PathBuf;
use thiserror::Error;

/// A failure that stops the whole build
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Template not found: {name}: {source}")]
    TemplateNotFound {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid config {path:?}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Document worker failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl BuildError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A failure confined to one source document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Potential security issue detected in markdown (matched {pattern})")]
    ContentSafety { pattern: &'static str },

    #[error("Missing required front-matter field: {0}")]
    MissingField(&'static str),

    #[error("Invalid front-matter: {0}")]
    FrontMatter(String),
}

impl DocumentError {
    /// Whether the document still produces a page despite this error
    pub fn is_degraded(&self) -> bool {
        matches!(self, DocumentError::ContentSafety { .. })
    }
}

/// A document-level error together with the file it came from
#[derive(Debug)]
pub struct DocumentFailure {
    pub source: PathBuf,
    pub error: DocumentError,
}

impl std::fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source.display(), self.error)
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;
