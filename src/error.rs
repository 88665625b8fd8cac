//! Error types for document loading and navigation

use std::path::PathBuf;

/// The document could not be opened or its page count could not be read.
///
/// Fatal for the attach that produced it: the viewer moves to `Failed`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentLoadError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("failed to read {path:?}: {detail}")]
    Unreadable { path: PathBuf, detail: String },

    #[error("malformed document manifest: {0}")]
    Malformed(String),

    #[error("{detail}")]
    Generic { detail: String },
}

impl DocumentLoadError {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// A single page's intrinsic size could not be determined.
///
/// Recovered locally: the page keeps its placeholder size.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PageMetadataError {
    #[error("page {index} is out of range")]
    OutOfRange { index: usize },

    #[error("page {index} reported unusable size {width}x{height}")]
    InvalidSize {
        index: usize,
        width: f64,
        height: f64,
    },

    #[error("page {index}: {detail}")]
    Fetch { index: usize, detail: String },
}

impl PageMetadataError {
    /// Page index the error refers to
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::OutOfRange { index }
            | Self::InvalidSize { index, .. }
            | Self::Fetch { index, .. } => *index,
        }
    }
}

/// Navigation request that cannot be satisfied. No state is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("page index {index} is outside 0..{count}")]
    OutOfRange { index: usize, count: usize },

    #[error("no pages are known yet")]
    EmptyDocument,
}
