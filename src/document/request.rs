//! Metadata load identifiers and responses

use crate::error::{DocumentLoadError, PageMetadataError};
use crate::layout::PageMeta;

/// Generation of a metadata walk. Each attach gets a fresh one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadId(pub u64);

impl LoadId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Message from the loader thread
#[derive(Debug, Clone, PartialEq)]
pub enum LoadResponse {
    /// Document opened; page count is known
    Opened { id: LoadId, page_count: usize },

    /// Document could not be opened
    OpenFailed {
        id: LoadId,
        error: DocumentLoadError,
    },

    /// Intrinsic size of one page
    PageSize {
        id: LoadId,
        index: usize,
        meta: PageMeta,
    },

    /// One page could not be measured; it keeps the placeholder
    PageFailed {
        id: LoadId,
        error: PageMetadataError,
    },

    /// Walk completed
    Finished { id: LoadId, failed: usize },

    /// Walk stopped early after cancellation
    Cancelled(LoadId),
}

impl LoadResponse {
    #[must_use]
    pub fn id(&self) -> LoadId {
        match self {
            Self::Opened { id, .. }
            | Self::OpenFailed { id, .. }
            | Self::PageSize { id, .. }
            | Self::PageFailed { id, .. }
            | Self::Finished { id, .. }
            | Self::Cancelled(id) => *id,
        }
    }

    /// True if no further responses follow for this load
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::OpenFailed { .. } | Self::Finished { .. } | Self::Cancelled(_)
        )
    }
}
